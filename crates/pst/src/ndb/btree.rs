//! ## [BTrees](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/7d759bcb-7864-480c-8746-f6af913ab085)
//!
//! The NDB layer indexes every node and block through two B-trees of fixed
//! 512-byte pages: the NBT (`nid` → data/sub-node BIDs) and the BBT (`bid` →
//! file offset, size, refcount). The builder emits sorted leaf pages and, when
//! more than one leaf is needed, a single interior page above them.

use tracing::trace;

use super::*;
use crate::crc::compute_crc;

pub const PAGE_SIZE: usize = 512;
pub const PAGE_TRAILER_SIZE: usize = 16;
/// 496 bytes: everything before the page trailer, covered by the page CRC.
pub const PAGE_DATA_SIZE: usize = PAGE_SIZE - PAGE_TRAILER_SIZE;
/// 488 bytes: the entry area before the 8-byte `BTPAGE` metadata.
pub const ENTRIES_AREA: usize = 488;

pub const NBT_ENTRY_SIZE: usize = 32;
pub const BBT_ENTRY_SIZE: usize = 24;
pub const INTERIOR_ENTRY_SIZE: usize = 24;

/// `ptype`
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PageType {
    /// `ptypeBBT`: Block BTree page
    BlockBTree = 0x80,
    /// `ptypeNBT`: Node BTree page
    NodeBTree = 0x81,
    /// `ptypeAMap`: Allocation Map page
    AllocationMap = 0x84,
}

/// [NBTENTRY](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/53a4b926-8ac4-45c9-9c6d-8358d951dbcd)
#[derive(Clone, Copy, Debug)]
pub struct NodeBTreeEntry {
    pub node: NodeId,
    pub data: BlockId,
    pub sub_node: BlockId,
    pub parent: NodeId,
}

impl NodeBTreeEntry {
    pub fn key(&self) -> u64 {
        u64::from(self.node)
    }

    fn pack(&self) -> Vec<u8> {
        let mut entry = Vec::with_capacity(NBT_ENTRY_SIZE);
        entry.extend_from_slice(&u64::from(self.node).to_le_bytes());
        entry.extend_from_slice(&u64::from(self.data).to_le_bytes());
        entry.extend_from_slice(&u64::from(self.sub_node).to_le_bytes());
        entry.extend_from_slice(&u32::from(self.parent).to_le_bytes());
        entry.extend_from_slice(&0_u32.to_le_bytes());
        entry
    }
}

/// [BBTENTRY](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/53a4b926-8ac4-45c9-9c6d-8358d951dbcd)
#[derive(Clone, Copy, Debug)]
pub struct BlockBTreeEntry {
    pub block: BlockId,
    pub offset: u64,
    pub size: u16,
    pub refs: u16,
}

impl BlockBTreeEntry {
    pub fn key(&self) -> u64 {
        u64::from(self.block)
    }

    fn pack(&self) -> Vec<u8> {
        let mut entry = Vec::with_capacity(BBT_ENTRY_SIZE);
        entry.extend_from_slice(&u64::from(self.block).to_le_bytes());
        entry.extend_from_slice(&self.offset.to_le_bytes());
        entry.extend_from_slice(&self.size.to_le_bytes());
        entry.extend_from_slice(&self.refs.to_le_bytes());
        entry.extend_from_slice(&0_u32.to_le_bytes());
        entry
    }
}

/// A finished page with its assigned BID and file offset. `build_btree`
/// returns the root page last.
#[derive(Clone, Debug)]
pub struct BTreePage {
    pub block_id: BlockId,
    pub offset: u64,
    pub data: Vec<u8>,
}

/// Build a single 512-byte `BTPAGE` from pre-packed entries.
fn build_page(entries: &[Vec<u8>], entry_size: usize, ptype: PageType, level: u8, block_id: BlockId) -> Vec<u8> {
    let max_entries = ENTRIES_AREA / entry_size;

    let mut page = Vec::with_capacity(PAGE_SIZE);
    for entry in entries {
        page.extend_from_slice(entry);
    }
    page.resize(ENTRIES_AREA, 0);

    // BTPAGE metadata: cEnt, cEntMax, cbEnt, cLevel, dwPadding.
    page.push(entries.len() as u8);
    page.push(max_entries as u8);
    page.push(entry_size as u8);
    page.push(level);
    page.extend_from_slice(&0_u32.to_le_bytes());
    debug_assert_eq!(page.len(), PAGE_DATA_SIZE);

    let crc = compute_crc(0, &page);
    page.push(ptype as u8);
    page.push(ptype as u8);
    page.extend_from_slice(&0_u16.to_le_bytes());
    page.extend_from_slice(&crc.to_le_bytes());
    page.extend_from_slice(&u64::from(block_id).to_le_bytes());
    debug_assert_eq!(page.len(), PAGE_SIZE);

    page
}

fn pack_interior_entry(key: u64, block_id: BlockId, offset: u64) -> Vec<u8> {
    let mut entry = Vec::with_capacity(INTERIOR_ENTRY_SIZE);
    entry.extend_from_slice(&key.to_le_bytes());
    entry.extend_from_slice(&u64::from(block_id).to_le_bytes());
    entry.extend_from_slice(&offset.to_le_bytes());
    entry
}

/// Verify the strict key ordering the readers depend on.
fn check_sorted(keys: &[u64], ptype: PageType) -> NdbResult<()> {
    for pair in keys.windows(2) {
        if pair[1] <= pair[0] {
            return Err(match ptype {
                PageType::NodeBTree if pair[1] == pair[0] => NdbError::DuplicateNodeId(pair[0]),
                _ => NdbError::BTreeKeyInversion(pair[0], pair[1]),
            });
        }
    }
    Ok(())
}

/// Build a complete NBT or BBT from `(key, packed_entry)` pairs sorted by key.
///
/// Entries that fit one leaf page produce exactly that page. Otherwise the
/// entries split into full leaf pages and interior pages of
/// `(first_key, BREF)` records stack above them, one more level per overflow,
/// until a single root remains. The root page is the last element of the
/// returned vector.
pub fn build_btree(
    keys: &[u64],
    entries: &[Vec<u8>],
    entry_size: usize,
    ptype: PageType,
    bids: &mut BidAllocator,
    mut alloc_offset: impl FnMut(BlockId) -> u64,
) -> NdbResult<Vec<BTreePage>> {
    check_sorted(keys, ptype)?;

    let max_per_page = ENTRIES_AREA / entry_size;

    if entries.len() <= max_per_page {
        let block_id = bids.page();
        let offset = alloc_offset(block_id);
        let data = build_page(entries, entry_size, ptype, 0, block_id);
        return Ok(vec![BTreePage { block_id, offset, data }]);
    }

    let mut pages = Vec::new();
    let mut current: Vec<(u64, BlockId, u64)> = Vec::new();

    for (chunk, chunk_keys) in entries.chunks(max_per_page).zip(keys.chunks(max_per_page)) {
        let block_id = bids.page();
        let offset = alloc_offset(block_id);
        let data = build_page(chunk, entry_size, ptype, 0, block_id);
        current.push((chunk_keys[0], block_id, offset));
        pages.push(BTreePage { block_id, offset, data });
    }

    let max_interior = ENTRIES_AREA / INTERIOR_ENTRY_SIZE;
    let mut level = 1_u8;
    while current.len() > 1 {
        let mut parents = Vec::with_capacity(current.len().div_ceil(max_interior));
        for chunk in current.chunks(max_interior) {
            let packed: Vec<_> = chunk
                .iter()
                .map(|&(key, child, child_offset)| pack_interior_entry(key, child, child_offset))
                .collect();
            let block_id = bids.page();
            let offset = alloc_offset(block_id);
            let data = build_page(&packed, INTERIOR_ENTRY_SIZE, ptype, level, block_id);
            parents.push((chunk[0].0, block_id, offset));
            pages.push(BTreePage { block_id, offset, data });
        }
        current = parents;
        level += 1;
    }
    trace!(
        pages = pages.len(),
        entries = entries.len(),
        levels = level,
        ?ptype,
        "split btree"
    );

    Ok(pages)
}

/// Convenience wrapper packing [`NodeBTreeEntry`] values.
pub fn build_node_btree(
    entries: &[NodeBTreeEntry],
    bids: &mut BidAllocator,
    alloc_offset: impl FnMut(BlockId) -> u64,
) -> NdbResult<Vec<BTreePage>> {
    let keys: Vec<_> = entries.iter().map(NodeBTreeEntry::key).collect();
    let packed: Vec<_> = entries.iter().map(NodeBTreeEntry::pack).collect();
    build_btree(&keys, &packed, NBT_ENTRY_SIZE, PageType::NodeBTree, bids, alloc_offset)
}

/// Convenience wrapper packing [`BlockBTreeEntry`] values.
pub fn build_block_btree(
    entries: &[BlockBTreeEntry],
    bids: &mut BidAllocator,
    alloc_offset: impl FnMut(BlockId) -> u64,
) -> NdbResult<Vec<BTreePage>> {
    let keys: Vec<_> = entries.iter().map(BlockBTreeEntry::key).collect();
    let packed: Vec<_> = entries.iter().map(BlockBTreeEntry::pack).collect();
    build_btree(&keys, &packed, BBT_ENTRY_SIZE, PageType::BlockBTree, bids, alloc_offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nbt_entries(count: u32) -> Vec<NodeBTreeEntry> {
        (0..count)
            .map(|i| NodeBTreeEntry {
                node: NodeId::new(NodeIdType::NormalMessage, FIRST_ALLOCATED_NODE_INDEX + i).unwrap(),
                data: BlockId::from(4 + u64::from(i) * 4),
                sub_node: BlockId::from(0),
                parent: NodeId::from(0),
            })
            .collect()
    }

    #[test]
    fn test_single_leaf_page() {
        let entries = nbt_entries(3);
        let mut bids = BidAllocator::new();
        let mut next = 0x5000_u64;
        let pages = build_node_btree(&entries, &mut bids, |_| {
            let offset = next;
            next += PAGE_SIZE as u64;
            offset
        })
        .unwrap();

        assert_eq!(pages.len(), 1);
        let page = &pages[0].data;
        assert_eq!(page.len(), PAGE_SIZE);
        // cEnt/cEntMax/cbEnt/cLevel
        assert_eq!(page[ENTRIES_AREA], 3);
        assert_eq!(page[ENTRIES_AREA + 1], 15);
        assert_eq!(page[ENTRIES_AREA + 2], NBT_ENTRY_SIZE as u8);
        assert_eq!(page[ENTRIES_AREA + 3], 0);
        // trailer
        assert_eq!(page[PAGE_DATA_SIZE], PageType::NodeBTree as u8);
        assert_eq!(page[PAGE_DATA_SIZE + 1], PageType::NodeBTree as u8);
        let crc = u32::from_le_bytes(page[PAGE_DATA_SIZE + 4..PAGE_DATA_SIZE + 8].try_into().unwrap());
        assert_eq!(crc, compute_crc(0, &page[..PAGE_DATA_SIZE]));
    }

    #[test]
    fn test_two_level_split() {
        // 40 NBT entries exceed the 15-per-page leaf capacity.
        let entries = nbt_entries(40);
        let mut bids = BidAllocator::new();
        let mut next = 0x5000_u64;
        let pages = build_node_btree(&entries, &mut bids, |_| {
            let offset = next;
            next += PAGE_SIZE as u64;
            offset
        })
        .unwrap();

        // ceil(40 / 15) leaves plus one interior root.
        assert_eq!(pages.len(), 4);
        let root = &pages[3].data;
        assert_eq!(root[ENTRIES_AREA], 3);
        assert_eq!(root[ENTRIES_AREA + 2], INTERIOR_ENTRY_SIZE as u8);
        assert_eq!(root[ENTRIES_AREA + 3], 1);

        // The interior page's first record points at the first leaf.
        let key = u64::from_le_bytes(root[0..8].try_into().unwrap());
        assert_eq!(key, entries[0].key());
        let bref_ib = u64::from_le_bytes(root[16..24].try_into().unwrap());
        assert_eq!(bref_ib, pages[0].offset);
    }

    #[test]
    fn test_three_level_split() {
        // 500 BBT entries: 25 leaves of 20, two level-1 pages, one root.
        let entries: Vec<_> = (0..500_u64)
            .map(|i| BlockBTreeEntry {
                block: BlockId::from(4 + i * 4),
                offset: 0x4600 + i * 64,
                size: 48,
                refs: 2,
            })
            .collect();
        let mut bids = BidAllocator::new();
        let mut next = 0x2_0000_u64;
        let pages = build_block_btree(&entries, &mut bids, |_| {
            let offset = next;
            next += PAGE_SIZE as u64;
            offset
        })
        .unwrap();

        assert_eq!(pages.len(), 25 + 2 + 1);
        let root = &pages[pages.len() - 1].data;
        assert_eq!(root[ENTRIES_AREA], 2);
        assert_eq!(root[ENTRIES_AREA + 3], 2, "root is two levels above the leaves");
        // Every page advertises a valid level below the root.
        for page in &pages[25..27] {
            assert_eq!(page.data[ENTRIES_AREA + 3], 1);
        }
    }

    #[test]
    fn test_duplicate_nid_rejected() {
        let mut entries = nbt_entries(2);
        entries[1].node = entries[0].node;
        let mut bids = BidAllocator::new();
        let result = build_node_btree(&entries, &mut bids, |_| 0x5000);
        assert!(matches!(result, Err(NdbError::DuplicateNodeId(_))));
    }

    #[test]
    fn test_key_inversion_rejected() {
        let entries = [
            BlockBTreeEntry { block: BlockId::from(8), offset: 0x4600, size: 64, refs: 2 },
            BlockBTreeEntry { block: BlockId::from(4), offset: 0x4640, size: 64, refs: 2 },
        ];
        let mut bids = BidAllocator::new();
        let result = build_block_btree(&entries, &mut bids, |_| 0x5000);
        assert!(matches!(result, Err(NdbError::BTreeKeyInversion(8, 4))));
    }

    #[test]
    fn test_empty_btree_is_one_empty_leaf() {
        let mut bids = BidAllocator::new();
        let pages = build_block_btree(&[], &mut bids, |_| 0x5000).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].data[ENTRIES_AREA], 0);
    }
}
