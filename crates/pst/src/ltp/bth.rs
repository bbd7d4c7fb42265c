//! ## [BTH (BTree-on-Heap)](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/2dd1a95a-c8b1-4ac5-87d1-10cb8de64053)
//!
//! Sorted fixed-size key/data records inside a Heap-on-Node. A record set
//! whose flat leaf fits one heap allocation is stored with `bIdxLevels = 0`;
//! otherwise the leaf splits into chunks with a single index level above
//! them.

use super::*;
use super::heap::{HeapId, HeapOnNode, MAX_HEAP_ALLOC};

/// `bType` of a `BTHHEADER`.
const BTH_TYPE: u8 = 0xB5;

fn pack_header(key_size: u8, data_size: u8, index_levels: u8, root: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(8);
    header.push(BTH_TYPE);
    header.push(key_size);
    header.push(data_size);
    header.push(index_levels);
    header.extend_from_slice(&root.to_le_bytes());
    header
}

/// Build a BTH from `(key, data)` records sorted by key, allocating its leaf
/// chunks and `BTHHEADER` on `hn`. Returns the header's HID.
pub fn build_bth(
    hn: &mut HeapOnNode,
    key_size: usize,
    data_size: usize,
    records: &[(Vec<u8>, Vec<u8>)],
) -> LtpResult<HeapId> {
    let record_size = key_size + data_size;

    if records.is_empty() {
        return hn.allocate(&pack_header(key_size as u8, data_size as u8, 0, 0));
    }

    let per_chunk = MAX_HEAP_ALLOC / record_size;
    let mut leaves = Vec::new();
    for chunk in records.chunks(per_chunk) {
        let mut leaf = Vec::with_capacity(chunk.len() * record_size);
        for (key, data) in chunk {
            debug_assert_eq!(key.len(), key_size);
            debug_assert_eq!(data.len(), data_size);
            leaf.extend_from_slice(key);
            leaf.extend_from_slice(data);
        }
        let first_key = chunk[0].0.clone();
        leaves.push((first_key, hn.allocate(&leaf)?));
    }

    let (index_levels, root) = if leaves.len() == 1 {
        (0, u32::from(leaves[0].1))
    } else {
        let mut index = Vec::with_capacity(leaves.len() * (key_size + 4));
        for (first_key, hid) in &leaves {
            index.extend_from_slice(first_key);
            index.extend_from_slice(&u32::from(*hid).to_le_bytes());
        }
        (1, u32::from(hn.allocate(&index)?))
    };

    hn.allocate(&pack_header(key_size as u8, data_size as u8, index_levels, root))
}
