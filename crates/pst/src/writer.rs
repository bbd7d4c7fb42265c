//! PST file assembly: places every data block and page, builds the NBT/BBT
//! and allocation maps, and writes the finished file in offset order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, instrument};

use crate::ltp::prop_context::PcNode;
use crate::ltp::table_context::TcNode;
use crate::messaging::folder::{
    assoc_contents_table_nid, build_assoc_contents_tc, build_contents_tc, build_folder_pc,
    build_hierarchy_tc, contents_table_nid, hierarchy_table_nid, FolderSummary, MessageSummary,
};
use crate::messaging::message::{
    attachment_subnode_nid, build_attachment_pc, build_attachments_tc, build_message_pc,
    build_recipients_tc, MessageContent,
};
use crate::messaging::store::{build_message_store, build_name_to_id_map};
use crate::messaging::MessagingError;
use crate::ndb::*;
use crate::{PstError, PstResult};

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_EPOCH: u64 = 11_644_473_600;

fn filetime_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| (elapsed.as_secs() + FILETIME_UNIX_EPOCH) * 10_000_000)
        .unwrap_or(0)
}

/// Advance `offset` until `[offset, offset + size)` clears every fixed AMap
/// page slot.
fn skip_amap_pages(mut offset: u64, size: u64) -> u64 {
    loop {
        if offset < FIRST_AMAP_OFFSET {
            return offset;
        }
        let span = (offset - FIRST_AMAP_OFFSET) / AMAP_COVERAGE;
        let amap_pos = amap_page_offset(span);
        if offset < amap_pos + PAGE_SIZE as u64 {
            offset = amap_pos + PAGE_SIZE as u64;
            continue;
        }
        let next_amap = amap_page_offset(span + 1);
        if offset + size > next_amap {
            offset = next_amap + PAGE_SIZE as u64;
            continue;
        }
        return offset;
    }
}

struct FolderState {
    name: String,
    parent: NodeId,
    children: Vec<NodeId>,
    messages: Vec<NodeId>,
}

struct NodeEntry {
    node: NodeId,
    data: BlockId,
    sub_node: BlockId,
    parent: NodeId,
}

/// Builds a complete Unicode PST from folders and messages.
///
/// Message and folder nodes are materialized as they are added; `write`
/// assembles the remaining structures and emits the file in one pass.
pub struct PstWriter {
    display_name: String,
    bids: BidAllocator,
    next_node_index: u32,
    nodes: Vec<NodeEntry>,
    data_blocks: Vec<(BlockId, Vec<u8>)>,
    folders: BTreeMap<NodeId, FolderState>,
    summaries: BTreeMap<NodeId, MessageSummary>,
}

impl PstWriter {
    pub fn new(display_name: &str) -> Self {
        let mut folders = BTreeMap::new();
        folders.insert(
            NID_ROOT_FOLDER,
            FolderState {
                name: "Top of Personal Folders".into(),
                parent: NID_ROOT_FOLDER,
                children: Vec::new(),
                messages: Vec::new(),
            },
        );

        Self {
            display_name: display_name.into(),
            bids: BidAllocator::new(),
            next_node_index: FIRST_ALLOCATED_NODE_INDEX,
            nodes: Vec::new(),
            data_blocks: Vec::new(),
            folders,
            summaries: BTreeMap::new(),
        }
    }

    pub fn root_folder(&self) -> NodeId {
        NID_ROOT_FOLDER
    }

    fn alloc_nid(&mut self, id_type: NodeIdType) -> PstResult<NodeId> {
        let index = self.next_node_index;
        self.next_node_index += 1;
        Ok(NodeId::new(id_type, index)?)
    }

    fn store_data_block(&mut self, data: Vec<u8>) -> BlockId {
        let bid = self.bids.leaf();
        self.data_blocks.push((bid, data));
        bid
    }

    fn store_internal_block(&mut self, data: Vec<u8>) -> BlockId {
        let bid = self.bids.internal();
        self.data_blocks.push((bid, data));
        bid
    }

    /// One HN page becomes a leaf block; several become leaf blocks chained
    /// through an XBLOCK.
    fn store_node_pages(&mut self, pages: Vec<Vec<u8>>) -> BlockId {
        if pages.len() == 1 {
            let mut pages = pages;
            return self.store_data_block(pages.remove(0));
        }

        let total: usize = pages.iter().map(Vec::len).sum();
        let bids: Vec<_> = pages
            .into_iter()
            .map(|page| self.store_data_block(page))
            .collect();
        self.store_internal_block(build_xblock(&bids, total as u32))
    }

    /// Store a sub-node value, chunking past the single-block limit.
    fn store_subnode_data(&mut self, data: Vec<u8>) -> PstResult<BlockId> {
        if data.len() as u64 > u64::from(u32::MAX) {
            return Err(NdbError::SubnodeValueTooLarge(data.len() as u64).into());
        }

        if data.len() <= MAX_BLOCK_DATA {
            return Ok(self.store_data_block(data));
        }

        let total = data.len() as u32;
        let bids: Vec<_> = data
            .chunks(MAX_BLOCK_DATA)
            .map(|chunk| self.store_data_block(chunk.to_vec()))
            .collect();
        Ok(self.store_internal_block(build_xblock(&bids, total)))
    }

    fn build_sl_bid(&mut self, entries: Vec<SubnodeLeafEntry>) -> BlockId {
        if entries.is_empty() {
            return BlockId::from(0);
        }
        self.store_internal_block(build_sl_block(&entries))
    }

    /// Store a PC or TC destined for a sub-node slot; returns its data BID
    /// and the BID of its own sub-node index (zero when it has none).
    fn store_tc_or_pc(
        &mut self,
        pages: Vec<Vec<u8>>,
        subnodes: Vec<(NodeId, Vec<u8>)>,
    ) -> PstResult<(BlockId, BlockId)> {
        let data_bid = self.store_node_pages(pages);
        let mut entries = Vec::with_capacity(subnodes.len());
        for (node, data) in subnodes {
            entries.push(SubnodeLeafEntry {
                node,
                block: self.store_subnode_data(data)?,
                sub_block: BlockId::from(0),
            });
        }
        Ok((data_bid, self.build_sl_bid(entries)))
    }

    /// Register a top-level node from its HN pages, spilled values, and any
    /// pre-built extra SL entries.
    fn add_node(
        &mut self,
        node: NodeId,
        pages: Vec<Vec<u8>>,
        subnodes: Vec<(NodeId, Vec<u8>)>,
        extra_sl_entries: Vec<SubnodeLeafEntry>,
        parent: NodeId,
    ) -> PstResult<BlockId> {
        let data = self.store_node_pages(pages);

        let mut entries = extra_sl_entries;
        for (sub_node, sub_data) in subnodes {
            entries.push(SubnodeLeafEntry {
                node: sub_node,
                block: self.store_subnode_data(sub_data)?,
                sub_block: BlockId::from(0),
            });
        }
        entries.sort_by_key(|entry| u64::from(entry.node));

        let sub_node = self.build_sl_bid(entries);
        self.nodes.push(NodeEntry { node, data, sub_node, parent });
        Ok(data)
    }

    /// Add a folder under `parent` (the root when `None`).
    pub fn add_folder(&mut self, name: &str, parent: Option<NodeId>) -> PstResult<NodeId> {
        let parent = parent.unwrap_or(NID_ROOT_FOLDER);
        if !self.folders.contains_key(&parent) {
            return Err(MessagingError::UnknownFolder(parent).into());
        }

        let node = self.alloc_nid(NodeIdType::NormalFolder)?;
        self.folders.insert(
            node,
            FolderState {
                name: name.into(),
                parent,
                children: Vec::new(),
                messages: Vec::new(),
            },
        );
        if let Some(parent_state) = self.folders.get_mut(&parent) {
            parent_state.children.push(node);
        }
        Ok(node)
    }

    /// Add a message to `folder`, materializing its PC, recipient and
    /// attachment tables, and per-attachment PCs.
    #[instrument(skip_all, fields(subject = %message.subject))]
    pub fn add_message(&mut self, folder: NodeId, message: &MessageContent) -> PstResult<NodeId> {
        if !self.folders.contains_key(&folder) {
            return Err(MessagingError::UnknownFolder(folder).into());
        }

        let node = self.alloc_nid(NodeIdType::NormalMessage)?;
        let timestamp = filetime_now();

        let PcNode { pages, subnodes } = build_message_pc(message, timestamp)?;

        let mut extra_sl = Vec::new();

        if !message.recipients.is_empty() {
            let TcNode { pages, subnodes } = build_recipients_tc(&message.recipients)?;
            let (block, sub_block) = self.store_tc_or_pc(pages, subnodes)?;
            extra_sl.push(SubnodeLeafEntry { node: NID_RECIPIENT_TABLE, block, sub_block });
        }

        if !message.attachments.is_empty() {
            let TcNode { pages, subnodes } = build_attachments_tc(&message.attachments)?;
            let (block, sub_block) = self.store_tc_or_pc(pages, subnodes)?;
            extra_sl.push(SubnodeLeafEntry { node: NID_ATTACHMENT_TABLE, block, sub_block });

            for (index, attachment) in message.attachments.iter().enumerate() {
                let PcNode { pages, subnodes } = build_attachment_pc(attachment, index as u32)?;
                let (block, sub_block) = self.store_tc_or_pc(pages, subnodes)?;
                extra_sl.push(SubnodeLeafEntry {
                    node: attachment_subnode_nid(index as u32),
                    block,
                    sub_block,
                });
            }
        }

        self.add_node(node, pages, subnodes, extra_sl, folder)?;

        self.summaries.insert(
            node,
            MessageSummary {
                node,
                subject: message.subject.clone(),
                message_class: message.message_class().into(),
                flags: message.flags(),
                size: message.size(),
                delivery_time: message.delivery_time,
                importance: message.importance,
                has_attachments: !message.attachments.is_empty(),
                sender_name: message.sender_name.clone(),
            },
        );
        if let Some(folder_state) = self.folders.get_mut(&folder) {
            folder_state.messages.push(node);
        }

        Ok(node)
    }

    fn build_internal_nodes(&mut self) -> PstResult<()> {
        let (store, _record_key) = build_message_store(&self.display_name)?;
        self.add_node(NID_MESSAGE_STORE, store.pages, store.subnodes, Vec::new(), NodeId::from(0))?;

        let name_map = build_name_to_id_map()?;
        self.add_node(
            NID_NAME_TO_ID_MAP,
            name_map.pages,
            name_map.subnodes,
            Vec::new(),
            NodeId::from(0),
        )?;
        Ok(())
    }

    fn build_folder_nodes(&mut self) -> PstResult<()> {
        let timestamp = filetime_now();
        let folder_nids: Vec<_> = self.folders.keys().copied().collect();

        for node in folder_nids {
            let (name, parent, children, messages) = {
                let state = &self.folders[&node];
                (state.name.clone(), state.parent, state.children.clone(), state.messages.clone())
            };

            let pc = build_folder_pc(
                &name,
                messages.len() as i32,
                !children.is_empty(),
                "IPF.Note",
                timestamp,
            )?;

            let child_rows: Vec<_> = children
                .iter()
                .map(|child| {
                    let state = &self.folders[child];
                    FolderSummary {
                        node: *child,
                        display_name: state.name.clone(),
                        content_count: state.messages.len() as i32,
                        has_subfolders: !state.children.is_empty(),
                    }
                })
                .collect();
            let hierarchy = build_hierarchy_tc(&child_rows)?;
            let (hierarchy_bid, hierarchy_sub) =
                self.store_tc_or_pc(hierarchy.pages, hierarchy.subnodes)?;

            let message_rows: Vec<_> = messages
                .iter()
                .filter_map(|message| self.summaries.get(message).cloned())
                .collect();
            let contents = build_contents_tc(&message_rows)?;
            let (contents_bid, contents_sub) =
                self.store_tc_or_pc(contents.pages, contents.subnodes)?;

            let assoc = build_assoc_contents_tc()?;
            let (assoc_bid, assoc_sub) = self.store_tc_or_pc(assoc.pages, assoc.subnodes)?;

            self.add_node(node, pc.pages, pc.subnodes, Vec::new(), parent)?;
            self.nodes.push(NodeEntry {
                node: hierarchy_table_nid(node),
                data: hierarchy_bid,
                sub_node: hierarchy_sub,
                parent: NodeId::from(0),
            });
            self.nodes.push(NodeEntry {
                node: contents_table_nid(node),
                data: contents_bid,
                sub_node: contents_sub,
                parent: NodeId::from(0),
            });
            self.nodes.push(NodeEntry {
                node: assoc_contents_table_nid(node),
                data: assoc_bid,
                sub_node: assoc_sub,
                parent: NodeId::from(0),
            });
        }
        Ok(())
    }

    /// Assemble and write the PST to `writer`.
    #[instrument(skip_all, fields(folders = self.folders.len(), messages = self.summaries.len()))]
    pub fn write_to(mut self, writer: &mut dyn Write) -> PstResult<()> {
        self.build_internal_nodes()?;
        self.build_folder_nodes()?;

        // Phase 1: data block offsets, stepping around the AMap stride.
        let mut cursor = FIRST_AMAP_OFFSET + PAGE_SIZE as u64;
        let mut block_offsets = BTreeMap::new();
        for (bid, data) in &self.data_blocks {
            let total = block_total_size(data.len()) as u64;
            cursor = skip_amap_pages(cursor, total);
            block_offsets.insert(*bid, cursor);
            cursor += total;
        }

        // Phase 2: B-tree pages on a 512-byte boundary past the blocks.
        cursor = cursor.next_multiple_of(PAGE_SIZE as u64);

        let mut node_entries: Vec<_> = self
            .nodes
            .iter()
            .map(|entry| NodeBTreeEntry {
                node: entry.node,
                data: entry.data,
                sub_node: entry.sub_node,
                parent: entry.parent,
            })
            .collect();
        node_entries.sort_by_key(NodeBTreeEntry::key);

        let mut block_entries: Vec<_> = self
            .data_blocks
            .iter()
            .map(|(bid, data)| BlockBTreeEntry {
                block: *bid,
                offset: block_offsets[bid],
                size: data.len() as u16,
                refs: 2,
            })
            .collect();
        block_entries.sort_by_key(BlockBTreeEntry::key);

        let mut alloc_page_offset = |cursor: &mut u64| {
            let offset = skip_amap_pages(*cursor, PAGE_SIZE as u64);
            *cursor = offset + PAGE_SIZE as u64;
            offset
        };

        let nbt_pages = build_node_btree(&node_entries, &mut self.bids, |_| {
            alloc_page_offset(&mut cursor)
        })?;
        let bbt_pages = build_block_btree(&block_entries, &mut self.bids, |_| {
            alloc_page_offset(&mut cursor)
        })?;

        // The builders return at least one page even for empty entry sets.
        let nbt_root = nbt_pages
            .last()
            .map(|page| BlockRef { block: page.block_id, index: page.offset })
            .unwrap_or_default();
        let bbt_root = bbt_pages
            .last()
            .map(|page| BlockRef { block: page.block_id, index: page.offset })
            .unwrap_or_default();

        let file_eof = cursor;

        // Phase 3: allocation maps over every placed extent.
        let mut allocated: Vec<(u64, u64)> = self
            .data_blocks
            .iter()
            .map(|(bid, data)| (block_offsets[bid], block_total_size(data.len()) as u64))
            .collect();
        for page in nbt_pages.iter().chain(&bbt_pages) {
            allocated.push((page.offset, PAGE_SIZE as u64));
        }

        let amap_count = amap_page_count(file_eof);
        let mut amap_pages = Vec::with_capacity(amap_count as usize);
        let mut amap_free = 0_u64;
        let mut amap_last = FIRST_AMAP_OFFSET;
        for index in 0..amap_count {
            let offset = amap_page_offset(index);
            let page = build_amap_page(&allocated, offset, self.bids.page());
            amap_free += amap_free_bytes(&allocated, offset);
            amap_last = offset;
            amap_pages.push((offset, page));
        }

        // Phase 4: header.
        let root = Root {
            file_eof,
            amap_last,
            amap_free,
            pmap_free: 0,
            node_btree: nbt_root,
            block_btree: bbt_root,
            amap_status: AmapStatus::Valid2,
        };
        let header = build_header(
            &root,
            self.bids.next_page_bid(),
            self.bids.next_block_bid(),
            1,
            NdbCryptMethod::None,
        );

        debug!(
            file_eof,
            blocks = self.data_blocks.len(),
            nodes = self.nodes.len(),
            amap_pages = amap_pages.len(),
            "assembled pst"
        );

        // Phase 5: everything in offset order, zero-filling the gaps.
        let mut items: Vec<(u64, Vec<u8>)> = Vec::new();
        for (offset, page) in amap_pages {
            items.push((offset, page));
        }
        for (bid, data) in &self.data_blocks {
            let offset = block_offsets[bid];
            items.push((offset, pack_block(data, *bid, offset)?));
        }
        for page in nbt_pages.into_iter().chain(bbt_pages) {
            items.push((page.offset, page.data));
        }
        items.sort_by_key(|(offset, _)| *offset);

        writer.write_all(&header)?;
        let mut position = header.len() as u64;
        for (offset, data) in items {
            if offset > position {
                write_zeros(writer, offset - position)?;
            }
            writer.write_all(&data)?;
            position = offset + data.len() as u64;
        }
        if file_eof > position {
            write_zeros(writer, file_eof - position)?;
        }

        Ok(())
    }

    /// Assemble and write the PST to a file at `path`.
    pub fn write(self, path: impl AsRef<Path>) -> PstResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(PstError::Io)
    }
}

fn write_zeros(writer: &mut dyn Write, mut remaining: u64) -> std::io::Result<()> {
    let zeros = [0_u8; 4096];
    while remaining > 0 {
        let chunk = remaining.min(zeros.len() as u64) as usize;
        writer.write_all(&zeros[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::message::{RecipientContent, RecipientKind};

    fn message(subject: &str) -> MessageContent {
        MessageContent {
            subject: subject.into(),
            body_text: "body".into(),
            sender_name: "Alice Example".into(),
            sender_email: "alice@example.com".into(),
            recipients: vec![RecipientContent {
                display_name: "Bob".into(),
                email: "bob@example.com".into(),
                kind: RecipientKind::To,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_skip_amap_pages() {
        // Directly on the first AMap page: pushed past it.
        assert_eq!(
            skip_amap_pages(FIRST_AMAP_OFFSET, 64),
            FIRST_AMAP_OFFSET + PAGE_SIZE as u64
        );
        // Clear of any AMap slot: unchanged.
        let offset = FIRST_AMAP_OFFSET + PAGE_SIZE as u64;
        assert_eq!(skip_amap_pages(offset, 4096), offset);
        // Would run into the second AMap page: pushed past it.
        let tail = amap_page_offset(1) - 64;
        assert_eq!(
            skip_amap_pages(tail, 4096),
            amap_page_offset(1) + PAGE_SIZE as u64
        );
    }

    #[test]
    fn test_unknown_folder_rejected() {
        let mut pst = PstWriter::new("Test");
        let bogus = NodeId::new(NodeIdType::NormalFolder, 999).unwrap();
        assert!(pst.add_folder("x", Some(bogus)).is_err());
        assert!(pst.add_message(bogus, &message("x")).is_err());
    }

    #[test]
    fn test_folder_produces_four_nodes() {
        let mut pst = PstWriter::new("Test");
        let _inbox = pst.add_folder("Inbox", None).unwrap();
        pst.build_internal_nodes().unwrap();
        pst.build_folder_nodes().unwrap();

        // Store + name map + (root and Inbox) x (PC + 3 TCs).
        assert_eq!(pst.nodes.len(), 2 + 2 * 4);
    }

    #[test]
    fn test_message_subnode_entries() {
        let mut pst = PstWriter::new("Test");
        let inbox = pst.add_folder("Inbox", None).unwrap();
        let mut content = message("With attachment");
        content.attachments.push(crate::messaging::message::AttachmentContent {
            filename: "a.txt".into(),
            mime_type: "text/plain".into(),
            data: b"hello".to_vec(),
        });
        pst.add_message(inbox, &content).unwrap();

        let entry = pst.nodes.last().unwrap();
        assert_eq!(entry.node.id_type().unwrap(), NodeIdType::NormalMessage);
        assert!(entry.sub_node.is_internal());
        assert_eq!(entry.parent, inbox);
    }

    #[test]
    fn test_write_to_produces_valid_offsets() {
        let mut pst = PstWriter::new("Test");
        let inbox = pst.add_folder("Inbox", None).unwrap();
        pst.add_message(inbox, &message("Hello")).unwrap();

        let mut out = Vec::new();
        pst.write_to(&mut out).unwrap();

        assert!(out.len() > FIRST_AMAP_OFFSET as usize + PAGE_SIZE);
        assert_eq!(&out[..4], b"!BDN");
        // File EOF in the ROOT matches the byte count.
        let file_eof = u64::from_le_bytes(out[0xB4 + 4..0xB4 + 12].try_into().unwrap());
        assert_eq!(file_eof, out.len() as u64);
    }
}
