//! ## [Folders](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/dee5b9d0-5513-4c5e-94aa-8bd28a9350b2)
//!
//! Every folder contributes four top-level nodes: its PC, and the hierarchy,
//! contents, and FAI contents TCs whose NIDs share the folder's index with a
//! different type nibble.

use super::tags::*;
use super::*;
use crate::ltp::prop_context::{build_pc, PcNode};
use crate::ltp::prop_type::PropertyValue;
use crate::ltp::table_context::{build_tc, TableRow, TcNode};
use crate::ndb::{NodeId, NodeIdType};

pub fn hierarchy_table_nid(folder: NodeId) -> NodeId {
    folder.with_type(NodeIdType::HierarchyTable)
}

pub fn contents_table_nid(folder: NodeId) -> NodeId {
    folder.with_type(NodeIdType::ContentsTable)
}

pub fn assoc_contents_table_nid(folder: NodeId) -> NodeId {
    folder.with_type(NodeIdType::AssociatedContentsTable)
}

/// Summary of a child folder for a hierarchy TC row.
#[derive(Clone, Debug)]
pub struct FolderSummary {
    pub node: NodeId,
    pub display_name: String,
    pub content_count: i32,
    pub has_subfolders: bool,
}

/// Summary of a contained message for a contents TC row.
#[derive(Clone, Debug)]
pub struct MessageSummary {
    pub node: NodeId,
    pub subject: String,
    pub message_class: String,
    pub flags: i32,
    pub size: i32,
    pub delivery_time: Option<u64>,
    pub importance: i32,
    pub has_attachments: bool,
    pub sender_name: String,
}

/// Build a folder PC.
pub fn build_folder_pc(
    display_name: &str,
    content_count: i32,
    has_subfolders: bool,
    container_class: &str,
    timestamp: u64,
) -> MessagingResult<PcNode> {
    let properties = [
        (PID_TAG_DISPLAY_NAME, PropertyValue::Unicode(display_name.into())),
        (PID_TAG_CONTENT_COUNT, PropertyValue::Integer32(content_count)),
        (PID_TAG_CONTENT_UNREAD_COUNT, PropertyValue::Integer32(0)),
        (PID_TAG_SUBFOLDERS, PropertyValue::Boolean(has_subfolders)),
        (PID_TAG_CONTAINER_CLASS, PropertyValue::Unicode(container_class.into())),
        (PID_TAG_CREATION_TIME, PropertyValue::Time(timestamp)),
        (PID_TAG_LAST_MODIFICATION_TIME, PropertyValue::Time(timestamp)),
    ];
    Ok(build_pc(&properties)?)
}

/// Build the hierarchy TC: one row per direct child folder.
pub fn build_hierarchy_tc(children: &[FolderSummary]) -> MessagingResult<TcNode> {
    let columns = [
        PID_TAG_DISPLAY_NAME,
        PID_TAG_CONTENT_COUNT,
        PID_TAG_CONTENT_UNREAD_COUNT,
        PID_TAG_SUBFOLDERS,
    ];

    let rows: Vec<_> = children
        .iter()
        .map(|child| {
            TableRow::new(u32::from(child.node))
                .set(PID_TAG_DISPLAY_NAME, PropertyValue::Unicode(child.display_name.clone()))
                .set(PID_TAG_CONTENT_COUNT, PropertyValue::Integer32(child.content_count))
                .set(PID_TAG_CONTENT_UNREAD_COUNT, PropertyValue::Integer32(0))
                .set(PID_TAG_SUBFOLDERS, PropertyValue::Boolean(child.has_subfolders))
        })
        .collect();

    Ok(build_tc(&columns, &rows)?)
}

/// Build the contents TC: one row per message.
pub fn build_contents_tc(messages: &[MessageSummary]) -> MessagingResult<TcNode> {
    let columns = [
        PID_TAG_SUBJECT,
        PID_TAG_MESSAGE_CLASS,
        PID_TAG_MESSAGE_FLAGS,
        PID_TAG_MESSAGE_SIZE,
        PID_TAG_MESSAGE_DELIVERY_TIME,
        PID_TAG_IMPORTANCE,
        PID_TAG_HASATTACH,
        PID_TAG_SENDER_NAME,
    ];

    let rows: Vec<_> = messages
        .iter()
        .map(|message| {
            let mut row = TableRow::new(u32::from(message.node))
                .set(PID_TAG_SUBJECT, PropertyValue::Unicode(message.subject.clone()))
                .set(PID_TAG_MESSAGE_CLASS, PropertyValue::Unicode(message.message_class.clone()))
                .set(PID_TAG_MESSAGE_FLAGS, PropertyValue::Integer32(message.flags))
                .set(PID_TAG_MESSAGE_SIZE, PropertyValue::Integer32(message.size))
                .set(PID_TAG_IMPORTANCE, PropertyValue::Integer32(message.importance))
                .set(PID_TAG_HASATTACH, PropertyValue::Boolean(message.has_attachments))
                .set(PID_TAG_SENDER_NAME, PropertyValue::Unicode(message.sender_name.clone()));
            if let Some(delivery_time) = message.delivery_time {
                row = row.set(PID_TAG_MESSAGE_DELIVERY_TIME, PropertyValue::Time(delivery_time));
            }
            row
        })
        .collect();

    Ok(build_tc(&columns, &rows)?)
}

/// Build the empty but structurally valid FAI contents TC.
pub fn build_assoc_contents_tc() -> MessagingResult<TcNode> {
    Ok(build_tc(&[], &[])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndb::FIRST_ALLOCATED_NODE_INDEX;

    fn folder_nid() -> NodeId {
        NodeId::new(NodeIdType::NormalFolder, FIRST_ALLOCATED_NODE_INDEX).unwrap()
    }

    #[test]
    fn test_table_nids_share_index() {
        let folder = folder_nid();
        assert_eq!(u32::from(hierarchy_table_nid(folder)), 0x40D);
        assert_eq!(u32::from(contents_table_nid(folder)), 0x40E);
        assert_eq!(u32::from(assoc_contents_table_nid(folder)), 0x40F);
    }

    #[test]
    fn test_folder_pc_builds() {
        let pc = build_folder_pc("Inbox", 2, false, "IPF.Note", 0x01D7_06E5_0000_0000).unwrap();
        assert_eq!(pc.pages.len(), 1);
        assert!(pc.subnodes.is_empty());
    }

    #[test]
    fn test_hierarchy_rows_use_child_nids() {
        let child = FolderSummary {
            node: folder_nid(),
            display_name: "Sent Items".into(),
            content_count: 0,
            has_subfolders: false,
        };
        let tc = build_hierarchy_tc(std::slice::from_ref(&child)).unwrap();
        assert_eq!(tc.pages.len(), 1);

        // Row matrix is the second allocation; dwRowID leads the row.
        let page = &tc.pages[0];
        let name_utf16_len = "Sent Items".len() * 2;
        let row = &page[12 + name_utf16_len..];
        assert_eq!(
            u32::from_le_bytes(row[0..4].try_into().unwrap()),
            u32::from(child.node)
        );
    }

    #[test]
    fn test_empty_folder_tables_build() {
        assert!(build_hierarchy_tc(&[]).is_ok());
        assert!(build_contents_tc(&[]).is_ok());
        assert!(build_assoc_contents_tc().is_ok());
    }
}
