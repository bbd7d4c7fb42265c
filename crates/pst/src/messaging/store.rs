//! ## [Message Store](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/aa0539bd-e7bf-4cec-8bde-0b87c2a86baf)
//!
//! The store PC (NID 0x21) is the root object of every PST; the name-to-ID
//! map (NID 0x61) is a minimal but structurally valid named-property map.

use uuid::Uuid;

use super::tags::*;
use super::*;
use crate::ltp::prop_context::{build_pc, PcNode};
use crate::ltp::prop_type::PropertyValue;
use crate::ndb::{NodeId, NID_ROOT_FOLDER};

/// `PS_MAPI`
const PS_MAPI: [u8; 16] = [
    0x28, 0x03, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

/// `PS_PUBLIC_STRINGS`
const PS_PUBLIC_STRINGS: [u8; 16] = [
    0x29, 0x03, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

const NAMEID_BUCKET_COUNT: i32 = 251;

/// Build a 24-byte PST [EntryID](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/28029f93-8de3-46fa-9eef-c078b3b6b2be):
/// flags, the store's record key, and the target NID.
pub fn make_entry_id(record_key: &[u8; 16], node: NodeId) -> Vec<u8> {
    let mut entry_id = Vec::with_capacity(24);
    entry_id.extend_from_slice(&0_u32.to_le_bytes());
    entry_id.extend_from_slice(record_key);
    entry_id.extend_from_slice(&u32::from(node).to_le_bytes());
    entry_id
}

/// Build the message store PC. Returns the node and the freshly generated
/// record key that every entry ID must carry.
pub fn build_message_store(display_name: &str) -> MessagingResult<(PcNode, [u8; 16])> {
    let record_key = *Uuid::new_v4().as_bytes();

    let properties = [
        (PID_TAG_RECORD_KEY, PropertyValue::Binary(record_key.to_vec())),
        (PID_TAG_DISPLAY_NAME, PropertyValue::Unicode(display_name.into())),
        (
            PID_TAG_IPM_SUBTREE_ENTRYID,
            PropertyValue::Binary(make_entry_id(&record_key, NID_ROOT_FOLDER)),
        ),
        (
            PID_TAG_STORE_SUPPORT_MASK,
            PropertyValue::Integer32(DEFAULT_STORE_SUPPORT_MASK),
        ),
        (
            PID_TAG_VALID_FOLDER_MASK,
            PropertyValue::Integer32(FOLDER_IPM_SUBTREE_VALID),
        ),
        (PID_TAG_PST_PASSWORD, PropertyValue::Integer32(0)),
    ];

    Ok((build_pc(&properties)?, record_key))
}

/// Build the [Name-to-ID Map](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/e17e195d-0454-4b9b-b398-c9127a26a678)
/// PC with its bucket count, GUID stream, and placeholder entry/string
/// streams.
pub fn build_name_to_id_map() -> MessagingResult<PcNode> {
    let mut guid_stream = Vec::with_capacity(32);
    guid_stream.extend_from_slice(&PS_MAPI);
    guid_stream.extend_from_slice(&PS_PUBLIC_STRINGS);

    let properties = [
        (PID_TAG_NAMEID_BUCKET_COUNT, PropertyValue::Integer32(NAMEID_BUCKET_COUNT)),
        (PID_TAG_NAMEID_STREAM_GUID, PropertyValue::Binary(guid_stream)),
        (PID_TAG_NAMEID_STREAM_ENTRY, PropertyValue::Binary(vec![0; 8])),
        (PID_TAG_NAMEID_STREAM_STRING, PropertyValue::Binary(vec![0; 4])),
    ];

    Ok(build_pc(&properties)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_layout() {
        let record_key = [0xAA; 16];
        let entry_id = make_entry_id(&record_key, NID_ROOT_FOLDER);
        assert_eq!(entry_id.len(), 24);
        assert_eq!(&entry_id[0..4], &[0, 0, 0, 0]);
        assert_eq!(&entry_id[4..20], &record_key);
        assert_eq!(u32::from_le_bytes(entry_id[20..24].try_into().unwrap()), 0x122);
    }

    #[test]
    fn test_store_has_no_subnodes() {
        let (store, record_key) = build_message_store("Personal Folders").unwrap();
        assert_eq!(store.pages.len(), 1);
        assert!(store.subnodes.is_empty());
        assert_ne!(record_key, [0; 16]);
    }

    #[test]
    fn test_record_keys_are_unique() {
        let (_, first) = build_message_store("a").unwrap();
        let (_, second) = build_message_store("a").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_name_to_id_map_builds() {
        let map = build_name_to_id_map().unwrap();
        assert_eq!(map.pages.len(), 1);
        assert!(map.subnodes.is_empty());
    }
}
