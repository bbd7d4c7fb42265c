//! MAPI property tags (`id << 16 | type`) and flag constants used by the
//! messaging builders.

// Property type codes.
pub const PT_SHORT: u32 = 0x0002;
pub const PT_LONG: u32 = 0x0003;
pub const PT_BOOLEAN: u32 = 0x000B;
pub const PT_STRING8: u32 = 0x001E;
pub const PT_UNICODE: u32 = 0x001F;
pub const PT_SYSTIME: u32 = 0x0040;
pub const PT_BINARY: u32 = 0x0102;

const fn tag(id: u32, prop_type: u32) -> u32 {
    (id << 16) | prop_type
}

// Message store.
pub const PID_TAG_RECORD_KEY: u32 = tag(0x0FF9, PT_BINARY);
pub const PID_TAG_DISPLAY_NAME: u32 = tag(0x3001, PT_UNICODE);
pub const PID_TAG_IPM_SUBTREE_ENTRYID: u32 = tag(0x35E0, PT_BINARY);
pub const PID_TAG_STORE_SUPPORT_MASK: u32 = tag(0x340D, PT_LONG);
pub const PID_TAG_VALID_FOLDER_MASK: u32 = tag(0x35DF, PT_LONG);
pub const PID_TAG_PST_PASSWORD: u32 = tag(0x67FF, PT_LONG);

// Name-to-ID map.
pub const PID_TAG_NAMEID_BUCKET_COUNT: u32 = tag(0x0001, PT_LONG);
pub const PID_TAG_NAMEID_STREAM_GUID: u32 = tag(0x0002, PT_BINARY);
pub const PID_TAG_NAMEID_STREAM_ENTRY: u32 = tag(0x0003, PT_BINARY);
pub const PID_TAG_NAMEID_STREAM_STRING: u32 = tag(0x0004, PT_BINARY);

// Folders.
pub const PID_TAG_CONTENT_COUNT: u32 = tag(0x3602, PT_LONG);
pub const PID_TAG_CONTENT_UNREAD_COUNT: u32 = tag(0x3603, PT_LONG);
pub const PID_TAG_SUBFOLDERS: u32 = tag(0x360A, PT_BOOLEAN);
pub const PID_TAG_CONTAINER_CLASS: u32 = tag(0x3613, PT_UNICODE);

// Messages.
pub const PID_TAG_IMPORTANCE: u32 = tag(0x0017, PT_LONG);
pub const PID_TAG_MESSAGE_CLASS: u32 = tag(0x001A, PT_UNICODE);
pub const PID_TAG_PRIORITY: u32 = tag(0x0026, PT_LONG);
pub const PID_TAG_SENSITIVITY: u32 = tag(0x0036, PT_LONG);
pub const PID_TAG_SUBJECT: u32 = tag(0x0037, PT_UNICODE);
pub const PID_TAG_CLIENT_SUBMIT_TIME: u32 = tag(0x0039, PT_SYSTIME);
pub const PID_TAG_SENT_REPRESENTING_NAME: u32 = tag(0x0042, PT_UNICODE);
pub const PID_TAG_SENT_REPRESENTING_ADDRTYPE: u32 = tag(0x0064, PT_UNICODE);
pub const PID_TAG_SENT_REPRESENTING_EMAIL: u32 = tag(0x0065, PT_UNICODE);
pub const PID_TAG_MESSAGE_DELIVERY_TIME: u32 = tag(0x0E06, PT_SYSTIME);
pub const PID_TAG_MESSAGE_FLAGS: u32 = tag(0x0E07, PT_LONG);
pub const PID_TAG_MESSAGE_SIZE: u32 = tag(0x0E08, PT_LONG);
pub const PID_TAG_HASATTACH: u32 = tag(0x0E1B, PT_BOOLEAN);
pub const PID_TAG_NORMALIZED_SUBJECT: u32 = tag(0x0E1D, PT_UNICODE);
pub const PID_TAG_BODY: u32 = tag(0x1000, PT_UNICODE);
pub const PID_TAG_HTML: u32 = tag(0x1013, PT_BINARY);
pub const PID_TAG_CREATION_TIME: u32 = tag(0x3007, PT_SYSTIME);
pub const PID_TAG_LAST_MODIFICATION_TIME: u32 = tag(0x3008, PT_SYSTIME);
pub const PID_TAG_INTERNET_CPID: u32 = tag(0x3FDE, PT_LONG);

// Senders.
pub const PID_TAG_SENDER_NAME: u32 = tag(0x0C1A, PT_UNICODE);
pub const PID_TAG_SENDER_ADDRTYPE: u32 = tag(0x0C1E, PT_UNICODE);
pub const PID_TAG_SENDER_EMAIL_ADDRESS: u32 = tag(0x0C1F, PT_UNICODE);

// Recipients.
pub const PID_TAG_ROWID: u32 = tag(0x3000, PT_LONG);
pub const PID_TAG_ADDRTYPE: u32 = tag(0x3002, PT_UNICODE);
pub const PID_TAG_EMAIL_ADDRESS: u32 = tag(0x3003, PT_UNICODE);
pub const PID_TAG_RECIPIENT_TYPE: u32 = tag(0x0C15, PT_LONG);

// Attachments.
pub const PID_TAG_ATTACH_SIZE: u32 = tag(0x0E20, PT_LONG);
pub const PID_TAG_ATTACH_NUM: u32 = tag(0x0E21, PT_LONG);
pub const PID_TAG_ATTACH_DATA_BIN: u32 = tag(0x3701, PT_BINARY);
pub const PID_TAG_ATTACH_METHOD: u32 = tag(0x3705, PT_LONG);
pub const PID_TAG_ATTACH_LONG_FILENAME: u32 = tag(0x3707, PT_UNICODE);
pub const PID_TAG_RENDERING_POSITION: u32 = tag(0x370B, PT_LONG);
pub const PID_TAG_ATTACH_MIME_TAG: u32 = tag(0x370E, PT_UNICODE);

// Message flags.
pub const MSGFLAG_READ: i32 = 0x0001;
pub const MSGFLAG_HASATTACH: i32 = 0x0010;

// Recipient types.
pub const MAPI_TO: i32 = 1;
pub const MAPI_CC: i32 = 2;
pub const MAPI_BCC: i32 = 3;

// Attachment methods.
pub const ATTACH_BY_VALUE: i32 = 1;

// Store support mask bits.
pub const STORE_ENTRYID_UNIQUE: i32 = 0x0000_0001;
pub const STORE_SEARCH_OK: i32 = 0x0000_0004;
pub const STORE_MODIFY_OK: i32 = 0x0000_0008;
pub const STORE_CREATE_OK: i32 = 0x0000_0010;
pub const STORE_ATTACH_OK: i32 = 0x0000_0020;
pub const STORE_OLE_OK: i32 = 0x0000_0040;
pub const STORE_UNICODE_OK: i32 = 0x0004_0000;

/// Default mask for a writable Unicode store.
pub const DEFAULT_STORE_SUPPORT_MASK: i32 = STORE_ENTRYID_UNIQUE
    | STORE_SEARCH_OK
    | STORE_MODIFY_OK
    | STORE_CREATE_OK
    | STORE_ATTACH_OK
    | STORE_OLE_OK
    | STORE_UNICODE_OK;

// Valid folder mask bits.
pub const FOLDER_IPM_SUBTREE_VALID: i32 = 0x0000_0001;
