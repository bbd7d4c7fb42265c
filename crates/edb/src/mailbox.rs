//! Mailbox enumeration and the single-pass per-mailbox extraction driver.
//!
//! Mailboxes live in the `Mailbox` table; each mailbox `N` has its own
//! `Message_N`, `Folder_N`, and `Attachment_N` tables.

use tracing::{info, warn};

use crate::ese::{ColumnMap, EseDatabase, EseTable};
use crate::extractor::{AttachmentIndex, ExtractorConfig, MessageExtractor};
use crate::folders::FolderResolver;
use crate::lzxpress;
use crate::message::MailMessage;
use crate::{ExtractError, ExtractResult};

/// Columns the row extractor cannot work without; anything else degrades
/// gracefully to empty fields.
const REQUIRED_MESSAGE_COLUMNS: [&str; 2] = ["MessageDocumentId", "FolderId"];

/// One entry of the `Mailbox` table with its per-mailbox table counts.
#[derive(Clone, Debug)]
pub struct Mailbox {
    pub number: u32,
    pub owner: String,
    pub message_count: usize,
    pub folder_count: usize,
    pub attachment_count: usize,
}

/// Advisory progress reporting; the callee decides whether to keep going.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    Folder { path: String },
    Message { index: usize, total: usize },
}

pub type ProgressCallback<'a> = &'a mut dyn FnMut(&ProgressEvent);

fn decode_owner(bytes: &[u8]) -> String {
    let extractor = MessageExtractor::new(ExtractorConfig::default());
    let decompressed = lzxpress::decompress(bytes);
    let text = extractor.try_decode(&decompressed);
    if !text.is_empty() {
        return text;
    }
    extractor.try_decode(bytes)
}

/// Enumerate the mailboxes in a database, sorted by mailbox number.
pub fn list_mailboxes(db: &dyn EseDatabase) -> Vec<Mailbox> {
    let Some(table) = db.table("Mailbox") else {
        return Vec::new();
    };
    let cols = ColumnMap::for_table(table);

    let mut mailboxes = Vec::new();
    for index in 0..table.record_count() {
        let Some(record) = table.record(index) else {
            continue;
        };
        let Some(number) = cols
            .get("MailboxNumber")
            .and_then(|column| record.raw(column))
            .filter(|bytes| bytes.len() >= 4)
            .map(|bytes| u32::from_le_bytes(bytes[..4].try_into().unwrap_or_default()))
        else {
            continue;
        };

        let owner = cols
            .get("MailboxOwnerDisplayName")
            .and_then(|column| record.raw(column))
            .map(|bytes| decode_owner(&bytes))
            .unwrap_or_default();

        let count_of = |name: String| db.table(&name).map_or(0, |table| table.record_count());
        mailboxes.push(Mailbox {
            number,
            owner,
            message_count: count_of(format!("Message_{number}")),
            folder_count: count_of(format!("Folder_{number}")),
            attachment_count: count_of(format!("Attachment_{number}")),
        });
    }

    mailboxes.sort_by_key(|mailbox| mailbox.number);
    mailboxes
}

/// Single-pass reader over one mailbox's tables.
pub struct MailboxReader<'a> {
    pub number: u32,
    message_table: &'a dyn EseTable,
    message_cols: ColumnMap,
    folder_table: Option<&'a dyn EseTable>,
    attachment_table: Option<&'a dyn EseTable>,
}

impl<'a> MailboxReader<'a> {
    /// Open mailbox `number`. A missing message table or required column is
    /// fatal for this mailbox; missing folder/attachment tables only degrade
    /// the output.
    pub fn open(db: &'a dyn EseDatabase, number: u32) -> ExtractResult<Self> {
        let table_name = format!("Message_{number}");
        let message_table = db
            .table(&table_name)
            .ok_or_else(|| ExtractError::MissingTable(table_name.clone()))?;
        let message_cols = ColumnMap::for_table(message_table);

        for column in REQUIRED_MESSAGE_COLUMNS {
            if message_cols.get(column).is_none() {
                return Err(ExtractError::MissingColumn {
                    table: table_name,
                    column: column.into(),
                });
            }
        }

        Ok(Self {
            number,
            message_table,
            message_cols,
            folder_table: db.table(&format!("Folder_{number}")),
            attachment_table: db.table(&format!("Attachment_{number}")),
        })
    }

    pub fn message_count(&self) -> usize {
        self.message_table.record_count()
    }

    /// Build the folder resolver for this mailbox (empty when the folder
    /// table is missing).
    pub fn folder_resolver(&self) -> FolderResolver {
        match self.folder_table {
            Some(table) => FolderResolver::from_table(table),
            None => FolderResolver::default(),
        }
    }

    /// Extract every message in row order. Row failures become `[ERROR]`
    /// stubs; nothing escapes the per-message boundary.
    pub fn extract_all(
        &self,
        extractor: &MessageExtractor,
        mut progress: Option<ProgressCallback<'_>>,
    ) -> Vec<MailMessage> {
        let resolver = self.folder_resolver();
        let attachment_index = self.attachment_table.map(AttachmentIndex::build);
        let total = self.message_count();

        let mut messages = Vec::with_capacity(total);
        for index in 0..total {
            if let Some(callback) = progress.as_deref_mut() {
                callback(&ProgressEvent::Message { index, total });
            }

            let mut message = match self.message_table.record(index) {
                Some(record) => extractor.extract_message(
                    record.as_ref(),
                    &self.message_cols,
                    index,
                    attachment_index.as_ref(),
                ),
                None => {
                    warn!(index, mailbox = self.number, "unreadable record");
                    extractor.error_stub(index)
                }
            };
            message.folder_path = resolver.path_of(&message.folder_id);
            messages.push(message);
        }

        info!(
            mailbox = self.number,
            messages = messages.len(),
            errors = messages.iter().filter(|message| message.has_error).count(),
            "extracted mailbox"
        );
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ese::{MemoryDatabase, MemoryTable, MemoryValue};

    fn database() -> MemoryDatabase {
        let mut db = MemoryDatabase::new();

        let mut mailbox = MemoryTable::new(&["MailboxNumber", "MailboxOwnerDisplayName"]);
        mailbox.push_row(&[
            ("MailboxNumber", MemoryValue::Inline(1_u32.to_le_bytes().to_vec())),
            ("MailboxOwnerDisplayName", MemoryValue::Inline(b"Alice Example".to_vec())),
        ]);
        db.insert_table("Mailbox", mailbox);

        let mut messages = MemoryTable::new(&["MessageDocumentId", "FolderId", "PropertyBlob"]);
        messages.push_row(&[
            ("MessageDocumentId", MemoryValue::Inline(7_u32.to_le_bytes().to_vec())),
            ("FolderId", MemoryValue::Inline(vec![0x02])),
        ]);
        db.insert_table("Message_1", messages);

        let mut folders = MemoryTable::new(&["FolderId", "ParentFolderId", "SpecialFolderNumber"]);
        folders.push_row(&[
            ("FolderId", MemoryValue::Inline(vec![0x02])),
            ("SpecialFolderNumber", MemoryValue::Inline(10_u32.to_le_bytes().to_vec())),
        ]);
        db.insert_table("Folder_1", folders);

        db
    }

    #[test]
    fn test_list_mailboxes() {
        let db = database();
        let mailboxes = list_mailboxes(&db);
        assert_eq!(mailboxes.len(), 1);
        assert_eq!(mailboxes[0].number, 1);
        assert_eq!(mailboxes[0].owner, "Alice Example");
        assert_eq!(mailboxes[0].message_count, 1);
        assert_eq!(mailboxes[0].folder_count, 1);
        assert_eq!(mailboxes[0].attachment_count, 0);
    }

    #[test]
    fn test_missing_message_table() {
        let db = database();
        let result = MailboxReader::open(&db, 99);
        assert!(matches!(result, Err(ExtractError::MissingTable(name)) if name == "Message_99"));
    }

    #[test]
    fn test_missing_required_column() {
        let mut db = MemoryDatabase::new();
        db.insert_table("Message_1", MemoryTable::new(&["MessageDocumentId"]));
        let result = MailboxReader::open(&db, 1);
        assert!(matches!(
            result,
            Err(ExtractError::MissingColumn { column, .. }) if column == "FolderId"
        ));
    }

    #[test]
    fn test_extract_all_with_progress() {
        let db = database();
        let reader = MailboxReader::open(&db, 1).unwrap();
        let extractor = MessageExtractor::new(ExtractorConfig::default());

        let mut events = Vec::new();
        let mut callback = |event: &ProgressEvent| events.push(event.clone());
        let messages = reader.extract_all(&extractor, Some(&mut callback));

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].folder_path, "Inbox");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProgressEvent::Message { index: 0, total: 1 }));
    }
}
