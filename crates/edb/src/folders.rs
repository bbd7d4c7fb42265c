//! Folder hierarchy resolution over a `Folder_<mailbox>` table.
//!
//! Each folder row carries its `FolderId`, `ParentFolderId`, an optional
//! `SpecialFolderNumber`, and a (frequently undecodable) `DisplayName`. The
//! resolver indexes the table once and answers name and root-first path
//! queries; parent chains are cycle-guarded.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ese::{ColumnMap, EseTable};

/// Well-known `SpecialFolderNumber` names (Exchange 2013+).
pub const SPECIAL_FOLDER_NAMES: [&str; 28] = [
    "Hidden Items",
    "Root",
    "Spooler Queue",
    "Shortcuts",
    "Finder",
    "Views",
    "Common Views",
    "Schedule",
    "Junk Email",
    "IPM Subtree",
    "Inbox",
    "Outbox",
    "Sent Items",
    "Deleted Items",
    "Contacts",
    "Calendar",
    "Drafts",
    "Journal",
    "Notes",
    "Tasks",
    "Recoverable Items",
    "Deletions",
    "Versions",
    "Purges",
    "Sync Issues",
    "Conflicts",
    "Local Failures",
    "Server Failures",
];

/// `SpecialFolderNumber` of the Sent Items folder, used for mailbox-owner
/// inference.
pub const SPECIAL_FOLDER_SENT_ITEMS: u32 = 12;

#[derive(Clone, Debug, Default)]
pub struct FolderInfo {
    pub parent_id: Option<Vec<u8>>,
    pub special_number: Option<u32>,
    pub display_name: Option<String>,
}

#[derive(Default)]
pub struct FolderResolver {
    folders: HashMap<Vec<u8>, FolderInfo>,
}

/// Decode a `DisplayName` cell, which is UTF-16LE when it decodes at all.
fn decode_display_name(bytes: &[u8]) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units).ok()?;
    let text = text.trim_end_matches('\0');
    if !text.is_empty() && text.chars().all(|c| !c.is_control() || c.is_whitespace()) {
        Some(text.to_string())
    } else {
        None
    }
}

impl FolderResolver {
    /// Index a `Folder_<mailbox>` table in one pass.
    pub fn from_table(table: &dyn EseTable) -> Self {
        let cols = ColumnMap::for_table(table);
        let mut folders = HashMap::new();

        for index in 0..table.record_count() {
            let Some(record) = table.record(index) else {
                continue;
            };
            let Some(folder_id) = cols.get("FolderId").and_then(|column| record.raw(column))
            else {
                continue;
            };

            let parent_id = cols.get("ParentFolderId").and_then(|column| record.raw(column));
            let special_number = cols
                .get("SpecialFolderNumber")
                .and_then(|column| record.raw(column))
                .filter(|bytes| bytes.len() >= 4)
                .map(|bytes| u32::from_le_bytes(bytes[..4].try_into().unwrap_or_default()));
            let display_name = cols
                .get("DisplayName")
                .and_then(|column| record.raw(column))
                .as_deref()
                .and_then(decode_display_name);

            folders.insert(folder_id, FolderInfo { parent_id, special_number, display_name });
        }

        debug!(folders = folders.len(), "indexed folder table");
        Self { folders }
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn info(&self, folder_id: &[u8]) -> Option<&FolderInfo> {
        self.folders.get(folder_id)
    }

    pub fn folder_ids(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.folders.keys()
    }

    /// The display name of a folder: its special-folder name first, then the
    /// decoded display name, then a stable fallback derived from the last
    /// two bytes of its id.
    pub fn name_of(&self, folder_id: &[u8]) -> String {
        if let Some(info) = self.folders.get(folder_id) {
            if let Some(special) = info.special_number {
                if let Some(name) = SPECIAL_FOLDER_NAMES.get(special as usize) {
                    return (*name).to_string();
                }
            }
            if let Some(name) = &info.display_name {
                return name.clone();
            }
        }
        let tail = folder_id
            .iter()
            .rev()
            .take(2)
            .rev()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        format!("Folder_{tail}")
    }

    /// The root-first `/`-joined path of a folder, climbing parent links
    /// with a visited set as the cycle guard.
    pub fn path_of(&self, folder_id: &[u8]) -> String {
        let mut parts = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(folder_id.to_vec());

        while let Some(id) = current {
            if !visited.insert(id.clone()) {
                break;
            }
            parts.push(self.name_of(&id));
            current = self
                .folders
                .get(&id)
                .and_then(|info| info.parent_id.clone())
                .filter(|parent| self.folders.contains_key(parent));
        }

        if parts.is_empty() {
            return "Unknown".to_string();
        }
        parts.reverse();
        parts.join("/")
    }

    /// Folder ids whose `SpecialFolderNumber` matches `special`.
    pub fn with_special_number(&self, special: u32) -> Vec<&Vec<u8>> {
        self.folders
            .iter()
            .filter(|(_, info)| info.special_number == Some(special))
            .map(|(id, _)| id)
            .collect()
    }
}
