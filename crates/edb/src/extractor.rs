//! Per-row message extraction from a `Message_<mailbox>` table.
//!
//! One pass per record: plain columns, LZXPRESS-decoded message class,
//! PropertyBlob heuristics, NativeBody decoding with HTML stripping, an
//! RFC 5322 header override when the original Internet headers survived, and
//! attachment resolution through the sub-objects index. A failure never
//! escapes a single message: the record is kept as an error stub.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use codepage_strings::Coding;
use mail_parser::{Address, MessageParser};
use tracing::{debug, warn};

use crate::ese::{ColumnMap, EseRecord, EseTable};
use crate::filetime::filetime_from_bytes;
use crate::lzxpress;
use crate::message::{
    Importance, MailAttachment, MailMessage, Recipient, RecipientKind, Sensitivity,
};
use crate::propblob;

/// Windows codepages tried after UTF-8: Cyrillic ANSI, KOI8-R, Latin-1.
const FALLBACK_CODEPAGES: [u16; 3] = [1251, 20866, 28591];

/// Explicit knobs for what used to be module-level fallbacks: the mailbox
/// owner used when no sender decodes, the SMTP domain for synthesized
/// addresses (empty disables synthesis entirely), and decoder switches.
#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub mailbox_owner: String,
    /// Domain for addresses synthesized from display names. When empty, no
    /// address is ever invented and undecodable senders stay empty.
    pub smtp_domain: String,
    /// Scan PropertyBlob printable runs when NativeBody yields no body.
    pub blob_body_fallback: bool,
    /// Log raw blobs at debug level for corpus analysis.
    pub debug_dump: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mailbox_owner: String::new(),
            smtp_domain: String::new(),
            blob_body_fallback: true,
            debug_dump: false,
        }
    }
}

pub struct MessageExtractor {
    config: ExtractorConfig,
}

impl MessageExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Whether `data` looks like ciphertext or binary rather than text.
    pub fn is_encrypted(&self, data: &[u8]) -> bool {
        if data.len() < 2 {
            return false;
        }
        let control = data
            .iter()
            .filter(|&&byte| byte < 32 && !matches!(byte, 9 | 10 | 13))
            .count();
        let high = data.iter().filter(|&&byte| byte >= 128).count();

        (data[0] < 32 && high > 0) || control * 10 > data.len() * 3
    }

    /// Decode column bytes as text: UTF-16LE when the byte pattern suggests
    /// it, then UTF-8, then the legacy codepages. The UTF-16 attempt comes
    /// before the ciphertext gate: its interleaved NULs read as "binary" to
    /// the byte statistics.
    pub fn try_decode(&self, data: &[u8]) -> String {
        if data.is_empty() {
            return String::new();
        }

        if data.len() >= 4 && data[1] == 0 && data[3] == 0 {
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            if let Ok(text) = String::from_utf16(&units) {
                let text = text.trim_end_matches('\0');
                if !text.is_empty()
                    && text.chars().all(|c| !c.is_control() || c.is_whitespace())
                {
                    return text.to_string();
                }
            }
        }

        if self.is_encrypted(data) {
            return String::new();
        }

        if let Ok(text) = std::str::from_utf8(data) {
            return text.trim_end_matches('\0').to_string();
        }

        for codepage in FALLBACK_CODEPAGES {
            let Ok(coding) = Coding::new(codepage) else {
                continue;
            };
            if let Ok(text) = coding.decode(data) {
                let printable = text
                    .chars()
                    .filter(|c| !c.is_control() || c.is_whitespace())
                    .count();
                if printable * 10 >= text.chars().count() * 8 {
                    return text.trim_end_matches('\0').to_string();
                }
            }
        }

        String::new()
    }

    fn get_bytes(&self, record: &dyn EseRecord, cols: &ColumnMap, name: &str) -> Option<Vec<u8>> {
        record.raw(cols.get(name)?)
    }

    fn get_int(&self, record: &dyn EseRecord, cols: &ColumnMap, name: &str) -> Option<i64> {
        let bytes = self.get_bytes(record, cols, name)?;
        match bytes.len() {
            1 => Some(i64::from(bytes[0])),
            2 => Some(i64::from(u16::from_le_bytes([bytes[0], bytes[1]]))),
            4 => Some(i64::from(u32::from_le_bytes(bytes[..4].try_into().ok()?))),
            8 => Some(u64::from_le_bytes(bytes[..8].try_into().ok()?) as i64),
            _ => None,
        }
    }

    fn get_bool(&self, record: &dyn EseRecord, cols: &ColumnMap, name: &str) -> bool {
        self.get_bytes(record, cols, name)
            .is_some_and(|bytes| bytes.iter().any(|&byte| byte != 0))
    }

    fn get_string(&self, record: &dyn EseRecord, cols: &ColumnMap, name: &str) -> String {
        self.get_bytes(record, cols, name)
            .map(|bytes| self.try_decode(&bytes))
            .unwrap_or_default()
    }

    fn get_filetime(
        &self,
        record: &dyn EseRecord,
        cols: &ColumnMap,
        name: &str,
    ) -> Option<DateTime<Utc>> {
        filetime_from_bytes(&self.get_bytes(record, cols, name)?)
    }

    fn get_long_value(
        &self,
        record: &dyn EseRecord,
        cols: &ColumnMap,
        name: &str,
    ) -> Option<Vec<u8>> {
        let column = cols.get(name)?;
        if record.is_long_value(column) {
            record.long_value(column)
        } else {
            record.raw(column)
        }
    }

    /// Decode the (possibly LZXPRESS-framed) `MessageClass` column.
    fn decode_message_class(&self, record: &dyn EseRecord, cols: &ColumnMap) -> String {
        let Some(raw) = self.get_bytes(record, cols, "MessageClass") else {
            return String::new();
        };
        let decompressed = lzxpress::decompress(&raw);
        let text = self.try_decode(&decompressed);
        if !text.is_empty() {
            return text;
        }
        // Class names are plain ASCII; salvage printable content directly.
        let salvaged = propblob::extract_printable(&decompressed);
        if salvaged.starts_with("IPM.") {
            salvaged
        } else {
            String::new()
        }
    }

    /// Extract one message. Never fails: undecodable steps leave fields
    /// empty, and an unrecoverable record becomes an `[ERROR]` stub.
    pub fn extract_message(
        &self,
        record: &dyn EseRecord,
        cols: &ColumnMap,
        record_index: usize,
        attachments: Option<&AttachmentIndex<'_>>,
    ) -> MailMessage {
        let mut message = MailMessage {
            record_index,
            ..Default::default()
        };

        message.property_blob = self
            .get_bytes(record, cols, "PropertyBlob")
            .unwrap_or_default();
        if self.config.debug_dump && !message.property_blob.is_empty() {
            debug!(
                record_index,
                blob_len = message.property_blob.len(),
                "property blob"
            );
        }

        message.message_document_id = self
            .get_int(record, cols, "MessageDocumentId")
            .unwrap_or(0) as u32;
        message.folder_id = self.get_bytes(record, cols, "FolderId").unwrap_or_default();

        message.date_received = self.get_filetime(record, cols, "DateReceived");
        message.date_sent = self.get_filetime(record, cols, "DateSent");
        message.date_created = self.get_filetime(record, cols, "DateCreated");
        message.date_last_modified = self.get_filetime(record, cols, "LastModificationTime");

        message.is_read = self.get_bool(record, cols, "IsRead");
        message.is_hidden = self.get_bool(record, cols, "IsHidden");
        message.has_attachments = self.get_bool(record, cols, "HasAttachments");
        message.importance =
            Importance::from_column(self.get_int(record, cols, "Importance").unwrap_or(1));
        message.sensitivity =
            Sensitivity::from_column(self.get_int(record, cols, "Sensitivity").unwrap_or(0));

        message.message_class = self.decode_message_class(record, cols);

        if !message.property_blob.is_empty() {
            message.sender_name = propblob::extract_sender(&message.property_blob);
            message.subject = propblob::extract_subject(&message.property_blob, &message.sender_name);
            message.message_id = propblob::extract_message_id(&message.property_blob);
        }

        // A sender identical to the subject is a misidentified marker hit.
        if !message.sender_name.is_empty()
            && message.sender_name.eq_ignore_ascii_case(&message.subject)
        {
            message.sender_name.clear();
        }
        if message.sender_name.is_empty() {
            message.sender_name = self.config.mailbox_owner.clone();
        }
        message.sender_email = self.synthesize_address(&message.sender_name);

        let mut display_to = self.get_string(record, cols, "DisplayTo");
        if !display_to.is_empty() && display_to.eq_ignore_ascii_case(&message.subject) {
            display_to.clear();
        }
        if !display_to.is_empty() {
            message.recipients.push(Recipient {
                smtp_address: self.synthesize_address(&display_to),
                display_name: display_to,
                kind: RecipientKind::To,
            });
        } else if !message.sender_name.is_empty() {
            // Self-addressed fallback keeps the EML/PST recipient table
            // non-empty for drafts and system mail.
            message.recipients.push(Recipient {
                display_name: message.sender_name.clone(),
                smtp_address: message.sender_email.clone(),
                kind: RecipientKind::To,
            });
        }

        self.extract_body(record, cols, &mut message);
        self.apply_internet_headers(&mut message);

        if message.has_attachments {
            if let Some(index) = attachments {
                let subobjects = self.get_long_value(record, cols, "SubobjectsBlob");
                message.attachments =
                    index.resolve(subobjects.as_deref(), message.message_document_id);
                if message.attachments.is_empty() {
                    warn!(record_index, "attachments flagged but none resolved");
                }
            }
        }

        message
    }

    /// Build an error stub for a record whose extraction went unrecoverably
    /// wrong; the export continues with the next row.
    pub fn error_stub(&self, record_index: usize) -> MailMessage {
        MailMessage {
            record_index,
            subject: format!("[Failed to decode record {record_index}]"),
            has_error: true,
            ..Default::default()
        }
    }

    fn synthesize_address(&self, display_name: &str) -> String {
        if display_name.is_empty() || self.config.smtp_domain.is_empty() {
            return String::new();
        }
        let local: String = display_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        if local.is_empty() {
            return String::new();
        }
        format!("{local}@{}", self.config.smtp_domain)
    }

    fn extract_body(&self, record: &dyn EseRecord, cols: &ColumnMap, message: &mut MailMessage) {
        if let Some(native_body) = self.get_long_value(record, cols, "NativeBody") {
            if native_body.len() >= 7 {
                let decoded = lzxpress::decompress(&native_body);
                if !decoded.is_empty() {
                    let text = String::from_utf8_lossy(&decoded);
                    if looks_like_html(&text) {
                        message.body_html = text.into_owned();
                        message.body_text = html_to_text(&message.body_html);
                    } else {
                        message.body_text = text.into_owned();
                    }
                }
            }
        }

        if message.body_text.is_empty()
            && self.config.blob_body_fallback
            && !message.property_blob.is_empty()
        {
            message.body_text = propblob::printable_runs(&message.property_blob, 10, 5);
        }
    }

    /// Exchange sometimes carries the original Internet headers verbatim in
    /// the body; when a `From:`/`To:` block appears near the top, it is more
    /// trustworthy than the blob heuristics.
    fn apply_internet_headers(&self, message: &mut MailMessage) {
        let head: Vec<&str> = message.body_text.lines().take(50).collect();
        let has_from = head.iter().any(|line| line.starts_with("From:"));
        let has_to = head.iter().any(|line| line.starts_with("To:"));
        if !has_from || !has_to {
            return;
        }

        let block = head.join("\r\n") + "\r\n\r\n";
        let Some(parsed) = MessageParser::default().parse(block.as_bytes()) else {
            return;
        };

        if let Some(from) = parsed.from().and_then(Address::first) {
            if let Some(address) = from.address.as_deref() {
                message.sender_email = address.to_string();
            }
            if let Some(name) = from.name.as_deref() {
                message.sender_name = name.to_string();
            }
        }

        if let Some(to) = parsed.to() {
            let overrides: Vec<Recipient> = to
                .iter()
                .filter_map(|addr| {
                    let address = addr.address.as_deref()?;
                    Some(Recipient {
                        display_name: addr.name.as_deref().unwrap_or_default().to_string(),
                        smtp_address: address.to_string(),
                        kind: RecipientKind::To,
                    })
                })
                .collect();
            if !overrides.is_empty() {
                message
                    .recipients
                    .retain(|recipient| recipient.kind != RecipientKind::To);
                message.recipients.extend(overrides);
            }
        }
    }
}

/// Result of decoding a `SubobjectsBlob` column.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SubobjectsIndex {
    /// Attachment Inids in order of appearance.
    Inids(Vec<u32>),
    /// No usable markers; resolve through `MessageDocumentId` instead.
    Fallback,
}

/// Parse a SubobjectsBlob: decompress when framed, then collect the Inid
/// byte after each `0x21` tag. Decode failures land on the fallback path,
/// never an error.
pub fn parse_subobjects(blob: &[u8]) -> SubobjectsIndex {
    if blob.is_empty() {
        return SubobjectsIndex::Fallback;
    }

    let data = if lzxpress::is_compressed_stream(blob) {
        lzxpress::decompress(blob)
    } else {
        blob.to_vec()
    };

    let mut inids = Vec::new();
    let mut i = 0;
    while i + 1 < data.len() {
        if data[i] == 0x21 {
            inids.push(u32::from(data[i + 1]));
            i += 2;
        } else {
            i += 1;
        }
    }

    if inids.is_empty() {
        SubobjectsIndex::Fallback
    } else {
        SubobjectsIndex::Inids(inids)
    }
}

/// Pre-built lookup over an `Attachment_<mailbox>` table: `Inid` → row and
/// `MessageDocumentId` → rows.
pub struct AttachmentIndex<'a> {
    table: &'a dyn EseTable,
    cols: ColumnMap,
    by_inid: HashMap<u32, usize>,
    by_document_id: HashMap<u32, Vec<usize>>,
}

impl<'a> AttachmentIndex<'a> {
    pub fn build(table: &'a dyn EseTable) -> Self {
        let cols = ColumnMap::for_table(table);
        let mut by_inid = HashMap::new();
        let mut by_document_id: HashMap<u32, Vec<usize>> = HashMap::new();

        for index in 0..table.record_count() {
            let Some(record) = table.record(index) else {
                continue;
            };
            if let Some(bytes) = cols.get("Inid").and_then(|column| record.raw(column)) {
                if bytes.len() >= 4 {
                    let inid = u32::from_le_bytes(bytes[..4].try_into().unwrap_or_default());
                    by_inid.insert(inid, index);
                }
            }
            if let Some(bytes) = cols
                .get("MessageDocumentId")
                .and_then(|column| record.raw(column))
            {
                if bytes.len() >= 4 {
                    let document_id =
                        u32::from_le_bytes(bytes[..4].try_into().unwrap_or_default());
                    by_document_id.entry(document_id).or_default().push(index);
                }
            }
        }

        Self { table, cols, by_inid, by_document_id }
    }

    /// Resolve a message's attachments: Inids from the SubobjectsBlob when
    /// they decode, the `MessageDocumentId` map otherwise. Duplicate
    /// filenames are dropped.
    pub fn resolve(&self, subobjects: Option<&[u8]>, document_id: u32) -> Vec<MailAttachment> {
        let rows: Vec<usize> = match subobjects.map(parse_subobjects) {
            Some(SubobjectsIndex::Inids(inids)) => inids
                .iter()
                .filter_map(|inid| self.by_inid.get(inid).copied())
                .collect(),
            _ => self
                .by_document_id
                .get(&document_id)
                .cloned()
                .unwrap_or_default(),
        };

        let mut attachments = Vec::new();
        let mut seen_names = Vec::new();

        for row in rows {
            let Some(record) = self.table.record(row) else {
                continue;
            };
            let Some(data) = self.read_content(record.as_ref()) else {
                continue;
            };

            let blob = self
                .cols
                .get("PropertyBlob")
                .and_then(|column| record.raw(column))
                .unwrap_or_default();
            let mut filename = propblob::extract_attachment_filename(&blob);
            if filename.is_empty() {
                filename = format!("attachment_{row}.bin");
            }
            if seen_names.contains(&filename) {
                continue;
            }
            seen_names.push(filename.clone());

            let mut mime_type = propblob::extract_content_type(&blob);
            if mime_type.is_empty() {
                mime_type = "application/octet-stream".into();
            }

            attachments.push(MailAttachment {
                filename,
                mime_type,
                data,
                is_inline: false,
                content_id: String::new(),
            });
        }

        attachments
    }

    /// Read the `Content` column, following the long-value reference when
    /// the inline cell is just a 4-byte pointer.
    fn read_content(&self, record: &dyn EseRecord) -> Option<Vec<u8>> {
        let column = self.cols.get("Content")?;
        let raw = record.raw(column)?;
        if raw.len() == 4 && record.is_long_value(column) {
            return record.long_value(column);
        }
        if raw.is_empty() {
            return None;
        }
        Some(raw)
    }
}

fn looks_like_html(text: &str) -> bool {
    let lowered = text.trim_start().to_lowercase();
    lowered.starts_with("<!doctype") || lowered.starts_with("<html") || lowered.contains("<body")
}

/// Strip tags to plain text: script/style blocks dropped, entities decoded,
/// whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let mut stripped = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        stripped.push_str(&rest[..open]);
        let tail = &rest[open..];
        // ASCII-only lowering keeps byte offsets aligned with `tail`.
        let lowered = tail.to_ascii_lowercase();
        let close = if lowered.starts_with("<script") {
            lowered.find("</script>").map(|end| end + "</script>".len())
        } else if lowered.starts_with("<style") {
            lowered.find("</style>").map(|end| end + "</style>".len())
        } else if lowered.starts_with("<!--") {
            lowered.find("-->").map(|end| end + 3)
        } else {
            tail.find('>').map(|end| end + 1)
        };
        match close {
            Some(end) => {
                stripped.push(' ');
                rest = &tail[end..];
            }
            None => {
                rest = "";
            }
        }
    }
    stripped.push_str(rest);

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ese::{MemoryTable, MemoryValue};

    fn extractor() -> MessageExtractor {
        MessageExtractor::new(ExtractorConfig::default())
    }

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
    }

    #[test]
    fn test_try_decode_utf16() {
        assert_eq!(extractor().try_decode(&utf16("IPM.Note\0")), "IPM.Note");
    }

    #[test]
    fn test_try_decode_utf8() {
        assert_eq!(extractor().try_decode(b"Alice Example"), "Alice Example");
    }

    #[test]
    fn test_try_decode_rejects_binary() {
        let data = [0x01, 0x88, 0x99, 0xAA, 0x02, 0x03];
        assert_eq!(extractor().try_decode(&data), "");
    }

    #[test]
    fn test_parse_subobjects_markers() {
        let blob = [0x05, 0x00, 0x21, 0x03, 0xFF, 0x21, 0x07];
        assert_eq!(parse_subobjects(&blob), SubobjectsIndex::Inids(vec![3, 7]));
    }

    #[test]
    fn test_parse_subobjects_fallback() {
        assert_eq!(parse_subobjects(&[]), SubobjectsIndex::Fallback);
        assert_eq!(parse_subobjects(&[0x05, 0x00, 0x01]), SubobjectsIndex::Fallback);
    }

    #[test]
    fn test_html_to_text() {
        let html = "<html><body><p>Hello &amp; welcome</p><script>x()</script>\
                    <p>Second &nbsp;line</p></body></html>";
        assert_eq!(html_to_text(html), "Hello & welcome Second line");
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<html><body>x</body></html>"));
        assert!(looks_like_html("  <!DOCTYPE html><p>x</p>"));
        assert!(!looks_like_html("plain text with < signs"));
    }

    fn message_table() -> (MemoryTable, Vec<u8>) {
        let mut blob = vec![0u8; 20];
        blob.push(b'M');
        blob.push(13);
        blob.extend_from_slice(b"Rosetta Stone");
        blob.push(b'M');
        blob.push(16);
        blob.extend_from_slice(b"Quarterly report");
        blob.extend_from_slice(&[0u8; 24]);

        let mut table = MemoryTable::new(&[
            "MessageDocumentId",
            "FolderId",
            "DateReceived",
            "DateSent",
            "IsRead",
            "IsHidden",
            "HasAttachments",
            "Importance",
            "Sensitivity",
            "MessageClass",
            "DisplayTo",
            "PropertyBlob",
            "NativeBody",
            "SubobjectsBlob",
        ]);
        let mut native_body = vec![0x18, 0x20, 0x00, 0, 0, 0, 0];
        native_body.extend_from_slice(b"The body of the message follows.");
        table.push_row(&[
            ("MessageDocumentId", MemoryValue::Inline(42_u32.to_le_bytes().to_vec())),
            ("FolderId", MemoryValue::Inline(vec![0x01, 0x02, 0x03, 0x04])),
            (
                "DateReceived",
                MemoryValue::Inline(0x01D7_06E5_0000_0000_u64.to_le_bytes().to_vec()),
            ),
            ("IsRead", MemoryValue::Inline(vec![1])),
            ("Importance", MemoryValue::Inline(2_u32.to_le_bytes().to_vec())),
            ("MessageClass", MemoryValue::Inline(utf16("IPM.Note\0"))),
            ("DisplayTo", MemoryValue::Inline(utf16("Bob Carter"))),
            ("PropertyBlob", MemoryValue::Inline(blob.clone())),
            ("NativeBody", MemoryValue::LongValue(native_body)),
        ]);
        (table, blob)
    }

    #[test]
    fn test_extract_message_fields() {
        let (table, _) = message_table();
        let cols = ColumnMap::for_table(&table);
        let record = table.record(0).unwrap();

        let message = extractor().extract_message(record.as_ref(), &cols, 0, None);

        assert_eq!(message.message_document_id, 42);
        assert_eq!(message.message_class, "IPM.Note");
        assert_eq!(message.sender_name, "Rosetta Stone");
        assert_eq!(message.subject, "Quarterly report");
        assert!(message.is_read);
        assert_eq!(message.importance, Importance::High);
        assert_eq!(message.date_received.unwrap().timestamp(), 1_613_755_864);
        assert_eq!(message.body_text, "The body of the message follows.");
        assert_eq!(message.recipients.len(), 1);
        assert_eq!(message.recipients[0].display_name, "Bob Carter");
        // No SMTP domain configured: no synthesized addresses.
        assert_eq!(message.sender_email, "");
        assert_eq!(message.recipients[0].smtp_address, "");
    }

    #[test]
    fn test_smtp_domain_synthesis() {
        let (table, _) = message_table();
        let cols = ColumnMap::for_table(&table);
        let record = table.record(0).unwrap();

        let extractor = MessageExtractor::new(ExtractorConfig {
            smtp_domain: "recovered.example".into(),
            ..Default::default()
        });
        let message = extractor.extract_message(record.as_ref(), &cols, 0, None);
        assert_eq!(message.sender_email, "rosettastone@recovered.example");
        assert_eq!(message.recipients[0].smtp_address, "bobcarter@recovered.example");
    }

    #[test]
    fn test_internet_header_override() {
        let mut message = MailMessage {
            sender_name: "Wrong Sender".into(),
            body_text: "From: Real Sender <real@example.org>\nTo: dest@example.org\n\nBody".into(),
            recipients: vec![Recipient {
                display_name: "Wrong".into(),
                smtp_address: "wrong@example.org".into(),
                kind: RecipientKind::To,
            }],
            ..Default::default()
        };
        extractor().apply_internet_headers(&mut message);

        assert_eq!(message.sender_name, "Real Sender");
        assert_eq!(message.sender_email, "real@example.org");
        assert_eq!(message.recipients.len(), 1);
        assert_eq!(message.recipients[0].smtp_address, "dest@example.org");
    }

    #[test]
    fn test_error_stub() {
        let stub = extractor().error_stub(17);
        assert!(stub.has_error);
        assert_eq!(stub.subject, "[Failed to decode record 17]");
    }

    fn attachment_table() -> MemoryTable {
        let mut table = MemoryTable::new(&["Inid", "MessageDocumentId", "Content", "PropertyBlob"]);
        let mut blob = vec![0u8; 4];
        blob.extend_from_slice(b"notes.txt");
        blob.extend_from_slice(b"\x00text/plain\x00");
        table.push_row(&[
            ("Inid", MemoryValue::Inline(3_u32.to_le_bytes().to_vec())),
            ("MessageDocumentId", MemoryValue::Inline(42_u32.to_le_bytes().to_vec())),
            ("Content", MemoryValue::LongValue(b"attachment payload".to_vec())),
            ("PropertyBlob", MemoryValue::Inline(blob)),
        ]);
        table
    }

    #[test]
    fn test_attachment_resolution_by_inid() {
        let table = attachment_table();
        let index = AttachmentIndex::build(&table);
        let subobjects = [0x00, 0x21, 0x03];

        let attachments = index.resolve(Some(&subobjects), 0);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename, "notes.txt");
        assert_eq!(attachments[0].mime_type, "text/plain");
        assert_eq!(attachments[0].data, b"attachment payload");
    }

    #[test]
    fn test_attachment_resolution_fallback() {
        let table = attachment_table();
        let index = AttachmentIndex::build(&table);

        // No 0x21 markers: the MessageDocumentId map takes over.
        let attachments = index.resolve(Some(&[0x00, 0x01]), 42);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename, "notes.txt");
    }
}
