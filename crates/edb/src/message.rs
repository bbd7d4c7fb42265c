//! The normalized message record produced by extraction, independent of both
//! the EDB row layout and the PST object model, plus the calendar and
//! contact views selected by message class.

use chrono::{DateTime, Duration, Utc};

use crate::propblob;

/// `Importance` column values.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    pub fn from_column(value: i64) -> Self {
        match value {
            0 => Self::Low,
            2 => Self::High,
            _ => Self::Normal,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
        }
    }
}

/// `Sensitivity` column values.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Sensitivity {
    #[default]
    Normal,
    Personal,
    Private,
    Confidential,
}

impl Sensitivity {
    pub fn from_column(value: i64) -> Self {
        match value {
            1 => Self::Personal,
            2 => Self::Private,
            3 => Self::Confidential,
            _ => Self::Normal,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Normal => 0,
            Self::Personal => 1,
            Self::Private => 2,
            Self::Confidential => 3,
        }
    }

    pub fn header_value(&self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Personal => Some("Personal"),
            Self::Private => Some("Private"),
            Self::Confidential => Some("Company-Confidential"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

#[derive(Clone, Debug)]
pub struct Recipient {
    pub display_name: String,
    pub smtp_address: String,
    pub kind: RecipientKind,
}

#[derive(Clone, Debug, Default)]
pub struct MailAttachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub is_inline: bool,
    pub content_id: String,
}

impl MailAttachment {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// The broad kind of a mail object, decided by its (decompressed) message
/// class.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MessageKind {
    Note,
    Appointment,
    Contact,
}

/// One extracted message. String fields are empty (never placeholders) when
/// nothing decodable was found.
#[derive(Clone, Debug, Default)]
pub struct MailMessage {
    pub record_index: usize,
    pub message_document_id: u32,
    pub folder_id: Vec<u8>,
    pub folder_path: String,
    pub message_class: String,
    pub message_id: String,

    pub subject: String,
    pub sender_name: String,
    pub sender_email: String,
    pub recipients: Vec<Recipient>,

    pub date_sent: Option<DateTime<Utc>>,
    pub date_received: Option<DateTime<Utc>>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_last_modified: Option<DateTime<Utc>>,

    pub body_text: String,
    pub body_html: String,

    pub is_read: bool,
    pub has_attachments: bool,
    pub is_hidden: bool,
    pub has_error: bool,
    pub importance: Importance,
    pub sensitivity: Sensitivity,

    pub attachments: Vec<MailAttachment>,

    /// Raw PropertyBlob kept for the calendar/contact views and debugging.
    pub property_blob: Vec<u8>,
}

impl MailMessage {
    pub fn message_class(&self) -> &str {
        if self.message_class.is_empty() {
            "IPM.Note"
        } else {
            &self.message_class
        }
    }

    /// The view kind, decided by the first decodable message class.
    pub fn kind(&self) -> MessageKind {
        let class = self.message_class();
        if class.starts_with("IPM.Appointment") || class.starts_with("IPM.Schedule.Meeting") {
            MessageKind::Appointment
        } else if class.starts_with("IPM.Contact") {
            MessageKind::Contact
        } else {
            MessageKind::Note
        }
    }

    pub fn recipients_of_kind(&self, kind: RecipientKind) -> impl Iterator<Item = &Recipient> {
        self.recipients.iter().filter(move |recipient| recipient.kind == kind)
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventAttendee {
    pub name: String,
    pub email: String,
}

/// Calendar view over a record whose class is `IPM.Appointment` or
/// `IPM.Schedule.Meeting.*`.
#[derive(Clone, Debug, Default)]
pub struct EventView {
    pub uid: String,
    pub subject: String,
    pub description: String,
    pub location: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub organizer_name: String,
    pub organizer_email: String,
    pub attendees: Vec<EventAttendee>,
    pub is_recurring: bool,
    pub recurrence_rule: String,
    pub reminder_minutes: u32,
    pub importance: Importance,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub record_index: usize,
}

const LOCATION_MARKERS: [&[u8]; 3] = [b"Location", b"LOCATION", b"location"];

fn location_from_blob(blob: &[u8]) -> String {
    for marker in LOCATION_MARKERS {
        let Some(pos) = blob.windows(marker.len()).position(|window| window == marker) else {
            continue;
        };
        let start = pos + marker.len();
        let end = (start + 200).min(blob.len());
        let text: String = blob[start..end]
            .iter()
            .take_while(|&&byte| byte != 0)
            .filter(|&&byte| (0x20..0x7F).contains(&byte))
            .map(|&byte| byte as char)
            .collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.chars().take(100).collect();
        }
    }
    String::new()
}

fn attendees_from_blob(blob: &[u8], skip_email: &str) -> Vec<EventAttendee> {
    let text = String::from_utf8_lossy(blob);
    let mut attendees = Vec::new();
    let mut seen = Vec::new();

    for token in text.split(|c: char| !(c.is_ascii_alphanumeric() || "@.-_".contains(c))) {
        if attendees.len() == 10 {
            break;
        }
        let Some(at) = token.find('@') else { continue };
        if at == 0 || at + 1 >= token.len() || !token[at + 1..].contains('.') {
            continue;
        }
        if token == skip_email || seen.contains(&token.to_string()) {
            continue;
        }
        seen.push(token.to_string());
        attendees.push(EventAttendee { name: String::new(), email: token.to_string() });
    }
    attendees
}

impl EventView {
    /// Project a calendar view from an appointment/meeting record. The start
    /// time falls back to the sent time with a one-hour default duration.
    pub fn from_message(message: &MailMessage) -> Self {
        let start_time = message.date_sent.or(message.date_received);
        let end_time = start_time.map(|start| start + Duration::hours(1));

        Self {
            uid: if message.message_id.is_empty() {
                format!("{}@exchange.local", message.record_index)
            } else {
                message.message_id.trim_matches(&['<', '>'][..]).to_string()
            },
            subject: message.subject.clone(),
            description: message.body_text.clone(),
            location: location_from_blob(&message.property_blob),
            start_time,
            end_time,
            organizer_name: message.sender_name.clone(),
            organizer_email: message.sender_email.clone(),
            attendees: attendees_from_blob(&message.property_blob, &message.sender_email),
            is_recurring: false,
            recurrence_rule: String::new(),
            reminder_minutes: 0,
            importance: message.importance,
            created: message.date_created,
            modified: message.date_last_modified,
            record_index: message.record_index,
        }
    }
}

/// Contact view over an `IPM.Contact` record.
#[derive(Clone, Debug, Default)]
pub struct ContactView {
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub job_title: String,
    pub record_index: usize,
}

fn phone_from_blob(blob: &[u8]) -> String {
    let text = propblob::extract_printable(blob);
    let mut digits = 0;
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_ascii_digit() {
            digits += 1;
            start.get_or_insert(i);
        } else if matches!(c, '+' | '-' | ' ' | '(' | ')') && start.is_some() {
            continue;
        } else {
            if digits >= 7 {
                let run_start = start.unwrap_or(0);
                return text[run_start..i].trim().to_string();
            }
            digits = 0;
            start = None;
        }
    }
    if digits >= 7 {
        if let Some(run_start) = start {
            return text[run_start..].trim().to_string();
        }
    }
    String::new()
}

impl ContactView {
    pub fn from_message(message: &MailMessage) -> Self {
        let email = if message.sender_email.is_empty() {
            attendees_from_blob(&message.property_blob, "")
                .first()
                .map(|attendee| attendee.email.clone())
                .unwrap_or_default()
        } else {
            message.sender_email.clone()
        };

        Self {
            display_name: if message.sender_name.is_empty() {
                message.subject.clone()
            } else {
                message.sender_name.clone()
            },
            email,
            phone: phone_from_blob(&message.property_blob),
            company: String::new(),
            job_title: String::new(),
            record_index: message.record_index,
        }
    }
}
