//! ## [Messages](https://learn.microsoft.com/en-us/openspecs/office_file_formats/ms-pst/1042af37-aaa4-4edc-bffd-90a1ede24188)
//!
//! A message is one PC node whose sub-node index carries the recipient TC at
//! NID 0x692, the attachment TC at NID 0x671, and one PC per attachment.

use super::tags::*;
use super::*;
use crate::ltp::prop_context::{build_pc, PcNode};
use crate::ltp::prop_type::PropertyValue;
use crate::ltp::table_context::{build_tc, TableRow, TcNode};
use crate::ndb::{NodeId, NodeIdType};

/// Recipient kind, stored as `PidTagRecipientType`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
}

impl RecipientKind {
    pub fn mapi_type(&self) -> i32 {
        match self {
            Self::To => MAPI_TO,
            Self::Cc => MAPI_CC,
            Self::Bcc => MAPI_BCC,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecipientContent {
    pub display_name: String,
    pub email: String,
    pub kind: RecipientKind,
}

#[derive(Clone, Debug)]
pub struct AttachmentContent {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Everything the writer needs to materialize one message node. FILETIMEs
/// are raw; `None` means unset and is omitted from the PC.
#[derive(Clone, Debug, Default)]
pub struct MessageContent {
    pub subject: String,
    pub message_class: String,
    pub body_text: String,
    pub body_html: Vec<u8>,
    pub sender_name: String,
    pub sender_email: String,
    pub is_read: bool,
    pub importance: i32,
    pub priority: i32,
    pub sensitivity: i32,
    pub delivery_time: Option<u64>,
    pub submit_time: Option<u64>,
    pub recipients: Vec<RecipientContent>,
    pub attachments: Vec<AttachmentContent>,
}

impl MessageContent {
    pub fn message_class(&self) -> &str {
        if self.message_class.is_empty() {
            "IPM.Note"
        } else {
            &self.message_class
        }
    }

    pub fn flags(&self) -> i32 {
        let mut flags = 0;
        if self.is_read {
            flags |= MSGFLAG_READ;
        }
        if !self.attachments.is_empty() {
            flags |= MSGFLAG_HASATTACH;
        }
        flags
    }

    /// `PidTagMessageSize`: the body length in UTF-16 code units' bytes.
    pub fn size(&self) -> i32 {
        (self.body_text.encode_utf16().count() * 2) as i32
    }
}

/// Sub-node NID of the PC for 0-based attachment `index`.
pub fn attachment_subnode_nid(index: u32) -> NodeId {
    NodeId::from((index << 5) | NodeIdType::Attachment as u32)
}

/// Build the message PC. `timestamp` stamps the creation and modification
/// times and stands in for missing delivery/submit times.
pub fn build_message_pc(message: &MessageContent, timestamp: u64) -> MessagingResult<PcNode> {
    let mut properties = vec![
        (PID_TAG_SUBJECT, PropertyValue::Unicode(message.subject.clone())),
        (PID_TAG_NORMALIZED_SUBJECT, PropertyValue::Unicode(message.subject.clone())),
        (PID_TAG_MESSAGE_CLASS, PropertyValue::Unicode(message.message_class().into())),
        (PID_TAG_MESSAGE_FLAGS, PropertyValue::Integer32(message.flags())),
        (PID_TAG_MESSAGE_SIZE, PropertyValue::Integer32(message.size())),
        (PID_TAG_IMPORTANCE, PropertyValue::Integer32(message.importance)),
        (PID_TAG_PRIORITY, PropertyValue::Integer32(message.priority)),
        (PID_TAG_SENSITIVITY, PropertyValue::Integer32(message.sensitivity)),
        (PID_TAG_HASATTACH, PropertyValue::Boolean(!message.attachments.is_empty())),
        (PID_TAG_INTERNET_CPID, PropertyValue::Integer32(65001)),
        (PID_TAG_CREATION_TIME, PropertyValue::Time(timestamp)),
        (PID_TAG_LAST_MODIFICATION_TIME, PropertyValue::Time(timestamp)),
    ];

    let delivery_time = message.delivery_time.unwrap_or(timestamp);
    let submit_time = message.submit_time.unwrap_or(delivery_time);
    properties.push((PID_TAG_MESSAGE_DELIVERY_TIME, PropertyValue::Time(delivery_time)));
    properties.push((PID_TAG_CLIENT_SUBMIT_TIME, PropertyValue::Time(submit_time)));

    if !message.body_text.is_empty() {
        properties.push((PID_TAG_BODY, PropertyValue::Unicode(message.body_text.clone())));
    }
    if !message.body_html.is_empty() {
        properties.push((PID_TAG_HTML, PropertyValue::Binary(message.body_html.clone())));
    }

    if !message.sender_name.is_empty() {
        properties.push((PID_TAG_SENDER_NAME, PropertyValue::Unicode(message.sender_name.clone())));
        properties.push((
            PID_TAG_SENT_REPRESENTING_NAME,
            PropertyValue::Unicode(message.sender_name.clone()),
        ));
    }
    if !message.sender_email.is_empty() {
        properties.push((
            PID_TAG_SENDER_EMAIL_ADDRESS,
            PropertyValue::Unicode(message.sender_email.clone()),
        ));
        properties.push((PID_TAG_SENDER_ADDRTYPE, PropertyValue::Unicode("SMTP".into())));
        properties.push((
            PID_TAG_SENT_REPRESENTING_EMAIL,
            PropertyValue::Unicode(message.sender_email.clone()),
        ));
        properties.push((
            PID_TAG_SENT_REPRESENTING_ADDRTYPE,
            PropertyValue::Unicode("SMTP".into()),
        ));
    }

    Ok(build_pc(&properties)?)
}

/// Build the recipients TC carried at sub-node NID 0x692.
pub fn build_recipients_tc(recipients: &[RecipientContent]) -> MessagingResult<TcNode> {
    let columns = [
        PID_TAG_DISPLAY_NAME,
        PID_TAG_EMAIL_ADDRESS,
        PID_TAG_ADDRTYPE,
        PID_TAG_RECIPIENT_TYPE,
        PID_TAG_ROWID,
    ];

    let rows: Vec<_> = recipients
        .iter()
        .enumerate()
        .map(|(index, recipient)| {
            let display_name = if recipient.display_name.is_empty() {
                recipient.email.clone()
            } else {
                recipient.display_name.clone()
            };
            TableRow::new(index as u32)
                .set(PID_TAG_DISPLAY_NAME, PropertyValue::Unicode(display_name))
                .set(PID_TAG_EMAIL_ADDRESS, PropertyValue::Unicode(recipient.email.clone()))
                .set(PID_TAG_ADDRTYPE, PropertyValue::Unicode("SMTP".into()))
                .set(PID_TAG_RECIPIENT_TYPE, PropertyValue::Integer32(recipient.kind.mapi_type()))
                .set(PID_TAG_ROWID, PropertyValue::Integer32(index as i32))
        })
        .collect();

    Ok(build_tc(&columns, &rows)?)
}

/// Build the attachments TC carried at sub-node NID 0x671.
pub fn build_attachments_tc(attachments: &[AttachmentContent]) -> MessagingResult<TcNode> {
    let columns = [
        PID_TAG_ATTACH_NUM,
        PID_TAG_ATTACH_METHOD,
        PID_TAG_ATTACH_LONG_FILENAME,
        PID_TAG_ATTACH_SIZE,
        PID_TAG_ATTACH_MIME_TAG,
        PID_TAG_RENDERING_POSITION,
    ];

    let rows: Vec<_> = attachments
        .iter()
        .enumerate()
        .map(|(index, attachment)| {
            TableRow::new(index as u32)
                .set(PID_TAG_ATTACH_NUM, PropertyValue::Integer32(index as i32))
                .set(PID_TAG_ATTACH_METHOD, PropertyValue::Integer32(ATTACH_BY_VALUE))
                .set(
                    PID_TAG_ATTACH_LONG_FILENAME,
                    PropertyValue::Unicode(attachment.filename.clone()),
                )
                .set(PID_TAG_ATTACH_SIZE, PropertyValue::Integer32(attachment.data.len() as i32))
                .set(PID_TAG_ATTACH_MIME_TAG, PropertyValue::Unicode(attachment.mime_type.clone()))
                .set(PID_TAG_RENDERING_POSITION, PropertyValue::Integer32(-1))
        })
        .collect();

    Ok(build_tc(&columns, &rows)?)
}

/// Build the PC of one attachment, including its binary payload.
pub fn build_attachment_pc(attachment: &AttachmentContent, index: u32) -> MessagingResult<PcNode> {
    let properties = [
        (PID_TAG_ATTACH_NUM, PropertyValue::Integer32(index as i32)),
        (PID_TAG_ATTACH_METHOD, PropertyValue::Integer32(ATTACH_BY_VALUE)),
        (PID_TAG_ATTACH_LONG_FILENAME, PropertyValue::Unicode(attachment.filename.clone())),
        (PID_TAG_ATTACH_SIZE, PropertyValue::Integer32(attachment.data.len() as i32)),
        (PID_TAG_ATTACH_MIME_TAG, PropertyValue::Unicode(attachment.mime_type.clone())),
        (PID_TAG_RENDERING_POSITION, PropertyValue::Integer32(-1)),
        (PID_TAG_ATTACH_DATA_BIN, PropertyValue::Binary(attachment.data.clone())),
    ];
    Ok(build_pc(&properties)?)
}
