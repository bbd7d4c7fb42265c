//! Bridge from extracted records to PST synthesis: fold folder paths into a
//! folder tree and feed each message to the writer.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, instrument};

use edb_pst::messaging::message::{
    AttachmentContent, MessageContent, RecipientContent, RecipientKind as PstRecipientKind,
};
use edb_pst::ndb::NodeId;
use edb_pst::PstWriter;

use crate::filetime::datetime_to_filetime;
use crate::mailbox::{ProgressCallback, ProgressEvent};
use crate::message::{MailMessage, RecipientKind};
use crate::ExtractResult;

fn convert_kind(kind: RecipientKind) -> PstRecipientKind {
    match kind {
        RecipientKind::To => PstRecipientKind::To,
        RecipientKind::Cc => PstRecipientKind::Cc,
        RecipientKind::Bcc => PstRecipientKind::Bcc,
    }
}

/// Project a normalized record onto the writer's input model.
pub fn message_to_content(message: &MailMessage) -> MessageContent {
    MessageContent {
        subject: message.subject.clone(),
        message_class: message.message_class().into(),
        body_text: message.body_text.clone(),
        body_html: message.body_html.clone().into_bytes(),
        sender_name: message.sender_name.clone(),
        sender_email: message.sender_email.clone(),
        is_read: message.is_read,
        importance: message.importance.as_i32(),
        priority: 0,
        sensitivity: message.sensitivity.as_i32(),
        delivery_time: message.date_received.as_ref().map(datetime_to_filetime),
        submit_time: message.date_sent.as_ref().map(datetime_to_filetime),
        recipients: message
            .recipients
            .iter()
            .map(|recipient| RecipientContent {
                display_name: recipient.display_name.clone(),
                email: recipient.smtp_address.clone(),
                kind: convert_kind(recipient.kind),
            })
            .collect(),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| AttachmentContent {
                filename: attachment.filename.clone(),
                mime_type: attachment.mime_type.clone(),
                data: attachment.data.clone(),
            })
            .collect(),
    }
}

/// Get or create the folder NID for a `/`-separated path, creating the
/// intermediate folders on the way down.
fn folder_for_path(
    writer: &mut PstWriter,
    folders: &mut BTreeMap<String, NodeId>,
    path: &str,
    mut progress: Option<&mut ProgressCallback<'_>>,
) -> ExtractResult<Option<NodeId>> {
    if path.is_empty() {
        return Ok(None);
    }
    if let Some(node) = folders.get(path) {
        return Ok(Some(*node));
    }

    let mut parent: Option<NodeId> = None;
    let mut walked = String::new();
    for part in path.split('/').filter(|part| !part.is_empty()) {
        if !walked.is_empty() {
            walked.push('/');
        }
        walked.push_str(part);

        parent = Some(match folders.get(&walked) {
            Some(node) => *node,
            None => {
                if let Some(callback) = progress.as_deref_mut() {
                    callback(&ProgressEvent::Folder { path: walked.clone() });
                }
                let node = writer.add_folder(part, parent)?;
                folders.insert(walked.clone(), node);
                node
            }
        });
    }
    Ok(parent)
}

/// Build a [`PstWriter`] over extracted messages, reconstructing the source
/// folder hierarchy from each record's folder path. Error-stub records are
/// kept so nothing silently disappears.
#[instrument(skip_all, fields(messages = messages.len()))]
pub fn build_pst(
    display_name: &str,
    messages: &[MailMessage],
    mut progress: Option<ProgressCallback<'_>>,
) -> ExtractResult<PstWriter> {
    let mut writer = PstWriter::new(display_name);
    let mut folders = BTreeMap::new();
    let total = messages.len();

    for (index, message) in messages.iter().enumerate() {
        if let Some(callback) = progress.as_deref_mut() {
            callback(&ProgressEvent::Message { index, total });
        }

        let folder = folder_for_path(&mut writer, &mut folders, &message.folder_path, progress.as_mut())?
            .unwrap_or(writer.root_folder());
        writer.add_message(folder, &message_to_content(message))?;
    }

    info!(folders = folders.len(), messages = total, "pst assembled");
    Ok(writer)
}

/// Extract-to-file convenience: build and write the PST in one call.
pub fn export_messages_to_pst(
    display_name: &str,
    messages: &[MailMessage],
    path: impl AsRef<Path>,
    progress: Option<ProgressCallback<'_>>,
) -> ExtractResult<()> {
    let writer = build_pst(display_name, messages, progress)?;
    writer.write(path)?;
    Ok(())
}
