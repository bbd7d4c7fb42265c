//! RFC 5322 / MIME serialization of an extracted message.
//!
//! Text parts are UTF-8; attachments are base64 with 76-column wrapping.
//! Recovery provenance travels in `X-` headers so nothing extracted is lost
//! on the way out.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use uuid::Uuid;

use crate::message::{Importance, MailMessage, RecipientKind};

const CRLF: &str = "\r\n";

/// `"Display Name" <addr>` when both parts exist, the bare address or a
/// synthesized placeholder otherwise.
fn format_address(name: &str, email: &str) -> String {
    match (name.is_empty(), email.is_empty()) {
        (false, false) => format!("\"{}\" <{}>", name.replace('"', ""), email),
        (true, false) => email.to_string(),
        (false, true) => format!("\"{}\" <unknown@unknown>", name.replace('"', "")),
        (true, true) => "unknown@unknown".to_string(),
    }
}

fn recipient_header(message: &MailMessage, kind: RecipientKind) -> String {
    message
        .recipients_of_kind(kind)
        .map(|recipient| format_address(&recipient.display_name, &recipient.smtp_address))
        .collect::<Vec<_>>()
        .join(", ")
}

fn priority_header(importance: Importance) -> &'static str {
    match importance {
        Importance::Low => "5",
        Importance::Normal => "3",
        Importance::High => "1",
    }
}

fn push_header(out: &mut String, name: &str, value: &str) {
    if !value.is_empty() {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(CRLF);
    }
}

fn push_text_part(out: &mut String, subtype: &str, body: &str) {
    push_header(out, "Content-Type", &format!("text/{subtype}; charset=\"utf-8\""));
    push_header(out, "Content-Transfer-Encoding", "8bit");
    out.push_str(CRLF);
    out.push_str(body);
    out.push_str(CRLF);
}

fn push_body(out: &mut String, message: &MailMessage, boundary_seed: &str) {
    let has_text = !message.body_text.trim().is_empty();
    let has_html = !message.body_html.trim().is_empty();

    match (has_text, has_html) {
        (true, true) => {
            let boundary = format!("=_alt_{boundary_seed}");
            push_header(
                out,
                "Content-Type",
                &format!("multipart/alternative; boundary=\"{boundary}\""),
            );
            out.push_str(CRLF);
            out.push_str(&format!("--{boundary}{CRLF}"));
            push_text_part(out, "plain", &message.body_text);
            out.push_str(&format!("--{boundary}{CRLF}"));
            push_text_part(out, "html", &message.body_html);
            out.push_str(&format!("--{boundary}--{CRLF}"));
        }
        (false, true) => push_text_part(out, "html", &message.body_html),
        (true, false) => push_text_part(out, "plain", &message.body_text),
        (false, false) => {
            let placeholder = if message.subject.is_empty() {
                "(No content)"
            } else {
                &message.subject
            };
            push_text_part(out, "plain", placeholder);
        }
    }
}

fn wrap_base64(encoded: &str) -> String {
    encoded
        .as_bytes()
        .chunks(76)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(CRLF)
}

/// Serialize the message to EML bytes.
pub fn to_eml(message: &MailMessage) -> Vec<u8> {
    let mut out = String::new();
    let seed = Uuid::new_v4().simple().to_string();

    push_header(&mut out, "From", &format_address(&message.sender_name, &message.sender_email));
    push_header(&mut out, "To", &recipient_header(message, RecipientKind::To));
    push_header(&mut out, "Cc", &recipient_header(message, RecipientKind::Cc));
    push_header(&mut out, "Bcc", &recipient_header(message, RecipientKind::Bcc));
    push_header(
        &mut out,
        "Subject",
        if message.subject.is_empty() { "(No Subject)" } else { &message.subject },
    );
    if let Some(date) = message.date_sent.or(message.date_received) {
        push_header(&mut out, "Date", &date.to_rfc2822());
    }
    push_header(&mut out, "Message-ID", &message.message_id);
    push_header(&mut out, "MIME-Version", "1.0");

    push_header(&mut out, "X-Priority", priority_header(message.importance));
    push_header(
        &mut out,
        "X-MS-Has-Attach",
        if message.has_attachments { "yes" } else { "no" },
    );
    push_header(&mut out, "X-MS-Exchange-MessageClass", message.message_class());
    push_header(&mut out, "X-Folder", &message.folder_path);
    push_header(&mut out, "X-Record-Index", &message.record_index.to_string());
    match message.importance {
        Importance::High => push_header(&mut out, "Importance", "high"),
        Importance::Low => push_header(&mut out, "Importance", "low"),
        Importance::Normal => {}
    }
    if let Some(sensitivity) = message.sensitivity.header_value() {
        push_header(&mut out, "Sensitivity", sensitivity);
    }

    if message.attachments.is_empty() {
        push_body(&mut out, message, &seed);
        return out.into_bytes();
    }

    let boundary = format!("=_mixed_{seed}");
    push_header(
        &mut out,
        "Content-Type",
        &format!("multipart/mixed; boundary=\"{boundary}\""),
    );
    out.push_str(CRLF);

    out.push_str(&format!("--{boundary}{CRLF}"));
    push_body(&mut out, message, &seed);

    for attachment in &message.attachments {
        out.push_str(&format!("--{boundary}{CRLF}"));
        let mime = if attachment.mime_type.is_empty() {
            "application/octet-stream"
        } else {
            &attachment.mime_type
        };
        push_header(
            &mut out,
            "Content-Type",
            &format!("{mime}; name=\"{}\"", attachment.filename),
        );
        push_header(&mut out, "Content-Transfer-Encoding", "base64");
        push_header(
            &mut out,
            "Content-Disposition",
            &format!(
                "{}; filename=\"{}\"",
                if attachment.is_inline { "inline" } else { "attachment" },
                attachment.filename
            ),
        );
        if !attachment.content_id.is_empty() {
            push_header(&mut out, "Content-ID", &format!("<{}>", attachment.content_id));
        }
        out.push_str(CRLF);
        out.push_str(&wrap_base64(&BASE64.encode(&attachment.data)));
        out.push_str(CRLF);
    }
    out.push_str(&format!("--{boundary}--{CRLF}"));

    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MailAttachment, Recipient};
    use chrono::TimeZone;

    fn sample_message() -> MailMessage {
        MailMessage {
            record_index: 3,
            subject: "Hello".into(),
            sender_name: "Alice".into(),
            sender_email: "alice@example.com".into(),
            body_text: "World".into(),
            folder_path: "IPM Subtree/Inbox".into(),
            date_sent: chrono::Utc.with_ymd_and_hms(2021, 2, 24, 12, 0, 0).single(),
            recipients: vec![Recipient {
                display_name: "Bob".into(),
                smtp_address: "bob@example.com".into(),
                kind: RecipientKind::To,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_message_headers() {
        let eml = String::from_utf8(to_eml(&sample_message())).unwrap();
        assert!(eml.contains("From: \"Alice\" <alice@example.com>\r\n"));
        assert!(eml.contains("To: \"Bob\" <bob@example.com>\r\n"));
        assert!(eml.contains("Subject: Hello\r\n"));
        assert!(eml.contains("Date: Wed, 24 Feb 2021 12:00:00 +0000\r\n"));
        assert!(eml.contains("X-Folder: IPM Subtree/Inbox\r\n"));
        assert!(eml.contains("X-Record-Index: 3\r\n"));
        assert!(eml.ends_with("World\r\n"));
    }

    #[test]
    fn test_alternative_body() {
        let mut message = sample_message();
        message.body_html = "<p>World</p>".into();
        let eml = String::from_utf8(to_eml(&message)).unwrap();
        assert!(eml.contains("multipart/alternative"));
        assert!(eml.contains("text/plain"));
        assert!(eml.contains("text/html"));
    }

    #[test]
    fn test_attachment_encoding() {
        let mut message = sample_message();
        message.has_attachments = true;
        message.attachments.push(MailAttachment {
            filename: "a.bin".into(),
            mime_type: "application/octet-stream".into(),
            data: vec![0xDE, 0xAD, 0xBE, 0xEF],
            ..Default::default()
        });
        let eml = String::from_utf8(to_eml(&message)).unwrap();
        assert!(eml.contains("multipart/mixed"));
        assert!(eml.contains("Content-Disposition: attachment; filename=\"a.bin\""));
        assert!(eml.contains(&BASE64.encode([0xDE, 0xAD, 0xBE, 0xEF])));
        assert!(eml.contains("X-MS-Has-Attach: yes"));
    }

    #[test]
    fn test_empty_body_placeholder() {
        let mut message = sample_message();
        message.body_text.clear();
        let eml = String::from_utf8(to_eml(&message)).unwrap();
        assert!(eml.contains("Hello\r\n"));
    }
}
