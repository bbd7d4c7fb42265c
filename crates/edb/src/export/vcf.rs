//! vCard 3.0 serialization of the contact view.

use crate::message::ContactView;

fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\r', "")
        .replace('\n', "\\n")
}

/// Split a display name into the `N` property's `family;given` form.
fn structured_name(display_name: &str) -> String {
    let mut words = display_name.split_whitespace();
    let given = words.next().unwrap_or_default();
    let family = words.last().unwrap_or_default();
    format!("{};{};;;", escape_text(family), escape_text(given))
}

/// Fold a content line at 75 octets per RFC 2426 §2.6.
fn fold_line(line: &str) -> String {
    if line.len() <= 75 {
        return line.to_string();
    }
    let mut folded = String::new();
    let mut remaining = line;
    let mut first = true;
    while !remaining.is_empty() {
        let limit = if first { 75 } else { 74 };
        let mut cut = limit.min(remaining.len());
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            folded.push_str("\r\n ");
        }
        folded.push_str(&remaining[..cut]);
        remaining = &remaining[cut..];
        first = false;
    }
    folded
}

/// Serialize one contact as a vCard 3.0 record.
pub fn contact_to_vcf(contact: &ContactView) -> String {
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", escape_text(&contact.display_name)),
        format!("N:{}", structured_name(&contact.display_name)),
    ];
    if !contact.email.is_empty() {
        lines.push(format!("EMAIL;TYPE=INTERNET:{}", contact.email));
    }
    if !contact.phone.is_empty() {
        lines.push(format!("TEL;TYPE=WORK,VOICE:{}", contact.phone));
    }
    if !contact.company.is_empty() {
        lines.push(format!("ORG:{}", escape_text(&contact.company)));
    }
    if !contact.job_title.is_empty() {
        lines.push(format!("TITLE:{}", escape_text(&contact.job_title)));
    }
    lines.push("END:VCARD".into());

    lines
        .iter()
        .map(|line| fold_line(line))
        .collect::<Vec<_>>()
        .join("\r\n")
        + "\r\n"
}
