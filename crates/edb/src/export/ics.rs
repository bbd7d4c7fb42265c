//! iCalendar (RFC 5545) serialization of the calendar view.

use chrono::{DateTime, Utc};

use crate::message::{EventView, Importance};

const PRODID: &str = "-//Exchange EDB Exporter//EN";

fn format_utc(instant: &DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape per RFC 5545 §3.3.11: backslash, semicolon, comma, newline.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\r', "")
        .replace('\n', "\\n")
}

fn push_event(lines: &mut Vec<String>, event: &EventView) {
    lines.push("BEGIN:VEVENT".into());
    lines.push(format!("UID:{}", event.uid));

    let stamp = event
        .created
        .map(|created| format_utc(&created))
        .unwrap_or_else(|| format_utc(&Utc::now()));
    lines.push(format!("DTSTAMP:{stamp}"));
    if let Some(modified) = event.modified {
        lines.push(format!("LAST-MODIFIED:{}", format_utc(&modified)));
    }

    if let Some(start) = event.start_time {
        lines.push(format!("DTSTART:{}", format_utc(&start)));
    }
    if let Some(end) = event.end_time {
        lines.push(format!("DTEND:{}", format_utc(&end)));
    }

    if !event.subject.is_empty() {
        lines.push(format!("SUMMARY:{}", escape_text(&event.subject)));
    }
    if !event.description.is_empty() {
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
    }
    if !event.location.is_empty() {
        lines.push(format!("LOCATION:{}", escape_text(&event.location)));
    }

    if !event.organizer_email.is_empty() {
        if event.organizer_name.is_empty() {
            lines.push(format!("ORGANIZER:mailto:{}", event.organizer_email));
        } else {
            lines.push(format!(
                "ORGANIZER;CN={}:mailto:{}",
                escape_text(&event.organizer_name),
                event.organizer_email
            ));
        }
    }

    for attendee in &event.attendees {
        if attendee.email.is_empty() {
            continue;
        }
        let mut parts = vec!["ATTENDEE".to_string()];
        if !attendee.name.is_empty() {
            parts.push(format!("CN={}", escape_text(&attendee.name)));
        }
        parts.push("ROLE=REQ-PARTICIPANT".into());
        parts.push("PARTSTAT=NEEDS-ACTION".into());
        parts.push(format!("RSVP=TRUE:mailto:{}", attendee.email));
        lines.push(parts.join(";"));
    }

    lines.push("STATUS:CONFIRMED".into());
    lines.push("TRANSP:OPAQUE".into());
    lines.push(format!(
        "PRIORITY:{}",
        match event.importance {
            Importance::High => 1,
            Importance::Normal => 5,
            Importance::Low => 9,
        }
    ));

    if event.is_recurring && !event.recurrence_rule.is_empty() {
        lines.push(format!("RRULE:{}", event.recurrence_rule));
    }

    if event.reminder_minutes > 0 {
        lines.push("BEGIN:VALARM".into());
        lines.push("ACTION:DISPLAY".into());
        lines.push(format!("TRIGGER:-PT{}M", event.reminder_minutes));
        lines.push(format!("DESCRIPTION:Reminder: {}", escape_text(&event.subject)));
        lines.push("END:VALARM".into());
    }

    lines.push("END:VEVENT".into());
}

/// Serialize one or more events into a single VCALENDAR stream.
pub fn calendar_to_ics(events: &[EventView]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
    ];
    for event in events {
        push_event(&mut lines, event);
    }
    lines.push("END:VCALENDAR".into());
    lines.join("\r\n")
}

/// Serialize a single event.
pub fn event_to_ics(event: &EventView) -> String {
    calendar_to_ics(std::slice::from_ref(event))
}
