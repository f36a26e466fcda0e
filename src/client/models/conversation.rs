use chrono::{DateTime, Local, NaiveDate, Utc};
use uuid::Uuid;

use crate::client::models::ticket::{is_closed_status, ChatMessage, MessageKind, Sender, Ticket};

/// Day-bucket label for messages without a usable timestamp.
pub const UNKNOWN_DAY_LABEL: &str = "Unknown";

/// A run of messages sharing one calendar-day label.
#[derive(Debug, PartialEq)]
pub struct DayGroup<'a> {
    pub label: String,
    pub messages: Vec<&'a ChatMessage>,
}

/// Conversation state for the ticket currently on screen.
///
/// The message list is exactly the fetched order followed by local-append
/// order; it is never reordered or deduplicated. Every fresh ticket
/// snapshot rebuilds the conversation wholesale, so optimistic appends the
/// server has not echoed yet are dropped rather than reconciled.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    pub ticket_id: String,
    pub status: String,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            status: ticket.status.clone(),
            messages: ticket.messages.clone(),
        }
    }

    pub fn is_closed(&self) -> bool {
        is_closed_status(&self.status)
    }

    /// A closed ticket, or one without an id to address the backend with,
    /// accepts no new messages.
    pub fn can_send(&self) -> bool {
        !self.ticket_id.is_empty() && !self.is_closed()
    }

    /// Append the operator's own text message after a confirmed send.
    pub fn push_local_text(&mut self, body: impl Into<String>) {
        self.push_local(MessageKind::Text, body.into());
    }

    /// Append the operator's own image message after a confirmed upload+send.
    pub fn push_local_image(&mut self, url: impl Into<String>) {
        self.push_local(MessageKind::Image, url.into());
    }

    fn push_local(&mut self, kind: MessageKind, body: String) {
        self.messages.push(ChatMessage {
            id: format!("local-{}", Uuid::new_v4()),
            sender: Sender::Support,
            kind,
            body,
            timestamp: Some(Utc::now()),
        });
    }

    /// Partition the list into day buckets keyed by label, merging repeats
    /// of a label into its first occurrence. Bucket order is first-seen
    /// order, message order within a bucket is list order, so a
    /// chronological input yields chronological groups without any sorting.
    pub fn grouped_by_day(&self, today: NaiveDate) -> Vec<DayGroup<'_>> {
        let mut groups: Vec<DayGroup<'_>> = Vec::new();
        for msg in &self.messages {
            let label = day_label(msg.timestamp, today);
            match groups.iter_mut().find(|g| g.label == label) {
                Some(group) => group.messages.push(msg),
                None => groups.push(DayGroup { label, messages: vec![msg] }),
            }
        }
        groups
    }
}

/// `Today`, `Yesterday`, or `DD/MM/YYYY` from the message's local calendar
/// date; `Unknown` when the timestamp is missing or unparseable.
pub fn day_label(timestamp: Option<DateTime<Utc>>, today: NaiveDate) -> String {
    let Some(ts) = timestamp else {
        return UNKNOWN_DAY_LABEL.to_string();
    };
    let date = ts.with_timezone(&Local).date_naive();
    if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%d/%m/%Y").to_string()
    }
}

/// 12-hour clock in local time, empty for messages without a timestamp.
pub fn format_message_time(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.with_timezone(&Local).format("%I:%M %p").to_string(),
        None => String::new(),
    }
}

/// MIME type for an attachment path, `None` for anything that is not an
/// accepted image. Checked before any file or network I/O happens.
pub fn image_mime_for_path(path: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(path)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn local_noon(date: NaiveDate) -> Option<DateTime<Utc>> {
        let local = Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).expect("valid time"))
            .single()
            .expect("unambiguous local noon");
        Some(local.with_timezone(&Utc))
    }

    fn msg(id: &str, sender: Sender, body: &str, timestamp: Option<DateTime<Utc>>) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            sender,
            kind: MessageKind::Text,
            body: body.to_string(),
            timestamp,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date")
    }

    #[test]
    fn day_labels_relative_to_today() {
        let today = today();
        assert_eq!(day_label(local_noon(today), today), "Today");
        assert_eq!(
            day_label(local_noon(today - Duration::days(1)), today),
            "Yesterday"
        );
        assert_eq!(
            day_label(local_noon(today - Duration::days(5)), today),
            "10/03/2024"
        );
        assert_eq!(day_label(None, today), UNKNOWN_DAY_LABEL);
    }

    #[test]
    fn local_append_preserves_order() {
        let today = today();
        let mut convo = Conversation {
            ticket_id: "t1".into(),
            status: "open".into(),
            messages: vec![
                msg("a", Sender::Customer, "first", local_noon(today)),
                msg("b", Sender::Support, "second", local_noon(today)),
            ],
        };
        convo.push_local_text("third");
        convo.push_local_image("https://cdn.example.com/pic.png");

        let bodies: Vec<&str> = convo.messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["first", "second", "third", "https://cdn.example.com/pic.png"]);
        assert!(convo.messages[2].id.starts_with("local-"));
        assert_eq!(convo.messages[2].sender, Sender::Support);
        assert_eq!(convo.messages[3].kind, MessageKind::Image);
    }

    #[test]
    fn grouping_merges_repeated_days_into_first_occurrence() {
        let today = today();
        let day_a = local_noon(today - Duration::days(3));
        let day_b = local_noon(today - Duration::days(2));
        let convo = Conversation {
            ticket_id: "t1".into(),
            status: "open".into(),
            messages: vec![
                msg("1", Sender::Customer, "a1", day_a),
                msg("2", Sender::Support, "b1", day_b),
                msg("3", Sender::Customer, "a2", day_a),
            ],
        };

        let groups = convo.grouped_by_day(today);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "12/03/2024");
        assert_eq!(
            groups[0].messages.iter().map(|m| m.body.as_str()).collect::<Vec<_>>(),
            ["a1", "a2"]
        );
        assert_eq!(groups[1].label, "13/03/2024");
    }

    #[test]
    fn invalid_timestamps_bucket_under_unknown_exactly_once() {
        let today = today();
        let convo = Conversation {
            ticket_id: "t1".into(),
            status: "open".into(),
            messages: vec![
                msg("1", Sender::Customer, "dated", local_noon(today)),
                msg("2", Sender::Support, "lost-1", None),
                msg("3", Sender::Customer, "lost-2", None),
            ],
        };

        let groups = convo.grouped_by_day(today);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Today");
        let unknown = &groups[1];
        assert_eq!(unknown.label, UNKNOWN_DAY_LABEL);
        assert_eq!(unknown.messages.len(), 2);
        let total: usize = groups.iter().map(|g| g.messages.len()).sum();
        assert_eq!(total, convo.messages.len());
    }

    #[test]
    fn closed_status_blocks_sending_in_any_case() {
        for status in ["closed", "Closed", "CLOSED"] {
            let convo = Conversation {
                ticket_id: "t1".into(),
                status: status.into(),
                messages: vec![],
            };
            assert!(!convo.can_send(), "status {status:?} should block sends");
        }
        let missing_id = Conversation {
            ticket_id: String::new(),
            status: "open".into(),
            messages: vec![],
        };
        assert!(!missing_id.can_send());
    }

    #[test]
    fn image_mime_allowlist() {
        assert_eq!(image_mime_for_path("/tmp/a.jpg"), Some("image/jpeg"));
        assert_eq!(image_mime_for_path("/tmp/a.JPEG"), Some("image/jpeg"));
        assert_eq!(image_mime_for_path("/tmp/a.png"), Some("image/png"));
        assert_eq!(image_mime_for_path("/tmp/a.gif"), Some("image/gif"));
        assert_eq!(image_mime_for_path("/tmp/a.webp"), Some("image/webp"));
        assert_eq!(image_mime_for_path("/tmp/a.txt"), None);
        assert_eq!(image_mime_for_path("/tmp/noext"), None);
    }

    #[test]
    fn message_time_formatting() {
        assert_eq!(format_message_time(None), "");
        let ts = local_noon(today());
        assert_eq!(format_message_time(ts), "12:00 PM");
    }
}
