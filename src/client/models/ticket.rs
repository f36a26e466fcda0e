use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer};

/// Who wrote a chat message. Parsed case-insensitively; anything the
/// backend invents beyond the three known roles is kept as `Unknown` and
/// rendered on the operator side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sender {
    Customer,
    Astrologer,
    Support,
    #[default]
    Unknown,
}

impl Sender {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "customer" => Sender::Customer,
            "astrologer" => Sender::Astrologer,
            "support" => Sender::Support,
            _ => Sender::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Customer => "customer",
            Sender::Astrologer => "astrologer",
            Sender::Support => "support",
            Sender::Unknown => "unknown",
        }
    }

    /// Requester-side messages (customer or astrologer) render left-aligned,
    /// everything else right-aligned.
    pub fn is_requester_side(&self) -> bool {
        matches!(self, Sender::Customer | Sender::Astrologer)
    }
}

impl<'de> Deserialize<'de> for Sender {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Sender::parse(&raw))
    }
}

/// Message payload kind. Unrecognized values fall back to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Text,
    Image,
}

impl MessageKind {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("image") {
            MessageKind::Image
        } else {
            MessageKind::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
        }
    }
}

impl<'de> Deserialize<'de> for MessageKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(MessageKind::parse(&raw))
    }
}

/// One entry of a ticket conversation, as delivered by the backend.
/// `body` holds the literal text for text messages and the attachment URL
/// for image messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub sender: Sender,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(rename = "message", default)]
    pub body: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A support ticket document. `status` is kept as the backend's free-form
/// string and always compared case-insensitively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ticket {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub user_details: Option<UserDetails>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_remark: Option<String>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("open")
    }

    pub fn is_closed(&self) -> bool {
        is_closed_status(&self.status)
    }

    pub fn requester_name(&self) -> &str {
        self.user_details
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .unwrap_or("-")
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.messages.last().and_then(|m| m.timestamp)
    }
}

pub fn is_closed_status(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("closed")
}

/// `DD Mon YYYY, HH:MM AM/PM` in local time, `-` when absent. Used for
/// ticket metadata rows and the catalog list.
pub fn format_datetime(ts: &Option<DateTime<Utc>>) -> String {
    match ts {
        Some(dt) => dt.with_timezone(&Local).format("%d %b %Y, %I:%M %p").to_string(),
        None => "-".to_string(),
    }
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Parse an ISO-8601 timestamp, tolerating anything the backend sends:
/// unparseable values become `None` and group under the Unknown day bucket.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_full_message() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"_id":"m1","sender":"customer","type":"text","message":"Hi","timestamp":"2024-01-01T10:00:00Z"}"#,
        )
        .expect("valid message json");
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.sender, Sender::Customer);
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.body, "Hi");
        assert!(msg.timestamp.is_some());
    }

    #[test]
    fn sender_is_case_insensitive() {
        assert_eq!(Sender::parse("Support"), Sender::Support);
        assert_eq!(Sender::parse("ASTROLOGER"), Sender::Astrologer);
        assert_eq!(Sender::parse("moderator"), Sender::Unknown);
    }

    #[test]
    fn unknown_kind_falls_back_to_text() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"_id":"m1","sender":"support","type":"video","message":"x"}"#)
                .expect("valid message json");
        assert_eq!(msg.kind, MessageKind::Text);
    }

    #[test]
    fn bad_timestamp_becomes_none() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"_id":"m1","sender":"support","type":"text","message":"x","timestamp":"not-a-date"}"#,
        )
        .expect("valid message json");
        assert!(msg.timestamp.is_none());

        let msg: ChatMessage =
            serde_json::from_str(r#"{"_id":"m1","sender":"support","type":"text","message":"x"}"#)
                .expect("valid message json");
        assert!(msg.timestamp.is_none());
    }

    #[test]
    fn ticket_defaults_cover_sparse_payloads() {
        let ticket: Ticket = serde_json::from_str(r#"{"_id":"t1","status":"Open"}"#)
            .expect("valid ticket json");
        assert!(ticket.is_open());
        assert!(!ticket.is_closed());
        assert!(ticket.messages.is_empty());
        assert_eq!(ticket.requester_name(), "-");
    }

    #[test]
    fn closed_status_ignores_case() {
        assert!(is_closed_status("closed"));
        assert!(is_closed_status("CLOSED"));
        assert!(is_closed_status(" Closed "));
        assert!(!is_closed_status("open"));
        assert!(!is_closed_status(""));
    }
}
