use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A half-open byte range `[offset, offset + length)` into a message's text
/// marking one embedded URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpan {
    pub offset: usize,
    pub length: usize,
}

impl LinkSpan {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// The message an incoming message replies to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotedMessage {
    /// Platform-specific message ID. Replies about the quoted message thread
    /// under it.
    pub message_id: Option<String>,
    /// Message text content (or caption). Empty when the quoted message has none.
    pub text: String,
    #[serde(default)]
    pub link_spans: Vec<LinkSpan>,
}

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "telegram").
    pub channel: String,
    /// Platform-specific user ID.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific message ID, used to thread replies.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Platform-specific target for routing the response (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Embedded URLs, as byte ranges into `text`.
    #[serde(default)]
    pub link_spans: Vec<LinkSpan>,
    /// The message this one replies to, if any.
    #[serde(default)]
    pub replied_to: Option<QuotedMessage>,
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific target for routing (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Platform message ID to thread this message under.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Render `text` as rich (HTML) markup instead of plain text.
    #[serde(default)]
    pub rich_markup: bool,
    /// Suppress link-preview expansion.
    #[serde(default)]
    pub disable_preview: bool,
}

impl OutgoingMessage {
    /// Plain-text message to a chat, link previews allowed.
    pub fn plain(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_target: Some(target.into()),
            ..Default::default()
        }
    }

    /// Rich-markup message to a chat with link previews suppressed.
    pub fn rich(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_target: Some(target.into()),
            rich_markup: true,
            disable_preview: true,
            ..Default::default()
        }
    }

    /// Thread this message under the given platform message ID.
    pub fn in_reply_to(mut self, message_id: Option<String>) -> Self {
        self.reply_to = message_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_end() {
        assert_eq!(LinkSpan::new(11, 23).end(), 34);
    }

    #[test]
    fn test_outgoing_constructors() {
        let plain = OutgoingMessage::plain("42", "hi");
        assert_eq!(plain.reply_target.as_deref(), Some("42"));
        assert!(!plain.rich_markup);
        assert!(!plain.disable_preview);

        let rich = OutgoingMessage::rich("42", "<b>hi</b>").in_reply_to(Some("7".into()));
        assert!(rich.rich_markup);
        assert!(rich.disable_preview);
        assert_eq!(rich.reply_to.as_deref(), Some("7"));
    }

    #[test]
    fn test_incoming_defaults_when_missing() {
        let json = r#"{
            "id": "6c0b1c3e-2f1e-4b8e-9a5e-2d1f0b7c9a11",
            "channel": "telegram",
            "sender_id": "1",
            "sender_name": null,
            "text": "hello",
            "timestamp": "2024-01-01T00:00:00Z"
        }"#;
        let msg: IncomingMessage = serde_json::from_str(json).unwrap();
        assert!(msg.link_spans.is_empty());
        assert!(msg.replied_to.is_none());
    }
}
