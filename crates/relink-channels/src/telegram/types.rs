//! Telegram Bot API deserialization types.

use crate::utils::utf16_span_to_bytes;
use relink_core::message::{LinkSpan, QuotedMessage};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub(crate) struct TgResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgMessage {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: TgChat,
    pub text: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<TgEntity>,
    #[serde(default)]
    pub caption_entities: Vec<TgEntity>,
    pub reply_to_message: Option<Box<TgMessage>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TgChat {
    pub id: i64,
}

/// A formatting entity. Offsets and lengths are in UTF-16 code units.
#[derive(Debug, Deserialize)]
pub(crate) struct TgEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

impl TgUser {
    /// "@username", else "First Last", else "First".
    pub fn display_name(&self) -> String {
        if let Some(ref un) = self.username {
            format!("@{un}")
        } else if let Some(ref ln) = self.last_name {
            format!("{} {ln}", self.first_name)
        } else {
            self.first_name.clone()
        }
    }
}

impl TgMessage {
    /// Text (or caption) of the message and the byte spans of its `url` entities.
    pub fn body(&self) -> Option<(String, Vec<LinkSpan>)> {
        let (text, entities) = match (&self.text, &self.caption) {
            (Some(t), _) => (t, &self.entities),
            (None, Some(c)) => (c, &self.caption_entities),
            (None, None) => return None,
        };

        let spans = entities
            .iter()
            .filter(|e| e.kind == "url")
            .filter_map(|e| {
                let span = utf16_span_to_bytes(text, e.offset, e.length);
                if span.is_none() {
                    debug!(
                        "telegram: dropping url entity {}+{} that does not fit the text",
                        e.offset, e.length
                    );
                }
                span
            })
            .collect();

        Some((text.clone(), spans))
    }

    /// The replied-to message in the shape the gateway consumes.
    pub fn quoted(&self) -> Option<QuotedMessage> {
        let reply = self.reply_to_message.as_deref()?;
        let (text, link_spans) = reply.body().unwrap_or_default();
        Some(QuotedMessage {
            message_id: Some(reply.message_id.to_string()),
            text,
            link_spans,
        })
    }
}
