//! Message sending and command registration.

use super::TelegramChannel;
use crate::utils::{markup_to_plain, split_markup, split_message};
use relink_core::{error::RelinkError, message::OutgoingMessage};
use tracing::{info, warn};

/// Telegram's per-message text limit, in characters.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Split outgoing text into API-sized chunks. Rich messages are split
/// outside markup so each chunk is valid HTML on its own.
pub(crate) fn message_chunks(message: &OutgoingMessage) -> Vec<&str> {
    if message.rich_markup {
        split_markup(&message.text, MAX_MESSAGE_CHARS)
    } else {
        split_message(&message.text, MAX_MESSAGE_CHARS)
    }
}

/// Build the `sendMessage` request body for one chunk.
pub(crate) fn message_body(
    chat_id: i64,
    chunk: &str,
    message: &OutgoingMessage,
    reply_to: Option<i64>,
    rich: bool,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": chunk,
        "link_preview_options": { "is_disabled": message.disable_preview },
    });
    if rich {
        body["parse_mode"] = serde_json::json!("HTML");
    }
    if let Some(id) = reply_to {
        body["reply_parameters"] = serde_json::json!({
            "message_id": id,
            "allow_sending_without_reply": true,
        });
    }
    body
}

impl TelegramChannel {
    /// Send a message to a specific chat, split into API-sized chunks.
    /// Only the first chunk is threaded under `reply_to`.
    pub(crate) async fn send_text(
        &self,
        chat_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), RelinkError> {
        let mut reply_to = message
            .reply_to
            .as_deref()
            .and_then(|id| id.parse::<i64>().ok());

        for chunk in message_chunks(message) {
            let url = format!("{}/sendMessage", self.base_url);
            let body = message_body(chat_id, chunk, message, reply_to, message.rich_markup);

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| RelinkError::Channel(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                if message.rich_markup && error_text.contains("can't parse entities") {
                    warn!("HTML parse failed, retrying as plain text: {error_text}");
                    let plain = markup_to_plain(chunk);
                    let plain_body = message_body(chat_id, &plain, message, reply_to, false);
                    let plain_resp = self
                        .client
                        .post(&url)
                        .json(&plain_body)
                        .send()
                        .await
                        .map_err(|e| {
                            RelinkError::Channel(format!("telegram send (plain) failed: {e}"))
                        })?;
                    if !plain_resp.status().is_success() {
                        let plain_err = plain_resp.text().await.unwrap_or_default();
                        return Err(RelinkError::Channel(format!(
                            "telegram send (plain fallback) failed: {plain_err}"
                        )));
                    }
                } else {
                    return Err(RelinkError::Channel(format!(
                        "telegram send failed ({status}): {error_text}"
                    )));
                }
            }

            reply_to = None;
        }

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands = serde_json::json!({
            "commands": [
                { "command": "help", "description": "What this bot does" },
                { "command": "chatid", "description": "Show this chat's id" },
                { "command": "fix", "description": "Paywall-free link for the replied message" },
                { "command": "roll", "description": "Spin the wheel" },
            ]
        });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&commands).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }
}
