//! Message processing pipeline: allow-list, commands, link rewriting.

use super::Gateway;
use crate::commands::{self, Command};
use relink_core::message::{IncomingMessage, OutgoingMessage};
use relink_rules::{find_link_spans, rewrite};
use tracing::{debug, info, warn};

impl Gateway {
    /// Process a single incoming message.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let Some(chat_id) = incoming.reply_target.clone() else {
            warn!(
                "[{}] message from {} has no chat id, dropping",
                incoming.channel, incoming.sender_id
            );
            return;
        };
        let allowed = self.auth.is_allowed(&chat_id);

        // --- 1. COMMANDS ---
        if let Some(command) = Command::parse(&incoming.text) {
            let gated = !command.is_informational() || self.auth.gate_info_commands;
            if gated && !allowed {
                debug!("ignoring {command:?} from unauthorized chat {chat_id}");
                return;
            }
            self.handle_command(command, &incoming, &chat_id).await;
            return;
        }
        if incoming.text.starts_with('/') {
            debug!("ignoring unknown command in chat {chat_id}");
            return;
        }

        // --- 2. AUTH CHECK ---
        if !allowed {
            debug!("ignoring message from unauthorized chat {chat_id}");
            return;
        }

        // --- 3. REWRITE ---
        let discovered;
        let spans = if incoming.link_spans.is_empty() {
            discovered = find_link_spans(&incoming.text);
            discovered.as_slice()
        } else {
            incoming.link_spans.as_slice()
        };
        if spans.is_empty() {
            return;
        }

        let outcome = rewrite(&self.rules, &incoming.text, spans);
        if !outcome.changed {
            return;
        }

        info!(
            "[{}] fixed link(s) from {} in {chat_id}{}",
            incoming.channel,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
            if outcome.contains_paywall {
                " (paywall)"
            } else {
                ""
            },
        );

        let reply = if outcome.contains_paywall {
            OutgoingMessage::rich(chat_id, outcome.text)
        } else {
            OutgoingMessage::plain(chat_id, outcome.text)
        };
        self.send(&incoming, reply.in_reply_to(incoming.message_id.clone()))
            .await;
    }

    async fn handle_command(&self, command: Command, incoming: &IncomingMessage, chat_id: &str) {
        info!(
            "[{}] {command:?} from {} in {chat_id}",
            incoming.channel,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
        );

        let reply_to = incoming.message_id.clone();
        let reply = match command {
            Command::Help => OutgoingMessage::plain(chat_id, commands::help_text(&self.name))
                .in_reply_to(reply_to),
            Command::ChatId => OutgoingMessage::plain(chat_id, commands::chat_id_text(chat_id))
                .in_reply_to(reply_to),
            Command::Fix => commands::handle_fix(&self.rules, incoming, chat_id),
            Command::Roll => {
                let Some(ref sequencer) = self.sequencer else {
                    debug!("sequencer disabled, ignoring /roll");
                    return;
                };
                let Some(channel) = self.channels.get(&incoming.channel) else {
                    warn!("no channel named {} to roll on", incoming.channel);
                    return;
                };
                sequencer.invoke(channel.as_ref(), chat_id, reply_to).await;
                return;
            }
        };
        self.send(incoming, reply).await;
    }
}
