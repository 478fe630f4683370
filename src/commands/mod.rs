//! Built-in bot commands.


use relink_core::message::{IncomingMessage, LinkSpan, OutgoingMessage};
use relink_rules::{bypass, find_link_spans, RuleSet};

/// Notice sent when `/fix` finds nothing to work on.
pub const NO_LINK_NOTICE: &str =
    "No link found. Reply to a message that contains a link, or send /fix followed by the link.";

/// Known bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    ChatId,
    Fix,
    Roll,
}

impl Command {
    /// Parse a command from message text. Returns `None` for anything that is
    /// not a known `/command`.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/fix@relink_bot" → "/fix").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/start" | "/help" => Some(Self::Help),
            "/chatid" => Some(Self::ChatId),
            "/fix" | "/bypass" => Some(Self::Fix),
            "/roll" => Some(Self::Roll),
            _ => None,
        }
    }

    /// Informational commands answer outside the allow-list unless gating is
    /// switched on in config.
    pub fn is_informational(self) -> bool {
        matches!(self, Self::Help | Self::ChatId)
    }
}

/// Welcome and help text.
pub fn help_text(name: &str) -> String {
    format!(
        "Hi! I'm {name}.\n\n\
         Send a link in this chat and I'll fix it for you:\n\
         - paywalled news links get a paywall-free link\n\
         - Twitter/X, Instagram, Reddit, TikTok and Bluesky links get a mirror with a proper preview\n\n\
         Commands:\n\
         /fix - paywall-free link for the message you reply to\n\
         /chatid - show this chat's id\n\
         /roll - spin the wheel"
    )
}

/// Reply for `/chatid`.
pub fn chat_id_text(chat_id: &str) -> String {
    format!("This chat's id is {chat_id}")
}

/// Handle `/fix`: bypass the first link of the replied-to message, or of the
/// command message itself when it is not a reply. The reply threads under the
/// message the link came from.
pub fn handle_fix(rules: &RuleSet, incoming: &IncomingMessage, target: &str) -> OutgoingMessage {
    let (text, spans, source_id): (&str, &[LinkSpan], _) = match incoming.replied_to {
        Some(ref quoted) => (
            &quoted.text,
            &quoted.link_spans,
            quoted.message_id.clone(),
        ),
        None => (&incoming.text, &incoming.link_spans, None),
    };

    let discovered;
    let spans = if spans.is_empty() {
        discovered = find_link_spans(text);
        discovered.as_slice()
    } else {
        spans
    };

    let reply = match bypass(rules, text, spans) {
        Some(link) => OutgoingMessage::rich(target, link),
        None => OutgoingMessage::plain(target, NO_LINK_NOTICE),
    };
    reply.in_reply_to(source_id.or_else(|| incoming.message_id.clone()))
}
