//! Message rewrite orchestrator and the explicit bypass helper.

use crate::classify::{Classification, RuleSet};
use crate::extract::{extract_link, parse_link};
use crate::render::{escape_html, mirror_url, redirector_url, styled_link};
use relink_core::message::LinkSpan;
use tracing::{debug, warn};

/// Result of running the rules over one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Rewritten text. HTML markup when `contains_paywall`, plain text otherwise.
    pub text: String,
    /// At least one link was rewritten.
    pub changed: bool,
    /// At least one link matched a paywall rule. The reply must be sent as
    /// rich markup with link previews suppressed.
    pub contains_paywall: bool,
}

enum Replacement {
    /// Already-rendered HTML markup.
    Markup(String),
    /// Plain text, escaped only if the message ends up as markup.
    Text(String),
}

/// Rewrite every classified link in `text`.
///
/// Spans are visited in order and each link gets at most one rewrite, paywall
/// before social. A link is replaced as a literal substring, so repeated
/// occurrences of the same link text are all rewritten together. Spans that
/// fall outside the text or fail to parse are skipped.
pub fn rewrite(rules: &RuleSet, text: &str, spans: &[LinkSpan]) -> RewriteOutcome {
    let mut replacements: Vec<(&str, Replacement)> = Vec::new();
    let mut contains_paywall = false;

    for span in spans {
        let Some(link) = extract_link(text, span) else {
            warn!(
                "skipping link span {}+{} outside message text",
                span.offset, span.length
            );
            continue;
        };
        if replacements.iter().any(|(seen, _)| *seen == link) {
            continue;
        }
        let url = match parse_link(link) {
            Ok(url) => url,
            Err(e) => {
                warn!("skipping unparsable link '{link}': {e}");
                continue;
            }
        };

        match rules.classify(&url) {
            Classification::Paywall => {
                contains_paywall = true;
                let href = redirector_url(rules.redirector_base(), link);
                let markup = styled_link(&href, rules.link_text());
                replacements.push((link, Replacement::Markup(markup)));
            }
            Classification::Mirror(mirror) => match mirror_url(link, &url, mirror) {
                Some(mirrored) => replacements.push((link, Replacement::Text(mirrored))),
                None => warn!("mirror host '{mirror}' rejected for '{link}'"),
            },
            Classification::Passthrough => debug!("no rule for '{link}'"),
        }
    }

    let changed = !replacements.is_empty();
    let text = if contains_paywall {
        // Markup reply: escape the surrounding text and match links in their escaped form.
        let mut out = escape_html(text);
        for (link, replacement) in &replacements {
            let rendered = match replacement {
                Replacement::Markup(markup) => markup.clone(),
                Replacement::Text(plain) => escape_html(plain),
            };
            out = out.replace(&escape_html(link), &rendered);
        }
        out
    } else {
        let mut out = text.to_string();
        for (link, replacement) in &replacements {
            let (Replacement::Text(plain) | Replacement::Markup(plain)) = replacement;
            out = out.replace(link, plain);
        }
        out
    };

    RewriteOutcome {
        text,
        changed,
        contains_paywall,
    }
}

/// Styled redirector link for the first span that parses as a URL at all,
/// regardless of the rule tables. `None` when no span qualifies.
pub fn bypass(rules: &RuleSet, text: &str, spans: &[LinkSpan]) -> Option<String> {
    spans.iter().find_map(|span| {
        let link = extract_link(text, span)?;
        match parse_link(link) {
            Ok(_) => {
                let href = redirector_url(rules.redirector_base(), link);
                Some(styled_link(&href, rules.link_text()))
            }
            Err(e) => {
                debug!("bypass: skipping unparsable link '{link}': {e}");
                None
            }
        }
    })
}
