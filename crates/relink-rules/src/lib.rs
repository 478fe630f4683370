//! # relink-rules
//!
//! The link rewriting engine: pull URLs out of a message by span, classify
//! their hosts against the paywall and social-mirror tables, and rebuild the
//! message text with the rewritten links.

pub mod classify;
pub mod extract;
pub mod render;
pub mod rewrite;

pub use classify::{Classification, RuleSet};
pub use extract::{extract_link, find_link_spans, parse_link};
pub use rewrite::{bypass, rewrite, RewriteOutcome};
