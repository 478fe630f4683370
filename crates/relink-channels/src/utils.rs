//! Shared utilities for channel implementations.

use relink_core::message::LinkSpan;

/// Split a long message into chunks of at most `max_chars` characters.
///
/// Prefers splitting after a newline, then after whitespace. Slices always
/// land on char boundaries.
pub fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    split_chunks(text, max_chars, false)
}

/// Like [`split_message`], for HTML markup: a chunk never ends inside a tag,
/// an `&...;` entity, or an element that is still open, so every chunk parses
/// on its own. Falls back to a hard cut only when one element is longer than
/// `max_chars`.
pub fn split_markup(text: &str, max_chars: usize) -> Vec<&str> {
    split_chunks(text, max_chars, true)
}

fn split_chunks(text: &str, max_chars: usize, markup: bool) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let cut = cut_point(rest, max_chars, markup);
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Byte index where the next chunk of `text` ends. `text` is longer than
/// `max_chars` characters.
fn cut_point(text: &str, max_chars: usize, markup: bool) -> usize {
    let mut in_tag = false;
    let mut in_entity = false;
    let mut tag = String::new();
    let mut depth = 0usize;

    let mut hard = 0;
    let mut last_safe = None;
    let mut last_space = None;
    let mut last_newline = None;

    for (i, c) in text.char_indices().take(max_chars) {
        if markup {
            if in_tag {
                if c == '>' {
                    in_tag = false;
                    if tag.starts_with('/') {
                        depth = depth.saturating_sub(1);
                    } else {
                        depth += 1;
                    }
                } else {
                    tag.push(c);
                }
            } else if in_entity {
                if c == ';' || c.is_whitespace() {
                    in_entity = false;
                }
            } else if c == '<' {
                in_tag = true;
                tag.clear();
            } else if c == '&' {
                in_entity = true;
            }
        }

        hard = i + c.len_utf8();
        if in_tag || in_entity || depth > 0 {
            continue;
        }
        last_safe = Some(hard);
        if c == '\n' {
            last_newline = Some(hard);
        } else if c.is_whitespace() {
            last_space = Some(hard);
        }
    }

    last_newline.or(last_space).or(last_safe).unwrap_or(hard)
}

/// Plain-text rendering of HTML reply markup: each anchor becomes its href,
/// other tags are dropped and entities are unescaped.
pub fn markup_to_plain(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    let mut in_anchor = false;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>').map(|i| open + i) else {
            break;
        };
        if !in_anchor {
            out.push_str(&unescape_html(&rest[..open]));
        }
        let tag = rest[open + 1..close].trim();
        if let Some(href) = anchor_href(tag) {
            out.push_str(&unescape_html(href));
            in_anchor = true;
        } else if tag == "/a" {
            in_anchor = false;
        }
        rest = &rest[close + 1..];
    }
    if !in_anchor {
        out.push_str(&unescape_html(rest));
    }
    out
}

fn anchor_href(tag: &str) -> Option<&str> {
    let attrs = tag.strip_prefix("a ")?;
    let start = attrs.find("href=\"")? + "href=\"".len();
    let len = attrs[start..].find('"')?;
    Some(&attrs[start..start + len])
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Convert a span measured in UTF-16 code units (Telegram's entity unit) to
/// a byte span into `text`.
///
/// Returns `None` when the span is empty, runs past the end of the text, or
/// cuts a surrogate pair in half.
pub fn utf16_span_to_bytes(text: &str, offset: usize, length: usize) -> Option<LinkSpan> {
    if length == 0 {
        return None;
    }
    let end16 = offset.checked_add(length)?;

    let mut units = 0usize;
    let mut start_byte = None;
    for (byte_idx, c) in text.char_indices() {
        if units == offset {
            start_byte = Some(byte_idx);
        }
        if units == end16 {
            let start = start_byte?;
            return Some(LinkSpan::new(start, byte_idx - start));
        }
        if units > end16 {
            return None;
        }
        units += c.len_utf16();
    }

    if units == end16 {
        let start = start_byte?;
        return Some(LinkSpan::new(start, text.len() - start));
    }
    None
}
