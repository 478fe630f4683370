//! Link span extraction and URL discovery.

use relink_core::message::LinkSpan;
use url::Url;

/// Characters stripped from the end of a discovered URL token.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\'', '>'];

/// Return the literal substring a span covers, or `None` if the span runs
/// past the end of `text` or does not fall on UTF-8 char boundaries.
pub fn extract_link<'a>(text: &'a str, span: &LinkSpan) -> Option<&'a str> {
    if span.length == 0 {
        return None;
    }
    text.get(span.offset..span.end())
}

/// Parse link text as an absolute URL.
///
/// Chat platforms mark scheme-less links like `nytimes.com/article` as URLs
/// too, so a dotted link without a scheme is retried as `https://`.
pub fn parse_link(link: &str) -> Result<Url, url::ParseError> {
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) if link.contains('.') => {
            Url::parse(&format!("https://{link}"))
        }
        Err(e) => Err(e),
    }
}

/// Find `http://` and `https://` links in plain text.
///
/// Used when a message arrives without platform-provided link spans.
pub fn find_link_spans(text: &str) -> Vec<LinkSpan> {
    let mut spans = Vec::new();
    let mut token_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = token_start.take() {
                push_token_span(text, start, i, &mut spans);
            }
        } else if token_start.is_none() {
            token_start = Some(i);
        }
    }
    if let Some(start) = token_start {
        push_token_span(text, start, text.len(), &mut spans);
    }

    spans
}

fn push_token_span(text: &str, start: usize, end: usize, spans: &mut Vec<LinkSpan>) {
    let token = &text[start..end];
    let scheme_at = ["https://", "http://"]
        .iter()
        .filter_map(|scheme| token.find(scheme).map(|i| (i, scheme.len())))
        .min_by_key(|(i, _)| *i);
    let Some((at, scheme_len)) = scheme_at else {
        return;
    };

    let link = token[at..].trim_end_matches(TRAILING_PUNCTUATION);
    if link.len() > scheme_len {
        spans.push(LinkSpan::new(start + at, link.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_link_in_bounds() {
        let text = "check this https://twitter.com/foo";
        let span = LinkSpan::new(11, 23);
        assert_eq!(extract_link(text, &span), Some("https://twitter.com/foo"));
    }

    #[test]
    fn test_extract_link_out_of_bounds() {
        let text = "short";
        assert_eq!(extract_link(text, &LinkSpan::new(2, 10)), None);
        assert_eq!(extract_link(text, &LinkSpan::new(2, 0)), None);
    }

    #[test]
    fn test_extract_link_rejects_split_char() {
        // "é" is two bytes; offset 1 lands inside it.
        let text = "é https://x.com";
        assert_eq!(extract_link(text, &LinkSpan::new(1, 3)), None);
    }

    #[test]
    fn test_parse_link_with_scheme() {
        let url = parse_link("https://www.nytimes.com/a?b=c#d").unwrap();
        assert_eq!(url.host_str(), Some("www.nytimes.com"));
    }

    #[test]
    fn test_parse_link_without_scheme() {
        let url = parse_link("nytimes.com/2024/article").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("nytimes.com"));
        assert_eq!(url.path(), "/2024/article");
    }

    #[test]
    fn test_parse_link_garbage() {
        assert!(parse_link("not a link").is_err());
        assert!(parse_link("http://").is_err());
    }

    #[test]
    fn test_find_link_spans() {
        let text = "see https://x.com/a and (http://nytimes.com/b). done";
        let spans = find_link_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(extract_link(text, &spans[0]), Some("https://x.com/a"));
        assert_eq!(extract_link(text, &spans[1]), Some("http://nytimes.com/b"));
    }

    #[test]
    fn test_find_link_spans_multibyte_and_end_of_text() {
        let text = "olá 👋 https://bsky.app/profile/x";
        let spans = find_link_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(
            extract_link(text, &spans[0]),
            Some("https://bsky.app/profile/x")
        );
    }

    #[test]
    fn test_find_link_spans_ignores_bare_scheme() {
        assert!(find_link_spans("https:// nothing here").is_empty());
        assert!(find_link_spans("no links at all").is_empty());
    }
}
