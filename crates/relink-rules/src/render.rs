//! Replacement rendering: redirector links and mirror URLs.

use url::Url;

/// Redirector URL with the whole original link percent-encoded onto the base.
pub fn redirector_url(base: &str, link: &str) -> String {
    format!("{base}{}", urlencoding::encode(link))
}

/// Anchor markup wrapping `label` around `href`.
pub fn styled_link(href: &str, label: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_html(href), escape_html(label))
}

/// Swap the host of `link` for `mirror`. The host is spliced into the link
/// as written so scheme, port, path, query and fragment come through
/// byte-for-byte. `url` is the parsed form of `link`. Returns `None` if the
/// mirror is not a valid host.
pub fn mirror_url(link: &str, url: &Url, mirror: &str) -> Option<String> {
    url::Host::parse(mirror).ok()?;

    let host = url.host_str()?;
    if let Some(range) = host_range(link) {
        if link[range.clone()].eq_ignore_ascii_case(host) {
            let mut out = String::with_capacity(link.len() + mirror.len());
            out.push_str(&link[..range.start]);
            out.push_str(mirror);
            out.push_str(&link[range.end..]);
            return Some(out);
        }
    }

    // Host written in a form the parser normalized (IDN, IPv6): re-serialize.
    let mut mirrored = url.clone();
    mirrored.set_host(Some(mirror)).ok()?;
    Some(mirrored.to_string())
}

/// Byte range of the host inside a link, scheme and userinfo skipped.
fn host_range(link: &str) -> Option<std::ops::Range<usize>> {
    let start = link.find("://").map_or(0, |i| i + 3);
    let authority_len = link[start..]
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(link.len() - start);
    let authority = &link[start..start + authority_len];
    let host_start = start + authority.rfind('@').map_or(0, |i| i + 1);
    let host_len = link[host_start..start + authority_len]
        .find(':')
        .unwrap_or(start + authority_len - host_start);
    (host_len > 0).then(|| host_start..host_start + host_len)
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
