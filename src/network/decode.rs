//! Response body transcoding by declared charset.

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use std::sync::LazyLock;

/// Matches `<meta charset="...">` and the http-equiv Content-Type form.
static META_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([a-zA-Z0-9_\-:.]+)"#).unwrap()
});

/// How many leading bytes are scanned for a `<meta>` charset.
const SNIFF_LIMIT: usize = 2048;

/// Decodes a body to UTF-8 text.
///
/// The charset comes from the `Content-Type` header when present, then from a
/// `<meta>` declaration near the start of the document, and defaults to UTF-8.
/// A byte order mark always wins.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(SNIFF_LIMIT)];
    META_CHARSET_REGEX
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Encoding::for_label(m.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_utf8() {
        let text = decode_body("こんにちは".as_bytes(), None);
        assert_eq!(text, "こんにちは");
    }

    #[test]
    fn test_header_charset() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("小説家になろう");
        let text = decode_body(&bytes, Some("text/html; charset=Shift_JIS"));
        assert_eq!(text, "小説家になろう");
    }

    #[test]
    fn test_meta_charset() {
        let (body, _, _) = encoding_rs::GBK.encode("<html><head><meta charset=\"gbk\"></head><body>武侠</body></html>");
        let text = decode_body(&body, Some("text/html"));
        assert!(text.contains("武侠"));
    }

    #[test]
    fn test_http_equiv_meta() {
        let html = b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"><p>caf\xe9</p>";
        let text = decode_body(html, None);
        assert!(text.contains("café"));
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let text = decode_body(b"plain", Some("text/html; charset=klingon"));
        assert_eq!(text, "plain");
    }
}
