//! Minimal fallback strategy (spec §4.2 step 4): last resort, regex-level
//! tag stripping with no structural awareness. Always returns `Some` when
//! any text survives, since this is the end of the cascade.

use std::sync::OnceLock;

use regex::Regex;

use super::{ExtractedContent, ExtractionSource};

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</\1>|<[^>]+>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

pub fn extract(url: &str, body: &[u8]) -> Option<ExtractedContent> {
    let html = String::from_utf8_lossy(body);
    let stripped = tag_re().replace_all(&html, " ");
    let readable = whitespace_re().replace_all(stripped.trim(), " ").trim().to_string();
    if readable.is_empty() {
        return None;
    }

    Some(ExtractedContent {
        title: None,
        description: None,
        language: None,
        canonical_url: url.to_string(),
        readable,
        links: Vec::new(),
        media: Vec::new(),
        source: ExtractionSource::Minimal,
        heading_count: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_scripts() {
        let html = "<html><head><script>evil()</script></head><body><p>Hello <b>World</b></p></body></html>";
        let content = extract("https://example.org/a", html.as_bytes()).unwrap();
        assert_eq!(content.readable, "Hello World");
        assert_eq!(content.source, ExtractionSource::Minimal);
    }

    #[test]
    fn returns_none_when_nothing_survives() {
        let html = "<html><head><script>evil()</script></head><body></body></html>";
        assert!(extract("https://example.org/a", html.as_bytes()).is_none());
    }
}
