//! Language detection cascade (spec §4.2): declared `lang` attribute -> meta
//! tag -> statistical detection over >=200 chars -> `None`.

use scraper::{Html, Selector};

pub fn detect_language(doc: &Html, body_text: &str) -> Option<String> {
    if let Some(lang) = declared_lang_attr(doc) {
        return Some(lang);
    }
    if let Some(lang) = meta_lang(doc) {
        return Some(lang);
    }
    statistical_detect(body_text)
}

fn declared_lang_attr(doc: &Html) -> Option<String> {
    let sel = Selector::parse("html[lang]").ok()?;
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("lang"))
        .map(|s| normalize_lang(s))
}

fn meta_lang(doc: &Html) -> Option<String> {
    let sel = Selector::parse("meta[http-equiv=content-language], meta[name=language]").ok()?;
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| normalize_lang(s))
}

fn normalize_lang(raw: &str) -> String {
    raw.split(['-', '_']).next().unwrap_or(raw).trim().to_ascii_lowercase()
}

fn statistical_detect(text: &str) -> Option<String> {
    if text.chars().count() < 200 {
        return None;
    }
    whatlang::detect(text).map(|info| info.lang().code().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_declared_lang_attribute() {
        let doc = Html::parse_document("<html lang=\"fr-FR\"><body>hi</body></html>");
        assert_eq!(detect_language(&doc, "hi"), Some("fr".to_string()));
    }

    #[test]
    fn falls_back_to_meta_tag() {
        let doc = Html::parse_document(
            "<html><head><meta http-equiv=\"content-language\" content=\"de\"></head><body>hi</body></html>",
        );
        assert_eq!(detect_language(&doc, "hi"), Some("de".to_string()));
    }

    #[test]
    fn short_body_never_triggers_statistical_detection() {
        let doc = Html::parse_document("<html><body>hi</body></html>");
        assert_eq!(detect_language(&doc, "hi"), None);
    }
}
