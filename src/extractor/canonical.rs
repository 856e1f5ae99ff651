//! Canonical URL resolution (spec §4.2): `<link rel=canonical>` if present,
//! else the final (post-redirect) URL.

use scraper::{Html, Selector};

pub fn canonical_url(doc: &Html, final_url: &str) -> String {
    let Ok(sel) = Selector::parse("link[rel=canonical]") else {
        return final_url.to_string();
    };
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| url::Url::parse(final_url).ok()?.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| final_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_declared_canonical_when_present() {
        let doc = Html::parse_document(
            "<html><head><link rel=\"canonical\" href=\"https://example.org/canon\"></head></html>",
        );
        assert_eq!(canonical_url(&doc, "https://example.org/a?utm=1"), "https://example.org/canon");
    }

    #[test]
    fn falls_back_to_final_url() {
        let doc = Html::parse_document("<html><head></head></html>");
        assert_eq!(canonical_url(&doc, "https://example.org/a"), "https://example.org/a");
    }
}
