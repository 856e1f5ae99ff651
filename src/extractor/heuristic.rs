//! Heuristic fallback strategy (spec §4.2 step 3): forgiving boilerplate
//! stripping when `readability` yields too little, grounded in the teacher's
//! `heuristic_main_extraction` pass in `rust_scraper::clean`.

use scraper::{Html, Selector};

use super::{canonical, language, links, DiscoveredLink, DiscoveredMedia, ExtractedContent, ExtractionSource};

const MAIN_SELECTORS: &[&str] = &["article", "main", "[role=main]", "#content", ".content", ".post-body"];

const BOILERPLATE_SELECTORS: &[&str] =
    &["nav", "header", "footer", "aside", "form", "script", "style", "noscript", ".sidebar", ".advert", ".ads"];

pub fn extract(url: &str, body: &[u8]) -> Option<ExtractedContent> {
    let html = String::from_utf8_lossy(body).into_owned();
    let doc = Html::parse_document(&html);

    let readable = main_region_text(&doc).unwrap_or_else(|| body_text_minus_boilerplate(&doc));
    if readable.trim().is_empty() {
        return None;
    }

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|s| !s.is_empty());

    let canonical_url = canonical::canonical_url(&doc, url);
    let lang = language::detect_language(&doc, &readable);
    let discovered_links: Vec<DiscoveredLink> = links::discover_links(&doc, &canonical_url);
    let discovered_media: Vec<DiscoveredMedia> = links::discover_media(&doc, &canonical_url);
    let heading_count = count_headings(&doc);

    Some(ExtractedContent {
        title,
        description: None,
        language: lang,
        canonical_url,
        readable,
        links: discovered_links,
        media: discovered_media,
        source: ExtractionSource::Heuristic,
        heading_count,
    })
}

fn count_headings(doc: &Html) -> u32 {
    let Ok(sel) = Selector::parse("h1, h2") else { return 0 };
    doc.select(&sel).count() as u32
}

fn main_region_text(doc: &Html) -> Option<String> {
    for css in MAIN_SELECTORS {
        if let Ok(sel) = Selector::parse(css) {
            let text: String = doc
                .select(&sel)
                .flat_map(|el| el.text())
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !text.trim().is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn body_text_minus_boilerplate(doc: &Html) -> String {
    let boilerplate: std::collections::HashSet<_> = BOILERPLATE_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .flat_map(|sel| doc.select(&sel).map(|el| el.id()))
        .collect();

    let Ok(body_sel) = Selector::parse("body") else { return String::new() };
    let Some(body) = doc.select(&body_sel).next() else { return String::new() };

    body.descendants()
        .filter_map(|node| node.value().as_text().map(|t| (node.parent().map(|p| p.id()), t)))
        .filter(|(parent, _)| parent.map(|id| !boilerplate.contains(&id)).unwrap_or(true))
        .map(|(_, t)| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_region_over_full_body() {
        let html = "<html><body><nav>menu menu menu</nav><article><p>real content here</p></article><footer>copy</footer></body></html>";
        let content = extract("https://example.org/a", html.as_bytes()).unwrap();
        assert!(content.readable.contains("real content here"));
        assert!(!content.readable.contains("menu"));
    }

    #[test]
    fn strips_boilerplate_when_no_main_region_present() {
        let html = "<html><body><nav>skip this nav</nav><p>keep this paragraph</p></body></html>";
        let content = extract("https://example.org/a", html.as_bytes()).unwrap();
        assert!(content.readable.contains("keep this paragraph"));
        assert!(!content.readable.contains("skip this nav"));
    }

    #[test]
    fn returns_none_for_empty_body() {
        let html = "<html><body></body></html>";
        assert!(extract("https://example.org/a", html.as_bytes()).is_none());
    }
}
