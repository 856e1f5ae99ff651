//! Primary parse strategy (spec §4.2 step 1): structured extraction of the
//! fetched HTML body via `scraper` + `readability` + `html2md`, grounded in
//! the teacher's `rust_scraper::clean::extract_clean_content` pipeline.

use scraper::{Html, Selector};

use super::{canonical, language, links, DiscoveredLink, DiscoveredMedia, ExtractedContent, ExtractionSource};
use crate::fetcher::FetchResult;

pub fn extract(url: &str, fetch_result: &FetchResult) -> Option<ExtractedContent> {
    let html = String::from_utf8_lossy(&fetch_result.body).into_owned();
    let base = url::Url::parse(&fetch_result.final_url).ok()?;
    let doc = Html::parse_document(&html);

    let title = select_text(&doc, "title").or_else(|| meta_content(&doc, "og:title"));
    let description = meta_content(&doc, "description").or_else(|| meta_content(&doc, "og:description"));

    let readable = readability_markdown(&html, &base).unwrap_or_default();
    let body_for_lang = if readable.is_empty() { strip_tags(&doc) } else { readable.clone() };
    let lang = language::detect_language(&doc, &body_for_lang);
    let canonical_url = canonical::canonical_url(&doc, &fetch_result.final_url);
    let discovered_links: Vec<DiscoveredLink> = links::discover_links(&doc, &canonical_url);
    let discovered_media: Vec<DiscoveredMedia> = links::discover_media(&doc, &canonical_url);
    let heading_count = count_headings(&doc);

    Some(ExtractedContent {
        title,
        description,
        language: lang,
        canonical_url,
        readable,
        links: discovered_links,
        media: discovered_media,
        source: ExtractionSource::Primary,
        heading_count,
    })
}

fn count_headings(doc: &Html) -> u32 {
    let Ok(sel) = Selector::parse("h1, h2") else { return 0 };
    doc.select(&sel).count() as u32
}

fn readability_markdown(html: &str, base: &url::Url) -> Option<String> {
    let mut reader = std::io::Cursor::new(html.as_bytes());
    match readability::extractor::extract(&mut reader, base) {
        Ok(product) => Some(html2md::parse_html(&product.content)),
        Err(_) => None,
    }
}

fn select_text(doc: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    let text = doc.select(&sel).next()?.text().collect::<Vec<_>>().join(" ");
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn meta_content(doc: &Html, name: &str) -> Option<String> {
    let css = format!("meta[name='{name}'], meta[property='{name}']");
    let sel = Selector::parse(&css).ok()?;
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn strip_tags(doc: &Html) -> String {
    doc.root_element().text().collect::<Vec<_>>().join(" ")
}
