//! Outbound link/media discovery, resolved against the canonical base
//! (spec §4.2). Shared by the primary and heuristic strategies.

use scraper::{Html, Selector};

use super::{DiscoveredLink, DiscoveredMedia};

pub fn discover_links(doc: &Html, base: &str) -> Vec<DiscoveredLink> {
    let Ok(sel) = Selector::parse("a[href]") else { return Vec::new() };
    let Ok(base_url) = url::Url::parse(base) else { return Vec::new() };

    let mut seen = std::collections::HashSet::new();
    doc.select(&sel)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let resolved = base_url.join(href).ok()?;
            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                return None;
            }
            let mut resolved = resolved;
            resolved.set_fragment(None);
            let url = resolved.to_string();
            if !seen.insert(url.clone()) {
                return None;
            }
            let anchor_text = el.text().collect::<Vec<_>>().join(" ").trim().to_string();
            Some(DiscoveredLink {
                url,
                anchor_text: if anchor_text.is_empty() { None } else { Some(anchor_text) },
            })
        })
        .collect()
}

pub fn discover_media(doc: &Html, base: &str) -> Vec<DiscoveredMedia> {
    let Ok(sel) = Selector::parse("img[src], img[data-src], img[data-original]") else {
        return Vec::new();
    };
    let Ok(base_url) = url::Url::parse(base) else { return Vec::new() };

    let mut seen = std::collections::HashSet::new();
    doc.select(&sel)
        .filter_map(|el| {
            let src = el
                .value()
                .attr("src")
                .or_else(|| el.value().attr("data-src"))
                .or_else(|| el.value().attr("data-original"))?;
            let resolved = base_url.join(src).ok()?;
            let url = resolved.to_string();
            seen.insert(url.clone()).then_some(DiscoveredMedia { url })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links_and_dedupes() {
        let doc = Html::parse_document(
            "<html><body><a href=\"/b\">B</a><a href=\"/b\">B again</a><a href=\"https://external.com/x\">X</a><a href=\"javascript:void(0)\">skip</a></body></html>",
        );
        let links = discover_links(&doc, "https://example.org/a");
        assert_eq!(links.len(), 2);
        assert!(links.iter().any(|l| l.url == "https://example.org/b"));
        assert!(links.iter().any(|l| l.url == "https://external.com/x"));
    }

    #[test]
    fn discovers_lazy_loaded_media() {
        let doc = Html::parse_document(
            "<html><body><img data-src=\"/img/one.png\"><img src=\"/img/two.png\"></body></html>",
        );
        let media = discover_media(&doc, "https://example.org/a");
        assert_eq!(media.len(), 2);
    }
}
