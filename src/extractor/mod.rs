//! ContentExtractor (spec §4.2): the four-strategy fallback cascade.

mod canonical;
mod heuristic;
mod language;
mod links;
mod minimal;
mod primary;

pub use language::detect_language;

use crate::adapters::ArchiveAdapter;
use crate::config::ExtractorConfig;
use crate::error::{ExtractionError, ExtractionErrorKind};
use crate::fetcher::FetchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Primary,
    Archive,
    Heuristic,
    Minimal,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::Primary => "primary",
            ExtractionSource::Archive => "archive",
            ExtractionSource::Heuristic => "heuristic",
            ExtractionSource::Minimal => "minimal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub url: String,
    pub anchor_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMedia {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub canonical_url: String,
    pub readable: String,
    pub links: Vec<DiscoveredLink>,
    pub media: Vec<DiscoveredMedia>,
    pub source: ExtractionSource,
    /// Count of `h1`/`h2` elements in the parsed document; `0` when the
    /// strategy never had a DOM to count against (the minimal fallback).
    pub heading_count: u32,
}

impl ExtractedContent {
    pub fn word_count(&self) -> u32 {
        self.readable.split_whitespace().count() as u32
    }

    fn usable(&self, min_chars: usize) -> bool {
        self.readable.chars().count() >= min_chars
    }
}

/// Cascading fallback extractor: primary -> archive -> heuristic -> minimal.
/// Each strategy runs only if the previous produced fewer than
/// `min_readable_chars` of body text (spec §4.2, §8 boundary behavior: an
/// empty-body fetch must cascade through *every* strategy before
/// `content_unusable` is raised).
pub struct ContentExtractor {
    cfg: ExtractorConfig,
    archive: Option<std::sync::Arc<dyn ArchiveAdapter>>,
}

impl ContentExtractor {
    pub fn new(cfg: ExtractorConfig, archive: Option<std::sync::Arc<dyn ArchiveAdapter>>) -> Self {
        Self { cfg, archive }
    }

    /// `fetch_result` is `None` when the fetch itself failed (e.g. a 404):
    /// the primary strategy is then skipped since there is no body to parse,
    /// and the cascade starts at the archive fallback.
    pub async fn extract(
        &self,
        url: &str,
        fetch_result: Option<&FetchResult>,
    ) -> Result<ExtractedContent, ExtractionError> {
        let min_chars = self.cfg.min_readable_chars;
        let mut best: Option<ExtractedContent> = None;
        // The most recently obtained raw bytes, fed to the heuristic/minimal
        // strategies — preferring an archived snapshot over the original
        // fetch once one has been retrieved, since it's the freshest source.
        let mut raw_bytes: Option<Vec<u8>> = fetch_result.map(|fr| fr.body.clone());

        if let Some(fr) = fetch_result {
            if let Some(content) = primary::extract(url, fr) {
                if content.usable(min_chars) {
                    return Ok(content);
                }
                best = Some(content);
            }
        }

        if self.cfg.enable_archive_fallback {
            if let Some(archive) = &self.archive {
                if let Ok(snapshot) = archive.get_snapshot(url, None).await {
                    raw_bytes = Some(snapshot.body.clone());
                    let fr = FetchResult {
                        final_url: snapshot.snapshot_url,
                        http_status: 200,
                        headers: vec![],
                        body: snapshot.body,
                        content_type: Some("text/html".to_string()),
                        elapsed: std::time::Duration::ZERO,
                    };
                    if let Some(content) = primary::extract(url, &fr).map(|mut c| {
                        c.source = ExtractionSource::Archive;
                        c
                    }) {
                        if content.usable(min_chars) {
                            return Ok(content);
                        }
                        best = pick_longer(best, Some(content));
                    }
                }
            }
        }

        if self.cfg.enable_heuristic_fallback {
            if let Some(bytes) = &raw_bytes {
                if let Some(content) = heuristic::extract(url, bytes) {
                    if content.usable(min_chars) {
                        return Ok(content);
                    }
                    best = pick_longer(best, Some(content));
                }
            }
        }

        if let Some(bytes) = &raw_bytes {
            if let Some(content) = minimal::extract(url, bytes) {
                // Minimal is the last resort: accept it even under
                // `min_readable_chars` if it's the only thing we got, but
                // still prefer a longer earlier-stage attempt.
                best = pick_longer(best, Some(content));
            }
        }

        match best {
            Some(content) if content.usable(min_chars) || !content.readable.is_empty() => Ok(content),
            _ => Err(ExtractionError { url: url.to_string(), kind: ExtractionErrorKind::ContentUnusable }),
        }
    }
}

impl ContentExtractor {
    /// Re-runs the cascade over previously stored raw bytes, without a live
    /// fetch (spec §4.10 readable-refresh: re-parse, never re-fetch).
    pub async fn extract_from_bytes(&self, url: &str, body: &[u8]) -> Result<ExtractedContent, ExtractionError> {
        let synthetic = FetchResult {
            final_url: url.to_string(),
            http_status: 200,
            headers: vec![],
            body: body.to_vec(),
            content_type: Some("text/html".to_string()),
            elapsed: std::time::Duration::ZERO,
        };
        self.extract(url, Some(&synthetic)).await
    }
}

fn pick_longer(a: Option<ExtractedContent>, b: Option<ExtractedContent>) -> Option<ExtractedContent> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.readable.len() > a.readable.len() { b } else { a }),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ArchiveSnapshot, MockArchiveAdapter};

    fn fetch_result(body: &str) -> FetchResult {
        FetchResult {
            final_url: "https://example.org/a".to_string(),
            http_status: 200,
            headers: vec![],
            body: body.as_bytes().to_vec(),
            content_type: Some("text/html".to_string()),
            elapsed: std::time::Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn primary_succeeds_when_body_is_long_enough() {
        let html = format!(
            "<html><head><title>T</title></head><body><p>{}</p></body></html>",
            "word ".repeat(200)
        );
        let extractor = ContentExtractor::new(ExtractorConfig { min_readable_chars: 100, ..Default::default() }, None);
        let fr = fetch_result(&html);
        let result = extractor.extract("https://example.org/a", Some(&fr)).await.unwrap();
        assert_eq!(result.source, ExtractionSource::Primary);
        assert!(result.word_count() > 100);
    }

    #[tokio::test]
    async fn falls_back_to_archive_on_thin_primary_body() {
        let thin = "<html><body><p>too short</p></body></html>";
        let archived = format!(
            "<html><head><title>Archived</title></head><body><p>{}</p></body></html>",
            "content ".repeat(200)
        );
        let archive = MockArchiveAdapter::with_snapshot(ArchiveSnapshot {
            snapshot_url: "https://archive.example/snap/a".to_string(),
            fetched_at: chrono::Utc::now(),
            body: archived.into_bytes(),
        });
        let extractor = ContentExtractor::new(
            ExtractorConfig { min_readable_chars: 100, ..Default::default() },
            Some(std::sync::Arc::new(archive)),
        );
        let fr = fetch_result(thin);
        let result = extractor.extract("https://example.org/a", Some(&fr)).await.unwrap();
        assert_eq!(result.source, ExtractionSource::Archive);
    }

    #[tokio::test]
    async fn no_fetch_result_goes_straight_to_archive() {
        let archived = format!("<html><body><p>{}</p></body></html>", "x ".repeat(200));
        let archive = MockArchiveAdapter::with_snapshot(ArchiveSnapshot {
            snapshot_url: "https://archive.example/snap/a".to_string(),
            fetched_at: chrono::Utc::now(),
            body: archived.into_bytes(),
        });
        let extractor = ContentExtractor::new(
            ExtractorConfig { min_readable_chars: 100, ..Default::default() },
            Some(std::sync::Arc::new(archive)),
        );
        let result = extractor.extract("https://example.org/missing", None).await.unwrap();
        assert_eq!(result.source, ExtractionSource::Archive);
    }

    #[tokio::test]
    async fn all_strategies_exhausted_yields_content_unusable() {
        let extractor = ContentExtractor::new(ExtractorConfig { min_readable_chars: 100, ..Default::default() }, None);
        let result = extractor.extract("https://example.org/empty", None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn identical_fetch_result_yields_identical_content() {
        let html = format!("<html><head><title>T</title></head><body><p>{}</p></body></html>", "word ".repeat(200));
        let extractor = ContentExtractor::new(ExtractorConfig { min_readable_chars: 100, ..Default::default() }, None);
        let fr = fetch_result(&html);
        let a = extractor.extract("https://example.org/a", Some(&fr)).await.unwrap();
        let b = extractor.extract("https://example.org/a", Some(&fr)).await.unwrap();
        assert_eq!(a, b);
    }
}
