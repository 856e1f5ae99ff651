//! Shared helpers used by more than one side pipeline.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::extractor::ExtractedContent;
use crate::lemma;
use crate::model::{Expression, ExpressionPatch, LandDictionary};
use crate::scoring::quality::{self, QualityInputs};

/// Deterministic, non-cryptographic content fingerprint used for
/// duplicate-detection and the LLM validator's per-content-hash cache.
pub fn content_hash(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Builds the `ExpressionPatch` for a successful extraction: scores the
/// content against the Land's dictionary and heuristic quality blocks, and
/// flags duplicate content within the land by content hash.
pub fn patch_for_extracted_content(
    content: &ExtractedContent,
    http_status: u16,
    elapsed: std::time::Duration,
    content_type_is_html_ish: bool,
    outbound_link_count: u32,
    dict: &LandDictionary,
    is_duplicate: bool,
    raw_body: Option<&[u8]>,
) -> ExpressionPatch {
    let hash = content_hash(&content.readable);
    let title = content.title.clone().unwrap_or_default();
    let description = content.description.clone().unwrap_or_default();
    let language = content.language.clone().unwrap_or_else(|| "en".to_string());

    let relevance = lemma::relevance::score(&title, &description, &content.readable, dict, &language);

    let title_lemma_overlap = lemma_overlap_ratio(&title, &content.readable, &language);
    let quality = quality::score(&QualityInputs {
        http_status,
        elapsed,
        content_type_is_html_ish,
        has_title: content.title.is_some(),
        heading_density: heading_density(content.heading_count),
        paragraph_count: content.readable.split("\n\n").filter(|p| !p.trim().is_empty()).count() as u32,
        word_count: content.word_count(),
        media_count: content.media.len() as u32,
        outbound_link_count,
        title_body_lemma_overlap: title_lemma_overlap,
        has_canonical: !content.canonical_url.is_empty(),
        language_detected: content.language.is_some(),
        is_duplicate_content_hash: is_duplicate,
    });

    ExpressionPatch {
        http_status: Some(http_status),
        title: content.title.clone(),
        description: content.description.clone(),
        language: content.language.clone(),
        canonical_url: Some(content.canonical_url.clone()),
        raw_content: raw_body.map(|b| String::from_utf8_lossy(b).into_owned()),
        readable: Some(content.readable.clone()),
        word_count: Some(content.word_count()),
        relevance: Some(relevance),
        quality_score: Some(quality),
        content_hash: Some(hash),
        extraction_source: Some(content.source.as_str().to_string()),
        crawled_at: Some(chrono::Utc::now()),
        readable_at: Some(chrono::Utc::now()),
        terminal: true,
        ..Default::default()
    }
}

/// Full structure credit at 3 or more `h1`/`h2` elements, scaled linearly
/// below that; a body with no headings at all scores 0.
fn heading_density(heading_count: u32) -> f64 {
    (heading_count as f64 / 3.0).min(1.0)
}

fn lemma_overlap_ratio(title: &str, body: &str, _language: &str) -> f64 {
    let title_words: std::collections::HashSet<String> = title.split_whitespace().map(|w| w.to_lowercase()).collect();
    if title_words.is_empty() {
        return 0.0;
    }
    let body_words: std::collections::HashSet<String> = body.split_whitespace().map(|w| w.to_lowercase()).collect();
    let overlap = title_words.intersection(&body_words).count();
    overlap as f64 / title_words.len() as f64
}

/// Patch recorded for a permanent failure (spec §7: "permanent failure on
/// this attempt" still sets `approved_at`).
pub fn patch_for_permanent_failure(http_status: Option<u16>) -> ExpressionPatch {
    ExpressionPatch { http_status, terminal: true, ..Default::default() }
}

pub fn is_duplicate_hash(candidates: &[Expression], hash: &str, excluding: uuid::Uuid) -> bool {
    candidates.iter().any(|e| e.id != excluding && e.content_hash.as_deref() == Some(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable_for_identical_text() {
        assert_eq!(content_hash("hello world"), content_hash("hello world"));
    }

    #[test]
    fn content_hash_differs_for_different_text() {
        assert_ne!(content_hash("hello"), content_hash("world"));
    }

    #[test]
    fn heading_density_saturates_at_three_headings() {
        assert_eq!(heading_density(0), 0.0);
        assert!((heading_density(1) - (1.0 / 3.0)).abs() < 1e-9);
        assert_eq!(heading_density(3), 1.0);
        assert_eq!(heading_density(10), 1.0);
    }
}
