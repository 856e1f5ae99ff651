use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// One crawled URL (spec §3). `(land_id, url)` is unique.
///
/// Invariants enforced by the `Persister`/`LinkGraphExpander`, not by this
/// struct itself:
/// - `approved_at` is set exactly once per crawl attempt that reached a
///   terminal outcome; retryable transient failures leave it `None`.
/// - `http_status` is `None` only before the first attempt.
/// - `depth` is set once at insert time by the parent's depth + 1 and never
///   changes on rediscovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub id: Uuid,
    pub land_id: Uuid,
    pub domain_id: Uuid,
    pub url: String,
    pub depth: u32,
    pub http_status: Option<u16>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub canonical_url: Option<String>,
    pub raw_content: Option<String>,
    pub readable: Option<String>,
    pub word_count: u32,
    pub relevance: u64,
    pub quality_score: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<SentimentLabel>,
    pub sentiment_confidence: Option<f64>,
    pub valid_llm: Option<bool>,
    pub valid_model: Option<String>,
    pub seo_rank: Option<serde_json::Value>,
    pub content_hash: Option<String>,
    pub extraction_source: Option<String>,
    pub is_media_processed: bool,
    pub created_at: DateTime<Utc>,
    pub crawled_at: Option<DateTime<Utc>>,
    pub readable_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Expression {
    pub fn new_candidate(land_id: Uuid, domain_id: Uuid, url: impl Into<String>, depth: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            land_id,
            domain_id,
            url: url.into(),
            depth,
            http_status: None,
            title: None,
            description: None,
            language: None,
            canonical_url: None,
            raw_content: None,
            readable: None,
            word_count: 0,
            relevance: 0,
            quality_score: None,
            sentiment_score: None,
            sentiment_label: None,
            sentiment_confidence: None,
            valid_llm: None,
            valid_model: None,
            seo_rank: None,
            content_hash: None,
            extraction_source: None,
            is_media_processed: false,
            created_at: now,
            crawled_at: None,
            readable_at: None,
            approved_at: None,
            updated_at: now,
        }
    }

    /// Crawl candidate predicate (spec §3 Invariants).
    pub fn is_candidate(&self, depth_limit: u32) -> bool {
        self.approved_at.is_none() && self.depth <= depth_limit
    }

    /// Readable-refresh candidate predicate (spec §4.10).
    pub fn is_readable_refresh_candidate(&self) -> bool {
        self.http_status == Some(200) && self.approved_at.is_some() && self.readable.is_none()
    }
}

/// Atomic patch applied by `Persister::record_crawl_outcome` in one
/// transaction, including setting `approved_at = now()` (spec §4.8).
#[derive(Debug, Clone, Default)]
pub struct ExpressionPatch {
    pub http_status: Option<u16>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub canonical_url: Option<String>,
    pub raw_content: Option<String>,
    pub readable: Option<String>,
    pub word_count: Option<u32>,
    pub relevance: Option<u64>,
    pub quality_score: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<SentimentLabel>,
    pub sentiment_confidence: Option<f64>,
    pub valid_llm: Option<bool>,
    pub valid_model: Option<String>,
    pub seo_rank: Option<serde_json::Value>,
    pub content_hash: Option<String>,
    pub extraction_source: Option<String>,
    pub crawled_at: Option<DateTime<Utc>>,
    pub readable_at: Option<DateTime<Utc>>,
    pub is_media_processed: Option<bool>,
    /// Whether this patch represents a terminal outcome (success or
    /// permanent failure), which sets `approved_at`. Transient failures
    /// that exhausted retries still set this `true` (spec §7: "permanent
    /// failure on this attempt").
    pub terminal: bool,
}
