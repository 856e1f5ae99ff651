//! ExternalAdapters (spec §4.12): trait objects for the four optional
//! external services, each wrapped in the shared retry helper and a circuit
//! breaker, grounded in the teacher's `tools::search::engines` adapter
//! pattern (one trait per engine, block/error detection promoted to a typed
//! error rather than a bare string).

mod circuit_breaker;

pub use circuit_breaker::CircuitBreaker;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::AdapterConfig;
use crate::error::AdapterError;
use crate::fetcher::retry::{with_backoff, BackoffPolicy};

#[derive(Debug, Clone)]
pub struct ArchiveSnapshot {
    pub snapshot_url: String,
    pub fetched_at: DateTime<Utc>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait ArchiveAdapter: Send + Sync {
    async fn get_snapshot(
        &self,
        url: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<ArchiveSnapshot, AdapterError>;
}

#[derive(Debug, Clone)]
pub struct SearchResultItem {
    pub url: String,
    pub title: String,
    pub snippet: Option<String>,
}

#[async_trait]
pub trait SearchAdapter: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResultItem>, AdapterError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmVerdict {
    pub is_relevant: bool,
    pub confidence: f64,
    pub raw: String,
}

#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn validate(&self, land_context: &str, title: &str, body_prefix: &str) -> Result<LlmVerdict, AdapterError>;

    /// Simple average blend with a lexicon sentiment score (spec §4.5).
    async fn blend_sentiment(&self, text_prefix: &str) -> Result<f64, AdapterError>;
}

#[derive(Debug, Clone)]
pub struct SeoMetrics {
    pub backlinks: u64,
    pub domain_authority: Option<f64>,
}

#[async_trait]
pub trait SeoAdapter: Send + Sync {
    async fn metrics_for(&self, domain: &str) -> Result<SeoMetrics, AdapterError>;
}

/// Wraps an arbitrary adapter call with retry-on-transient and a circuit
/// breaker: `K` consecutive errors open the circuit and short-circuit
/// subsequent calls with `AdapterErrorKind::CircuitOpen` until it cools down
/// (spec §4.12).
pub async fn with_retry_and_breaker<T, F, Fut>(
    breaker: &CircuitBreaker,
    cfg: &AdapterConfig,
    op: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AdapterError>>,
{
    if breaker.is_open() {
        return Err(AdapterError::circuit_open());
    }
    let policy = BackoffPolicy { base_ms: 300, max_attempts: 2, ..Default::default() };
    let result = with_backoff(
        policy,
        |e: &AdapterError| matches!(e.kind, crate::error::AdapterErrorKind::Transient | crate::error::AdapterErrorKind::Timeout),
        op,
    )
    .await;
    match &result {
        Ok(_) => breaker.record_success(),
        Err(_) => breaker.record_failure(cfg.circuit_breaker_threshold),
    }
    result
}

pub struct MockArchiveAdapter {
    snapshot: ArchiveSnapshot,
}

impl MockArchiveAdapter {
    pub fn with_snapshot(snapshot: ArchiveSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ArchiveAdapter for MockArchiveAdapter {
    async fn get_snapshot(&self, _url: &str, _at: Option<DateTime<Utc>>) -> Result<ArchiveSnapshot, AdapterError> {
        Ok(self.snapshot.clone())
    }
}

/// Wayback Machine-style archive adapter: GETs a snapshot redirector
/// endpoint, grounded in the teacher's reqwest-based engine adapters.
pub struct HttpArchiveAdapter {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpArchiveAdapter {
    pub fn new(endpoint: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl ArchiveAdapter for HttpArchiveAdapter {
    async fn get_snapshot(&self, url: &str, _at: Option<DateTime<Utc>>) -> Result<ArchiveSnapshot, AdapterError> {
        let request_url = format!("{}/{}", self.endpoint.trim_end_matches('/'), url);
        let response = self
            .client
            .get(&request_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AdapterError::transient(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AdapterError::transient(format!("archive status {}", response.status())));
        }
        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| AdapterError::transient(e.to_string()))?
            .to_vec();
        Ok(ArchiveSnapshot { snapshot_url: final_url, fetched_at: Utc::now(), body })
    }
}
