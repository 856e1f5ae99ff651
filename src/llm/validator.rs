//! LLMValidator (spec §4.6): per-job call cap, per-content-hash cache,
//! single retry on transport error, non-JSON normalized to yes/no via
//! substring match.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::adapters::LlmAdapter;
use crate::fetcher::retry::{with_backoff, BackoffPolicy};

const AFFIRMATIVE_TOKENS: &[&str] = &["yes", "true", "relevant", "match"];

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub verdict: bool,
    pub model_name: String,
    pub raw_response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Ok,
    CapExceeded,
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    pub verdict: Option<Verdict>,
}

pub struct LlmValidator {
    adapter: Arc<dyn LlmAdapter>,
    cache: Cache<String, Verdict>,
    calls_made: AtomicU64,
    call_cap: u64,
    model_name: String,
}

impl LlmValidator {
    pub fn new(adapter: Arc<dyn LlmAdapter>, call_cap: u64, model_name: impl Into<String>) -> Self {
        Self {
            adapter,
            cache: Cache::new(10_000),
            calls_made: AtomicU64::new(0),
            call_cap,
            model_name: model_name.into(),
        }
    }

    /// `content_hash` keys the cache so repeated content across re-crawls
    /// never re-spends the job's call budget (spec §4.6).
    pub async fn validate(
        &self,
        content_hash: &str,
        land_context: &str,
        title: &str,
        readable_prefix: &str,
    ) -> ValidationOutcome {
        if let Some(cached) = self.cache.get(content_hash) {
            return ValidationOutcome { status: ValidationStatus::Ok, verdict: Some(cached) };
        }

        if self.calls_made.load(Ordering::SeqCst) >= self.call_cap {
            return ValidationOutcome { status: ValidationStatus::CapExceeded, verdict: None };
        }
        self.calls_made.fetch_add(1, Ordering::SeqCst);

        let policy = BackoffPolicy { base_ms: 200, max_attempts: 2, ..Default::default() };
        let result = with_backoff(
            policy,
            |e: &crate::error::AdapterError| {
                matches!(e.kind, crate::error::AdapterErrorKind::Transient | crate::error::AdapterErrorKind::Timeout)
            },
            || self.adapter.validate(land_context, title, readable_prefix),
        )
        .await;

        let outcome = match result {
            Ok(llm_verdict) => Verdict {
                verdict: llm_verdict.is_relevant,
                model_name: self.model_name.clone(),
                raw_response: llm_verdict.raw,
            },
            Err(_) => return ValidationOutcome { status: ValidationStatus::Ok, verdict: None },
        };

        self.cache.insert(content_hash.to_string(), outcome.clone());
        ValidationOutcome { status: ValidationStatus::Ok, verdict: Some(outcome) }
    }
}

/// Normalizes a non-JSON LLM response body to a boolean verdict by
/// substring match against an affirmative-token list (spec §4.6), used by
/// `LlmAdapter` implementations that can't guarantee structured output.
pub fn parse_verdict(raw: &str) -> bool {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(verdict) = value.get("verdict").and_then(|v| v.as_str()) {
            return AFFIRMATIVE_TOKENS.contains(&verdict.to_ascii_lowercase().as_str());
        }
    }
    let lowered = raw.to_ascii_lowercase();
    AFFIRMATIVE_TOKENS.iter().any(|token| lowered.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn parses_structured_json_verdict() {
        assert!(parse_verdict(r#"{"verdict": "yes"}"#));
        assert!(!parse_verdict(r#"{"verdict": "no"}"#));
    }

    #[test]
    fn falls_back_to_substring_match_on_non_json() {
        assert!(parse_verdict("I believe this is Relevant to the topic."));
        assert!(!parse_verdict("This page is off-topic."));
    }

    struct CountingAdapter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmAdapter for CountingAdapter {
        async fn validate(&self, _land_context: &str, _title: &str, _body_prefix: &str) -> Result<crate::adapters::LlmVerdict, crate::error::AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(crate::adapters::LlmVerdict { is_relevant: true, confidence: 0.9, raw: "yes".to_string() })
        }

        async fn blend_sentiment(&self, _text_prefix: &str) -> Result<f64, crate::error::AdapterError> {
            Ok(0.0)
        }
    }

    #[tokio::test]
    async fn cap_exhaustion_yields_cap_exceeded_status_not_error() {
        let adapter = Arc::new(CountingAdapter { calls: AtomicUsize::new(0) });
        let validator = LlmValidator::new(adapter, 1, "test-model");
        let first = validator.validate("hash-a", "ctx", "title", "body").await;
        assert_eq!(first.status, ValidationStatus::Ok);
        let second = validator.validate("hash-b", "ctx", "title", "body").await;
        assert_eq!(second.status, ValidationStatus::CapExceeded);
    }

    #[tokio::test]
    async fn repeated_content_hash_hits_cache_not_call_cap() {
        let adapter = Arc::new(CountingAdapter { calls: AtomicUsize::new(0) });
        let validator = LlmValidator::new(adapter, 1, "test-model");
        validator.validate("hash-a", "ctx", "title", "body").await;
        let second = validator.validate("hash-a", "ctx", "title", "body").await;
        assert_eq!(second.status, ValidationStatus::Ok);
        assert!(second.verdict.is_some());
    }
}
