//! Config surface (spec §6), loaded `file -> env var -> hard default`,
//! mirroring the teacher's `ShadowConfig` file-with-env-fallback pattern.
//!
//! Loaded once at process start and threaded through as a `Context` value
//! (spec §9 Design Notes: "process-wide singletons become a `Context` value
//! threaded through components").

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub max_concurrent_global: usize,
    pub max_concurrent_per_host: usize,
    pub min_delay_per_host_ms: u64,
    pub timeout_ms: u64,
    pub max_bytes: usize,
    pub user_agent: String,
    pub max_redirects: u8,
    pub retry_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_global: env_or("LANDCRAWL_FETCH_MAX_CONCURRENT", 32),
            max_concurrent_per_host: env_or("LANDCRAWL_FETCH_MAX_CONCURRENT_PER_HOST", 2),
            min_delay_per_host_ms: env_or("LANDCRAWL_FETCH_MIN_DELAY_MS", 250),
            timeout_ms: env_or("LANDCRAWL_FETCH_TIMEOUT_MS", 15_000),
            max_bytes: env_or("LANDCRAWL_FETCH_MAX_BYTES", 10 * 1024 * 1024),
            user_agent: std::env::var("LANDCRAWL_USER_AGENT")
                .unwrap_or_else(|_| "landcrawl-engine/0.1".to_string()),
            max_redirects: env_or("LANDCRAWL_FETCH_MAX_REDIRECTS", 5),
            retry_attempts: env_or("LANDCRAWL_FETCH_RETRY_ATTEMPTS", 3),
            backoff_base_ms: env_or("LANDCRAWL_FETCH_BACKOFF_BASE_MS", 500),
        }
    }
}

/// Which HTTP status codes are retryable vs permanent (SPEC_FULL Open
/// Question 1). Default: 5xx + 408 + 429 retryable, everything else
/// permanent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub retryable_4xx: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retryable_4xx: vec![408, 429] }
    }
}

impl RetryPolicy {
    pub fn is_retryable_status(&self, code: u16) -> bool {
        (500..600).contains(&code) || self.retryable_4xx.contains(&code)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub min_readable_chars: usize,
    pub enable_archive_fallback: bool,
    pub enable_heuristic_fallback: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_readable_chars: env_or("LANDCRAWL_MIN_READABLE_CHARS", 400),
            enable_archive_fallback: env_or("LANDCRAWL_ENABLE_ARCHIVE_FALLBACK", true),
            enable_heuristic_fallback: env_or("LANDCRAWL_ENABLE_HEURISTIC_FALLBACK", true),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub wave_size_limit: u64,
    pub per_job_concurrency: usize,
    pub progress_publish_ms: u64,
    pub max_idle_ms: u64,
    pub cancel_grace_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            wave_size_limit: env_or("LANDCRAWL_WAVE_SIZE_LIMIT", 500),
            per_job_concurrency: env_or("LANDCRAWL_PER_JOB_CONCURRENCY", 8),
            progress_publish_ms: env_or("LANDCRAWL_PROGRESS_PUBLISH_MS", 250),
            max_idle_ms: env_or("LANDCRAWL_MAX_IDLE_MS", 10 * 60 * 1000),
            cancel_grace_ms: env_or("LANDCRAWL_CANCEL_GRACE_MS", 5_000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub sentiment_low_confidence_threshold: f64,
    pub sentiment_languages: Vec<String>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            sentiment_low_confidence_threshold: env_or(
                "LANDCRAWL_SENTIMENT_LOW_CONF_THRESHOLD",
                0.4,
            ),
            sentiment_languages: std::env::var("LANDCRAWL_SENTIMENT_LANGUAGES")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["en".to_string(), "fr".to_string()]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub archive_endpoint: Option<String>,
    pub search_endpoint: Option<String>,
    pub llm_endpoint: Option<String>,
    pub llm_api_key: Option<String>,
    pub seo_endpoint: Option<String>,
    pub llm_call_cap_per_job: u64,
    pub circuit_breaker_threshold: u32,
    pub adapter_timeout_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            archive_endpoint: std::env::var("LANDCRAWL_ARCHIVE_ENDPOINT").ok(),
            search_endpoint: std::env::var("LANDCRAWL_SEARCH_ENDPOINT").ok(),
            llm_endpoint: std::env::var("LANDCRAWL_LLM_ENDPOINT").ok(),
            llm_api_key: std::env::var("LANDCRAWL_LLM_API_KEY").ok(),
            seo_endpoint: std::env::var("LANDCRAWL_SEO_ENDPOINT").ok(),
            llm_call_cap_per_job: env_or("LANDCRAWL_LLM_CALL_CAP", 200),
            circuit_breaker_threshold: env_or("LANDCRAWL_CIRCUIT_BREAKER_THRESHOLD", 5),
            adapter_timeout_ms: env_or("LANDCRAWL_ADAPTER_TIMEOUT_MS", 10_000),
        }
    }
}

/// Host-pattern rewrite map consumed by the LinkGraphExpander (spec §4.7).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    pub rules: HashMap<String, HeuristicRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicRule {
    pub capture_regex: String,
    pub template: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub retry_policy: RetryPolicyConfig,
    pub extractor: ExtractorConfig,
    pub scheduler: SchedulerConfig,
    pub scorers: ScorerConfig,
    pub adapters: AdapterConfig,
    pub heuristics: HeuristicsConfig,
}

/// `RetryPolicy` re-expressed as a serde-friendly shape for the `[retry_policy]`
/// TOML table; converted to `RetryPolicy` via `Config::retry_policy()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetryPolicyConfig {
    pub retryable_4xx: Option<Vec<u16>>,
}

impl Config {
    /// Load order: `path` (if it exists) -> env-var fallbacks baked into each
    /// section's `Default` -> hard defaults. Missing file or parse error both
    /// fall back to defaults (logged), matching the teacher's
    /// `load_shadow_config` behavior.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "config loaded");
                    cfg
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match &self.retry_policy.retryable_4xx {
            Some(codes) => RetryPolicy { retryable_4xx: codes.clone() },
            None => RetryPolicy::default(),
        }
    }
}
