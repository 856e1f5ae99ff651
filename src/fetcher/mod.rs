//! Fetcher (spec §4.1): bounded-concurrency HTTP GETs with timeouts,
//! retries, polite per-host delays, and cooperative cancellation.

mod host_limiter;
pub mod retry;

pub use host_limiter::HostLimiter;
pub use retry::BackoffPolicy;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{FetcherConfig, RetryPolicy};
use crate::error::{FetchError, FetchErrorKind};

#[derive(Debug, Clone)]
pub struct FetchOpts {
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_language: Option<String>,
    pub max_bytes: usize,
    pub follow_redirects: bool,
    pub max_redirects: u8,
}

impl From<&FetcherConfig> for FetchOpts {
    fn from(cfg: &FetcherConfig) -> Self {
        Self {
            timeout: Duration::from_millis(cfg.timeout_ms),
            user_agent: cfg.user_agent.clone(),
            accept_language: None,
            max_bytes: cfg.max_bytes,
            follow_redirects: true,
            max_redirects: cfg.max_redirects,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub final_url: String,
    pub http_status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub elapsed: Duration,
}

impl FetchResult {
    pub fn content_type_is_html_ish(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml")
        })
    }
}

/// Issues bounded-concurrency, retried HTTP GETs. One `Fetcher` is shared
/// across an entire job (and typically the whole process): the semaphore
/// and `HostLimiter` are the process-global shared resources called out in
/// spec §5.
pub struct Fetcher {
    client: reqwest::Client,
    global: Arc<Semaphore>,
    hosts: HostLimiter,
    retry_policy: RetryPolicy,
    backoff: BackoffPolicy,
    max_attempts: u32,
}

impl Fetcher {
    pub fn new(cfg: &FetcherConfig, retry_policy: RetryPolicy) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(if cfg.max_redirects > 0 {
                reqwest::redirect::Policy::limited(cfg.max_redirects as usize)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()?;
        Ok(Self {
            client,
            global: Arc::new(Semaphore::new(cfg.max_concurrent_global)),
            hosts: HostLimiter::new(
                Duration::from_millis(cfg.min_delay_per_host_ms),
                cfg.max_concurrent_per_host,
            ),
            retry_policy,
            backoff: BackoffPolicy { base_ms: cfg.backoff_base_ms, ..Default::default() },
            max_attempts: cfg.retry_attempts,
        })
    }

    /// Fetch `url`, retrying transient failures per the backoff policy and
    /// honoring `cancel` cooperatively between attempts and mid-flight.
    pub async fn fetch(
        &self,
        url: &str,
        opts: &FetchOpts,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, FetchError> {
        let parsed = Url::parse(url)
            .map_err(|_| FetchError::new(url, FetchErrorKind::InvalidUrl))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::new(url, FetchErrorKind::InvalidUrl));
        }
        let host = parsed.host_str().unwrap_or("").to_string();

        let policy = self.retry_policy.clone();
        let mut attempt = 1u32;
        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::new(url, FetchErrorKind::Cancelled));
            }
            let outcome = self.try_once(url, &host, opts, cancel).await;
            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    let retryable = matches!(
                        err.kind,
                        FetchErrorKind::Timeout | FetchErrorKind::Dns | FetchErrorKind::ConnectionReset
                    ) || matches!(err.kind, FetchErrorKind::HttpError(code) if policy.is_retryable_status(code));
                    if !retryable || attempt >= self.max_attempts {
                        return Err(err);
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(self.backoff.delay_for(attempt)) => {}
                        _ = cancel.cancelled() => return Err(FetchError::new(url, FetchErrorKind::Cancelled)),
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn try_once(
        &self,
        url: &str,
        host: &str,
        opts: &FetchOpts,
        cancel: &CancellationToken,
    ) -> Result<FetchResult, FetchError> {
        let _global_permit = self
            .global
            .acquire()
            .await
            .expect("global semaphore never closed");
        let _host_permit = self.hosts.acquire(host).await;

        let start = Instant::now();
        let request = self
            .client
            .get(url)
            .timeout(opts.timeout)
            .header("User-Agent", &opts.user_agent);
        let request = match &opts.accept_language {
            Some(lang) => request.header("Accept-Language", lang),
            None => request,
        };

        let response = tokio::select! {
            r = request.send() => r.map_err(|e| classify_reqwest_error(url, &e))?,
            _ = cancel.cancelled() => return Err(FetchError::new(url, FetchErrorKind::Cancelled)),
        };

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body = tokio::select! {
            b = response.bytes() => b.map_err(|e| classify_reqwest_error(url, &e))?,
            _ = cancel.cancelled() => return Err(FetchError::new(url, FetchErrorKind::Cancelled)),
        };
        if body.len() > opts.max_bytes {
            return Err(FetchError::new(url, FetchErrorKind::TooLarge));
        }

        if !(200..400).contains(&status) {
            return Err(FetchError::new(url, FetchErrorKind::HttpError(status)));
        }

        Ok(FetchResult {
            final_url,
            http_status: status,
            headers,
            body: body.to_vec(),
            content_type,
            elapsed: start.elapsed(),
        })
    }
}

fn classify_reqwest_error(url: &str, e: &reqwest::Error) -> FetchError {
    let kind = if e.is_timeout() {
        FetchErrorKind::Timeout
    } else if e.is_connect() {
        FetchErrorKind::ConnectionReset
    } else {
        FetchErrorKind::ConnectionReset
    };
    FetchError::new(url, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_schemes() {
        let _ = Url::parse("ftp://example.org/file").unwrap();
    }

    #[test]
    fn html_ish_content_type_detection() {
        let mut r = FetchResult {
            final_url: "https://x".into(),
            http_status: 200,
            headers: vec![],
            body: vec![],
            content_type: Some("text/html; charset=utf-8".into()),
            elapsed: Duration::from_millis(1),
        };
        assert!(r.content_type_is_html_ish());
        r.content_type = Some("application/json".into());
        assert!(!r.content_type_is_html_ish());
    }
}
