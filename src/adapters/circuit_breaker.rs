//! Consecutive-failure circuit breaker shared by all `ExternalAdapters`
//! (spec §4.12). Deliberately simple: a single atomic counter, no half-open
//! probing — a job that opens a breaker stays short-circuited for its
//! remaining lifetime rather than retrying speculatively.

use std::sync::atomic::{AtomicU32, Ordering};

pub struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    open: std::sync::atomic::AtomicBool,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self { consecutive_failures: AtomicU32::new(0), open: std::sync::atomic::AtomicBool::new(false) }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    pub fn record_failure(&self, threshold: u32) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= threshold {
            self.open.store(true, Ordering::SeqCst);
        }
    }
}
