//! Process-global per-host delay tracker (spec §9: "the only shared mutable
//! data structure that the Fetcher needs"). Isolated behind one small
//! component with its own lock, as the Design Notes require.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

/// A token bucket of one: tracks the next instant a given host may be hit
/// again, plus a semaphore bounding concurrent requests to it.
struct HostState {
    next_allowed_at: Instant,
    semaphore: std::sync::Arc<Semaphore>,
}

pub struct HostLimiter {
    min_delay: Duration,
    max_concurrent_per_host: usize,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl HostLimiter {
    pub fn new(min_delay: Duration, max_concurrent_per_host: usize) -> Self {
        Self { min_delay, max_concurrent_per_host, hosts: Mutex::new(HashMap::new()) }
    }

    fn host_semaphore(&self, host: &str) -> std::sync::Arc<Semaphore> {
        let mut hosts = self.hosts.lock().unwrap();
        hosts
            .entry(host.to_string())
            .or_insert_with(|| HostState {
                next_allowed_at: Instant::now(),
                semaphore: std::sync::Arc::new(Semaphore::new(self.max_concurrent_per_host)),
            })
            .semaphore
            .clone()
    }

    /// Waits until both a per-host concurrency slot is free and the
    /// min-delay since the last request to this host has elapsed. Returns a
    /// permit that releases the concurrency slot on drop.
    pub async fn acquire(&self, host: &str) -> tokio::sync::OwnedSemaphorePermit {
        let semaphore = self.host_semaphore(host);
        let permit = semaphore.acquire_owned().await.expect("host semaphore never closed");

        let wait = {
            let mut hosts = self.hosts.lock().unwrap();
            let state = hosts.get_mut(host).expect("inserted above");
            let now = Instant::now();
            let wait = state.next_allowed_at.saturating_duration_since(now);
            state.next_allowed_at = now.max(state.next_allowed_at) + self.min_delay;
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        permit
    }
}
