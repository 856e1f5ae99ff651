//! Shared candidate-processing envelope (spec §4.10: "same envelope,
//! different body"). Every side pipeline implements `CandidateHandler`;
//! `JobRunner` supplies the bounded-concurrency dispatch, progress
//! publication, and cancellation handling common to all of them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::{Expression, JobCounters};
use crate::persist::Persister;

use super::progress::{PersistGate, ProgressChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    Ok,
    Failed,
    Skipped,
    CapExceeded,
    /// The external service this candidate needed is unavailable (circuit
    /// open); the caller should stop feeding this pipeline more candidates
    /// this job (spec §4.12).
    AdapterUnavailable,
}

#[async_trait]
pub trait CandidateHandler: Send + Sync {
    async fn handle(&self, candidate: Expression, cancel: &CancellationToken) -> CandidateOutcome;
}

/// Drives a `handler` over `candidates` with `concurrency` in-flight tasks
/// at once via `JoinSet`, publishing progress at least once per completion
/// (spec §4.9) and persisting `Job` progress through `gate`'s interval/
/// terminal dual gate (spec §4.11). Stops launching new tasks once `cancel`
/// fires or the handler reports `AdapterUnavailable`/`CapExceeded` (either
/// means no further candidate in this wave can usefully be processed), but
/// awaits already in-flight work. Also cancels and stops if no task
/// completes within `max_idle` of each other (spec §9 idle watchdog).
pub struct JobRunner {
    concurrency: usize,
}

impl JobRunner {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn run_wave(
        &self,
        job_id: Uuid,
        wave_depth: u32,
        candidates: Vec<Expression>,
        handler: Arc<dyn CandidateHandler>,
        progress: &ProgressChannel,
        gate: &PersistGate,
        counters: &mut JobCounters,
        cancel: &CancellationToken,
        persister: &Arc<dyn Persister>,
        max_idle: Duration,
    ) {
        let total_known = candidates.len() as u64;
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut completed = 0u64;
        let mut stop_new_dispatch = false;

        let mut pending = candidates.into_iter();
        loop {
            while tasks.len() < self.concurrency {
                if stop_new_dispatch || cancel.is_cancelled() {
                    break;
                }
                let Some(candidate) = pending.next() else { break };
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
                let handler = handler.clone();
                let cancel = cancel.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    handler.handle(candidate, &cancel).await
                });
            }

            if tasks.is_empty() {
                break;
            }

            let result = match tokio::time::timeout(max_idle, tasks.join_next()).await {
                Ok(Some(result)) => result,
                Ok(None) => break,
                Err(_elapsed) => {
                    cancel.cancel();
                    break;
                }
            };
            completed += 1;
            match result {
                Ok(CandidateOutcome::Ok) => counters.ok += 1,
                Ok(CandidateOutcome::Failed) => counters.failed += 1,
                Ok(CandidateOutcome::Skipped) => counters.skipped += 1,
                Ok(CandidateOutcome::CapExceeded) => {
                    counters.cap_exceeded += 1;
                    stop_new_dispatch = true;
                }
                Ok(CandidateOutcome::AdapterUnavailable) => {
                    counters.skipped += 1;
                    stop_new_dispatch = true;
                }
                Err(_panic) => counters.failed += 1,
            }

            progress.publish(job_id, wave_depth, completed, total_known, counters.clone());
            if gate.should_persist(false) {
                persist_progress(persister, job_id, completed, total_known, counters).await;
            }
        }
    }
}

async fn persist_progress(persister: &Arc<dyn Persister>, job_id: Uuid, completed: u64, total_known: u64, counters: &JobCounters) {
    let Ok(mut job) = persister.get_job(job_id).await else { return };
    job.counters = counters.clone();
    job.progress = if total_known == 0 { 0 } else { ((completed * 100) / total_known).min(100) as u8 };
    job.updated_at = chrono::Utc::now();
    let _ = persister.upsert_job(job).await;
}
