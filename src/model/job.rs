use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    Crawl,
    Readable,
    Media,
    Llm,
    Consolidate,
    SeoRank,
    DomainCrawl,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Per-job outcome counters (spec §4.9, §8 invariant 4):
/// `ok + failed + skipped + cancelled_inflight <= selected`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobCounters {
    pub selected: u64,
    pub ok: u64,
    pub failed: u64,
    pub skipped: u64,
    pub cancelled_inflight: u64,
    pub cap_exceeded: u64,
}

/// A durable record of one pipeline invocation (spec §3, §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub land_id: Uuid,
    pub params: serde_json::Value,
    pub status: JobStatus,
    /// 0..=100
    pub progress: u8,
    pub counters: JobCounters,
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancel_requested: bool,
    pub error_message: Option<String>,
}

impl Job {
    pub fn new(kind: JobKind, land_id: Uuid, params: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            land_id,
            params,
            status: JobStatus::Pending,
            progress: 0,
            counters: JobCounters::default(),
            result: None,
            created_at: now,
            updated_at: now,
            cancel_requested: false,
            error_message: None,
        }
    }

    /// `completed-with-failures` surfaces as `Succeeded` with non-zero
    /// `counters.failed` — never `Failed` (spec §7).
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// Parameters shared by crawl-family jobs (candidate selection filters, spec
/// §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJobParams {
    pub depth_limit: u32,
    pub job_limit: u64,
    pub http_status_filter: Option<u16>,
    pub min_relevance: Option<u64>,
}

impl Default for CrawlJobParams {
    fn default() -> Self {
        Self { depth_limit: 2, job_limit: 500, http_status_filter: None, min_relevance: None }
    }
}

pub type JobParamsMap = HashMap<String, serde_json::Value>;
