//! Scheduler (spec §4.9-§4.12): the `Engine` wires the shared fetcher,
//! extractor, scorers, adapters, and persister into one shared-state value
//! (grounded in the teacher's `AppState` pattern: `Clone`, `Arc` fields, a
//! `new()` constructor plus `with_*` builders for optional adapters) and
//! dispatches a `Job` to the pipeline matching its `JobKind`.

pub mod pipeline;
pub mod pipelines;
pub mod progress;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapters::{ArchiveAdapter, CircuitBreaker, LlmAdapter, SeoAdapter};
use crate::config::Config;
use crate::error::PersistError;
use crate::extractor::ContentExtractor;
use crate::fetcher::{FetchOpts, Fetcher};
use crate::lemma;
use crate::linkgraph::LinkGraphExpander;
use crate::llm::LlmValidator;
use crate::media::MediaAnalyzer;
use crate::model::{Job, JobCounters, JobKind, JobStatus};
use crate::persist::Persister;

use pipeline::{CandidateHandler, JobRunner};
use pipelines::{
    ConsolidateHandler, CrawlCandidateHandler, DomainCrawlRunner, HeuristicUpdateHandler, LlmBatchHandler,
    MediaAnalysisHandler, MergeStrategy, ReadableRefreshHandler, SeoHandler,
};
use progress::{PersistGate, ProgressChannel};

#[derive(Clone)]
pub struct Engine {
    pub config: Arc<Config>,
    pub persister: Arc<dyn Persister>,
    pub fetcher: Arc<Fetcher>,
    pub extractor: Arc<ContentExtractor>,
    pub archive_adapter: Option<Arc<dyn ArchiveAdapter>>,
    pub llm_adapter: Option<Arc<dyn LlmAdapter>>,
    pub seo_adapter: Option<Arc<dyn SeoAdapter>>,
    pub llm_breaker: Arc<CircuitBreaker>,
    pub seo_breaker: Arc<CircuitBreaker>,
}

impl Engine {
    pub fn new(config: Config, persister: Arc<dyn Persister>) -> anyhow::Result<Self> {
        let fetcher = Arc::new(Fetcher::new(&config.fetcher, config.retry_policy())?);
        let extractor = Arc::new(ContentExtractor::new(config.extractor.clone(), None));
        Ok(Self {
            config: Arc::new(config),
            persister,
            fetcher,
            extractor,
            archive_adapter: None,
            llm_adapter: None,
            seo_adapter: None,
            llm_breaker: Arc::new(CircuitBreaker::new()),
            seo_breaker: Arc::new(CircuitBreaker::new()),
        })
    }

    pub fn with_archive_adapter(mut self, adapter: Arc<dyn ArchiveAdapter>) -> Self {
        self.extractor = Arc::new(ContentExtractor::new(self.config.extractor.clone(), Some(adapter.clone())));
        self.archive_adapter = Some(adapter);
        self
    }

    pub fn with_llm_adapter(mut self, adapter: Arc<dyn LlmAdapter>) -> Self {
        self.llm_adapter = Some(adapter);
        self
    }

    pub fn with_seo_adapter(mut self, adapter: Arc<dyn SeoAdapter>) -> Self {
        self.seo_adapter = Some(adapter);
        self
    }

    fn fetch_opts(&self) -> FetchOpts {
        FetchOpts::from(&self.config.fetcher)
    }

    fn expander(&self) -> Arc<LinkGraphExpander> {
        Arc::new(LinkGraphExpander::new(self.persister.clone(), self.config.heuristics.clone(), Vec::new()))
    }

    async fn dictionary_for(&self, land_id: uuid::Uuid) -> Result<crate::model::LandDictionary, PersistError> {
        let land = self.persister.get_land(land_id).await?;
        let language = land.languages.first().cloned().unwrap_or_else(|| "en".to_string());
        Ok(lemma::dictionary::build(&land.keywords, &language))
    }

    /// Runs `job` to completion, persisting its terminal status and
    /// counters, and returns the updated record (spec §4.9, §4.11).
    pub async fn run_job(&self, mut job: Job, cancel: CancellationToken) -> Result<Job, PersistError> {
        job.status = JobStatus::Running;
        job.updated_at = chrono::Utc::now();
        job = self.persister.upsert_job(job).await?;

        let watcher = self.spawn_cancel_watcher(job.id, cancel.clone());
        let (status, counters) = self.dispatch(&job, &cancel).await;
        watcher.abort();

        job.status = status;
        job.counters = counters;
        job.progress = 100;
        job.updated_at = chrono::Utc::now();
        self.persister.upsert_job(job).await
    }

    /// Polls `Job.cancel_requested` every `cancel_grace_ms` and bridges a
    /// `true` onto `cancel`, so a cancellation requested out-of-band (e.g. by
    /// writing directly to the `Job` row from an admin surface outside this
    /// process) reaches the running pipeline without that caller needing a
    /// handle to this `CancellationToken` (spec §5, §9: cooperative
    /// cancellation). Exits as soon as `cancel` fires some other way.
    fn spawn_cancel_watcher(&self, job_id: uuid::Uuid, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let persister = self.persister.clone();
        let grace = std::time::Duration::from_millis(self.config.scheduler.cancel_grace_ms);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(grace) => {
                        match persister.get_job(job_id).await {
                            Ok(job) if job.cancel_requested => {
                                cancel.cancel();
                                break;
                            }
                            Ok(_) => {}
                            Err(_) => break,
                        }
                    }
                }
            }
        })
    }

    async fn dispatch(&self, job: &Job, cancel: &CancellationToken) -> (JobStatus, JobCounters) {
        match job.kind {
            JobKind::Crawl => self.run_crawl(job, cancel).await,
            _ => self.run_generic(job, cancel).await,
        }
    }

    async fn run_crawl(&self, job: &Job, cancel: &CancellationToken) -> (JobStatus, JobCounters) {
        let params: crate::model::CrawlJobParams = serde_json::from_value(job.params.clone()).unwrap_or_default();
        let dictionary = match self.dictionary_for(job.land_id).await {
            Ok(d) => d,
            Err(_) => return (JobStatus::Failed, JobCounters::default()),
        };
        let handler = Arc::new(CrawlCandidateHandler {
            fetcher: self.fetcher.clone(),
            extractor: self.extractor.clone(),
            persister: self.persister.clone(),
            expander: self.expander(),
            dictionary,
            depth_limit: params.depth_limit,
            fetch_opts: self.fetch_opts(),
        });
        pipelines::run_crawl_job(
            job.id,
            job.land_id,
            params.depth_limit,
            params.job_limit,
            self.config.scheduler.per_job_concurrency,
            self.config.scheduler.progress_publish_ms,
            self.config.scheduler.max_idle_ms,
            handler,
            cancel.clone(),
        )
        .await
    }

    /// Dispatches the remaining candidate-shaped pipelines (every `JobKind`
    /// except `Crawl` and `DomainCrawl`), each selected via its own
    /// `Persister` query and run through the same `JobRunner` envelope.
    async fn run_generic(&self, job: &Job, cancel: &CancellationToken) -> (JobStatus, JobCounters) {
        if job.kind == JobKind::DomainCrawl {
            let runner = DomainCrawlRunner {
                fetcher: self.fetcher.clone(),
                extractor: self.extractor.clone(),
                persister: self.persister.clone(),
                fetch_opts: self.fetch_opts(),
                concurrency: self.config.scheduler.per_job_concurrency,
            };
            let (ok, failed) = runner.run(job.land_id, cancel).await;
            let counters = JobCounters { selected: ok + failed, ok, failed, ..Default::default() };
            return (JobStatus::Succeeded, counters);
        }

        let limit = self.config.scheduler.wave_size_limit;
        let candidates = match self.candidates_for(job, limit).await {
            Ok(c) => c,
            Err(_) => return (JobStatus::Failed, JobCounters::default()),
        };

        let handler: Arc<dyn CandidateHandler> = match self.handler_for(job).await {
            Ok(h) => h,
            Err(_) => return (JobStatus::Failed, JobCounters::default()),
        };

        let progress = ProgressChannel::new(job.id);
        let gate = PersistGate::new(std::time::Duration::from_millis(self.config.scheduler.progress_publish_ms));
        let runner = JobRunner::new(self.config.scheduler.per_job_concurrency);
        let mut counters = JobCounters { selected: candidates.len() as u64, ..Default::default() };
        let max_idle = std::time::Duration::from_millis(self.config.scheduler.max_idle_ms);
        runner
            .run_wave(job.id, 0, candidates, handler, &progress, &gate, &mut counters, cancel, &self.persister, max_idle)
            .await;

        if cancel.is_cancelled() {
            (JobStatus::Cancelled, counters)
        } else {
            (JobStatus::Succeeded, counters)
        }
    }

    async fn candidates_for(&self, job: &Job, limit: u64) -> Result<Vec<crate::model::Expression>, PersistError> {
        match job.kind {
            JobKind::Readable => self.persister.readable_refresh_candidates(job.land_id, limit).await,
            JobKind::Media => self.persister.media_candidates(job.land_id, limit).await,
            JobKind::Llm => {
                let params: crate::model::CrawlJobParams = serde_json::from_value(job.params.clone()).unwrap_or_default();
                self.persister.llm_candidates(job.land_id, params.min_relevance.unwrap_or(0), limit).await
            }
            JobKind::Consolidate | JobKind::Heuristic | JobKind::SeoRank => {
                self.persister.all_expressions(job.land_id, limit).await
            }
            JobKind::Crawl | JobKind::DomainCrawl => Ok(Vec::new()),
        }
    }

    async fn handler_for(&self, job: &Job) -> Result<Arc<dyn CandidateHandler>, PersistError> {
        Ok(match job.kind {
            JobKind::Readable => Arc::new(ReadableRefreshHandler {
                extractor: self.extractor.clone(),
                persister: self.persister.clone(),
                dictionary: self.dictionary_for(job.land_id).await?,
                merge: MergeStrategy::Overwrite,
            }),
            JobKind::Media => Arc::new(MediaAnalysisHandler {
                analyzer: Arc::new(MediaAnalyzer::new(
                    self.config.fetcher.max_bytes as u64,
                    3,
                    self.config.fetcher.timeout_ms,
                )),
                persister: self.persister.clone(),
            }),
            JobKind::Llm => {
                let adapter = self
                    .llm_adapter
                    .clone()
                    .ok_or(PersistError::NotFound { entity: "llm_adapter", id: job.id })?;
                Arc::new(LlmBatchHandler {
                    validator: Arc::new(LlmValidator::new(adapter, self.config.adapters.llm_call_cap_per_job, "configured-model")),
                    persister: self.persister.clone(),
                    land_context: self.persister.get_land(job.land_id).await?.description,
                    readable_prefix_chars: 2000,
                })
            }
            JobKind::Consolidate => Arc::new(ConsolidateHandler {
                persister: self.persister.clone(),
                expander: self.expander(),
                extractor: self.extractor.clone(),
                dictionary: self.dictionary_for(job.land_id).await?,
                depth_limit: u32::MAX,
            }),
            JobKind::SeoRank => {
                let adapter = self.seo_adapter.clone().ok_or(PersistError::NotFound { entity: "seo_adapter", id: job.id })?;
                Arc::new(SeoHandler {
                    adapter,
                    breaker: self.seo_breaker.clone(),
                    cfg: (*self.config).adapters.clone(),
                    persister: self.persister.clone(),
                })
            }
            JobKind::Heuristic => Arc::new(HeuristicUpdateHandler { persister: self.persister.clone(), heuristics: self.config.heuristics.clone() }),
            JobKind::Crawl | JobKind::DomainCrawl => unreachable!("handled by dedicated dispatch branches"),
        })
    }
}
