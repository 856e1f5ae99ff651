//! Crawl pipeline (spec §4.9): Fetch -> Extract -> Score -> Persist ->
//! LinkGraphExpander, driven wave-by-wave by `run_crawl_job`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::FetchErrorKind;
use crate::extractor::{ContentExtractor, DiscoveredLink, DiscoveredMedia};
use crate::fetcher::{FetchOpts, Fetcher};
use crate::linkgraph::LinkGraphExpander;
use crate::model::{Expression, JobCounters, JobStatus, LandDictionary, Media, MediaKind};
use crate::paragraph;
use crate::persist::Persister;

use super::super::pipeline::{CandidateHandler, CandidateOutcome, JobRunner};
use super::super::progress::{PersistGate, ProgressChannel};
use super::common::{patch_for_extracted_content, patch_for_permanent_failure};

pub struct CrawlCandidateHandler {
    pub fetcher: Arc<Fetcher>,
    pub extractor: Arc<ContentExtractor>,
    pub persister: Arc<dyn Persister>,
    pub expander: Arc<LinkGraphExpander>,
    pub dictionary: LandDictionary,
    pub depth_limit: u32,
    pub fetch_opts: FetchOpts,
}

#[async_trait]
impl CandidateHandler for CrawlCandidateHandler {
    async fn handle(&self, candidate: Expression, cancel: &CancellationToken) -> CandidateOutcome {
        let fetch_result = self.fetcher.fetch(&candidate.url, &self.fetch_opts, cancel).await;

        let (patch, links, media): (_, Vec<DiscoveredLink>, Vec<DiscoveredMedia>) = match &fetch_result {
            Ok(fr) => match self.extractor.extract(&candidate.url, Some(fr)).await {
                Ok(content) => {
                    let patch = patch_for_extracted_content(
                        &content,
                        fr.http_status,
                        fr.elapsed,
                        fr.content_type_is_html_ish(),
                        content.links.len() as u32,
                        &self.dictionary,
                        false,
                        Some(&fr.body),
                    );
                    (patch, content.links.clone(), content.media.clone())
                }
                Err(_) => (patch_for_permanent_failure(Some(fr.http_status)), Vec::new(), Vec::new()),
            },
            Err(fetch_err) => {
                let http_status = match fetch_err.kind {
                    FetchErrorKind::HttpError(code) => code,
                    _ => 0,
                };
                match self.extractor.extract(&candidate.url, None).await {
                    Ok(content) => {
                        let patch = patch_for_extracted_content(
                            &content,
                            http_status,
                            std::time::Duration::ZERO,
                            true,
                            content.links.len() as u32,
                            &self.dictionary,
                            false,
                            None,
                        );
                        (patch, content.links.clone(), content.media.clone())
                    }
                    Err(_) => (patch_for_permanent_failure(Some(http_status)), Vec::new(), Vec::new()),
                }
            }
        };

        let succeeded = patch.readable.is_some();
        let readable = patch.readable.clone();

        if self.persister.record_crawl_outcome(candidate.id, patch).await.is_err() {
            return CandidateOutcome::Failed;
        }

        if let Some(readable) = readable {
            let paragraphs = paragraph::segment(candidate.id, &readable);
            let _ = self.persister.attach_paragraphs(candidate.id, paragraphs).await;
        }

        if !media.is_empty() {
            let refs: Vec<Media> = media
                .iter()
                .map(|m| Media::new_reference(candidate.id, m.url.clone(), MediaKind::Other))
                .collect();
            let _ = self.persister.attach_media(candidate.id, refs).await;
        }

        if !links.is_empty() {
            let _ = self
                .expander
                .expand(candidate.land_id, candidate.id, candidate.depth, &links, self.depth_limit)
                .await;
        }

        if succeeded {
            CandidateOutcome::Ok
        } else {
            CandidateOutcome::Failed
        }
    }
}

/// Drives the wave loop for a crawl job (spec §4.9): depth 0, then 1, ...,
/// up to `depth_limit`. Candidates discovered mid-wave by the expander
/// land at a deeper depth and are only picked up once that depth's own
/// wave is fetched, since each wave re-queries the store.
#[allow(clippy::too_many_arguments)]
pub async fn run_crawl_job(
    job_id: Uuid,
    land_id: Uuid,
    depth_limit: u32,
    job_limit: u64,
    per_job_concurrency: usize,
    progress_publish_ms: u64,
    max_idle_ms: u64,
    handler: Arc<CrawlCandidateHandler>,
    cancel: CancellationToken,
) -> (JobStatus, JobCounters) {
    let persister = handler.persister.clone();
    let progress = ProgressChannel::new(job_id);
    let gate = PersistGate::new(std::time::Duration::from_millis(progress_publish_ms));
    let max_idle = std::time::Duration::from_millis(max_idle_ms);
    let runner = JobRunner::new(per_job_concurrency);
    let mut counters = JobCounters::default();
    let mut processed_total = 0u64;

    for depth in 0..=depth_limit {
        if cancel.is_cancelled() {
            return (JobStatus::Cancelled, counters);
        }
        if processed_total >= job_limit {
            break;
        }

        let all = match persister.candidates(land_id, depth_limit, job_limit).await {
            Ok(c) => c,
            Err(_) => return (JobStatus::Failed, counters),
        };
        let wave: Vec<Expression> = all.into_iter().filter(|e| e.depth == depth).collect();
        if wave.is_empty() {
            continue;
        }

        counters.selected += wave.len() as u64;
        processed_total += wave.len() as u64;
        runner
            .run_wave(job_id, depth, wave, handler.clone(), &progress, &gate, &mut counters, &cancel, &persister, max_idle)
            .await;
    }

    progress.publish(job_id, depth_limit, processed_total, processed_total, counters.clone());

    if cancel.is_cancelled() {
        (JobStatus::Cancelled, counters)
    } else {
        (JobStatus::Succeeded, counters)
    }
}
