//! Readable-refresh pipeline (spec §4.10): re-parses expressions that were
//! crawled successfully but never produced readable text, without re-fetching.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::extractor::ContentExtractor;
use crate::model::{Expression, LandDictionary};
use crate::paragraph;
use crate::persist::Persister;

use super::super::pipeline::{CandidateHandler, CandidateOutcome};
use super::common::{patch_for_extracted_content, patch_for_permanent_failure};

/// How a re-extracted field is merged onto an already-terminal Expression
/// (SPEC_FULL Open Question: readable-refresh merge strategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep the existing field if already set, fill only gaps.
    PreserveExisting,
    /// Always take the freshly extracted value.
    Overwrite,
}

pub struct ReadableRefreshHandler {
    pub extractor: Arc<ContentExtractor>,
    pub persister: Arc<dyn Persister>,
    pub dictionary: LandDictionary,
    pub merge: MergeStrategy,
}

#[async_trait]
impl CandidateHandler for ReadableRefreshHandler {
    async fn handle(&self, candidate: Expression, _cancel: &CancellationToken) -> CandidateOutcome {
        let Some(raw) = &candidate.raw_content else {
            return CandidateOutcome::Skipped;
        };

        let extracted = self.extractor.extract_from_bytes(&candidate.url, raw.as_bytes()).await;

        let patch = match extracted {
            Ok(content) => {
                if self.merge == MergeStrategy::PreserveExisting && candidate.readable.is_some() {
                    return CandidateOutcome::Skipped;
                }
                patch_for_extracted_content(
                    &content,
                    candidate.http_status.unwrap_or(0),
                    std::time::Duration::ZERO,
                    true,
                    content.links.len() as u32,
                    &self.dictionary,
                    false,
                    None,
                )
            }
            Err(_) => patch_for_permanent_failure(candidate.http_status),
        };

        let succeeded = patch.readable.is_some();
        let readable = patch.readable.clone();
        match self.persister.record_crawl_outcome(candidate.id, patch).await {
            Ok(()) if succeeded => {
                if let Some(readable) = readable {
                    let paragraphs = paragraph::segment(candidate.id, &readable);
                    let _ = self.persister.attach_paragraphs(candidate.id, paragraphs).await;
                }
                CandidateOutcome::Ok
            }
            Ok(()) => CandidateOutcome::Failed,
            Err(_) => CandidateOutcome::Failed,
        }
    }
}
