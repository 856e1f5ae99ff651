//! Media-analysis pipeline (spec §4.10, §4.14): downloads and analyzes
//! media discovered during crawl, marking expressions `is_media_processed`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::media::MediaAnalyzer;
use crate::model::{Expression, ExpressionPatch, MediaKind};
use crate::persist::Persister;

use super::super::pipeline::{CandidateHandler, CandidateOutcome};

pub struct MediaAnalysisHandler {
    pub analyzer: Arc<MediaAnalyzer>,
    pub persister: Arc<dyn Persister>,
}

#[async_trait]
impl CandidateHandler for MediaAnalysisHandler {
    async fn handle(&self, candidate: Expression, _cancel: &CancellationToken) -> CandidateOutcome {
        let refs = match self.persister.media_for_expression(candidate.id).await {
            Ok(refs) => refs,
            Err(_) => return CandidateOutcome::Failed,
        };

        let mut any_failed = false;
        for mut media in refs.into_iter().filter(|m| !m.is_processed) {
            match self.analyzer.analyze(&media.url).await {
                Some(analyzed) => {
                    media.width = Some(analyzed.width);
                    media.height = Some(analyzed.height);
                    media.byte_size = Some(analyzed.byte_size);
                    media.dominant_colors = analyzed.dominant_colors;
                    media.perceptual_hash = Some(analyzed.perceptual_hash);
                    media.is_processed = true;
                    media.analyzed_at = Some(chrono::Utc::now());
                    media.kind = MediaKind::Image;
                }
                None => any_failed = true,
            }
            if self.persister.attach_media(candidate.id, vec![media]).await.is_err() {
                any_failed = true;
            }
        }

        let patch = ExpressionPatch { is_media_processed: Some(true), terminal: false, ..Default::default() };
        if self.persister.record_crawl_outcome(candidate.id, patch).await.is_err() {
            return CandidateOutcome::Failed;
        }

        if any_failed {
            CandidateOutcome::Failed
        } else {
            CandidateOutcome::Ok
        }
    }
}
