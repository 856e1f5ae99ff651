//! SEO-metrics pipeline (spec §4.10, §4.12): fetches backlink/authority
//! metrics per domain and stores the raw result on every expression of that
//! domain. Circuit-open stops the wave (`AdapterUnavailable`).

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::adapters::{CircuitBreaker, SeoAdapter};
use crate::config::AdapterConfig;
use crate::error::AdapterErrorKind;
use crate::model::{Expression, ExpressionPatch};
use crate::persist::Persister;

use super::super::pipeline::{CandidateHandler, CandidateOutcome};

pub struct SeoHandler {
    pub adapter: Arc<dyn SeoAdapter>,
    pub breaker: Arc<CircuitBreaker>,
    pub cfg: AdapterConfig,
    pub persister: Arc<dyn Persister>,
}

#[async_trait]
impl CandidateHandler for SeoHandler {
    async fn handle(&self, candidate: Expression, _cancel: &CancellationToken) -> CandidateOutcome {
        let host = match url::Url::parse(&candidate.url).ok().and_then(|u| u.host_str().map(|h| h.to_string())) {
            Some(h) => h,
            None => return CandidateOutcome::Skipped,
        };

        if self.breaker.is_open() {
            return CandidateOutcome::AdapterUnavailable;
        }

        let result = crate::adapters::with_retry_and_breaker(&self.breaker, &self.cfg, || async {
            self.adapter.metrics_for(&host).await
        })
        .await;

        match result {
            Ok(metrics) => {
                let value = serde_json::json!({ "backlinks": metrics.backlinks, "domain_authority": metrics.domain_authority });
                let patch = ExpressionPatch { seo_rank: Some(value), terminal: false, ..Default::default() };
                match self.persister.record_crawl_outcome(candidate.id, patch).await {
                    Ok(()) => CandidateOutcome::Ok,
                    Err(_) => CandidateOutcome::Failed,
                }
            }
            Err(e) if e.kind == AdapterErrorKind::CircuitOpen => CandidateOutcome::AdapterUnavailable,
            Err(_) => CandidateOutcome::Failed,
        }
    }
}
