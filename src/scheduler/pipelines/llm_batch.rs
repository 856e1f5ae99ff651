//! LLM-batch pipeline (spec §4.10, §4.6): validates relevance for
//! expressions that cleared the lexicon relevance floor but have no LLM
//! verdict yet. `CapExceeded` stops the wave early (spec §4.12).

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::llm::{LlmValidator, ValidationStatus};
use crate::model::{Expression, ExpressionPatch};
use crate::persist::Persister;

use super::super::pipeline::{CandidateHandler, CandidateOutcome};
use super::common::content_hash;

pub struct LlmBatchHandler {
    pub validator: Arc<LlmValidator>,
    pub persister: Arc<dyn Persister>,
    pub land_context: String,
    pub readable_prefix_chars: usize,
}

#[async_trait]
impl CandidateHandler for LlmBatchHandler {
    async fn handle(&self, candidate: Expression, _cancel: &CancellationToken) -> CandidateOutcome {
        let Some(readable) = &candidate.readable else {
            return CandidateOutcome::Skipped;
        };
        let title = candidate.title.clone().unwrap_or_default();
        let prefix: String = readable.chars().take(self.readable_prefix_chars).collect();
        let hash = candidate.content_hash.clone().unwrap_or_else(|| content_hash(readable));

        let outcome = self.validator.validate(&hash, &self.land_context, &title, &prefix).await;

        if outcome.status == ValidationStatus::CapExceeded {
            return CandidateOutcome::CapExceeded;
        }

        let Some(verdict) = outcome.verdict else {
            // Transport failure after retries: leave `valid_llm` unset so the
            // candidate is picked up again next run (spec §4.6).
            return CandidateOutcome::Skipped;
        };

        let patch = ExpressionPatch {
            valid_llm: Some(verdict.verdict),
            valid_model: Some(verdict.model_name),
            terminal: false,
            ..Default::default()
        };
        match self.persister.record_crawl_outcome(candidate.id, patch).await {
            Ok(()) => CandidateOutcome::Ok,
            Err(_) => CandidateOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LlmVerdict;
    use crate::llm::LlmValidator;
    use crate::persist::InMemoryPersister;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct FixedAdapter;

    #[async_trait]
    impl crate::adapters::LlmAdapter for FixedAdapter {
        async fn validate(&self, _land_context: &str, _title: &str, _body_prefix: &str) -> Result<LlmVerdict, crate::error::AdapterError> {
            Ok(LlmVerdict { is_relevant: true, confidence: 0.9, raw: "yes".to_string() })
        }

        async fn blend_sentiment(&self, _text_prefix: &str) -> Result<f64, crate::error::AdapterError> {
            Ok(0.0)
        }
    }

    #[tokio::test]
    async fn skips_candidates_without_readable_text() {
        let persister = Arc::new(InMemoryPersister::new());
        let validator = Arc::new(LlmValidator::new(Arc::new(FixedAdapter), 10, "test-model"));
        let handler = LlmBatchHandler { validator, persister, land_context: "ctx".to_string(), readable_prefix_chars: 500 };
        let candidate = Expression::new_candidate(Uuid::new_v4(), Uuid::new_v4(), "https://example.com/a", 0);
        let outcome = handler.handle(candidate, &CancellationToken::new()).await;
        assert_eq!(outcome, CandidateOutcome::Skipped);
    }

    #[tokio::test]
    async fn records_verdict_for_candidates_with_readable_text() {
        let persister = Arc::new(InMemoryPersister::new());
        let validator = Arc::new(LlmValidator::new(Arc::new(FixedAdapter), 10, "test-model"));
        let mut candidate = Expression::new_candidate(Uuid::new_v4(), Uuid::new_v4(), "https://example.com/a", 0);
        candidate.readable = Some("some readable content".to_string());
        let expr_id = candidate.id;
        persister.upsert_expression(candidate.clone()).await.unwrap();

        let handler = LlmBatchHandler { validator, persister: persister.clone(), land_context: "ctx".to_string(), readable_prefix_chars: 500 };
        let outcome = handler.handle(candidate, &CancellationToken::new()).await;
        assert_eq!(outcome, CandidateOutcome::Ok);
        assert_eq!(persister.get_expression(expr_id).await.unwrap().valid_llm, Some(true));
    }
}
