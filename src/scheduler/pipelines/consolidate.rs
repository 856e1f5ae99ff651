//! Consolidate pipeline (spec §4.10): recomputes relevance for every
//! approved expression in a land against its current dictionary, without
//! re-fetching or re-extracting. Link/media rediscovery re-uses the same
//! `LinkGraphExpander` the crawl pipeline relies on, fed from already-stored
//! readable text.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::extractor::ContentExtractor;
use crate::linkgraph::LinkGraphExpander;
use crate::model::{Expression, ExpressionPatch, LandDictionary};
use crate::persist::Persister;

use super::super::pipeline::{CandidateHandler, CandidateOutcome};

pub struct ConsolidateHandler {
    pub persister: Arc<dyn Persister>,
    pub expander: Arc<LinkGraphExpander>,
    pub extractor: Arc<ContentExtractor>,
    pub dictionary: LandDictionary,
    pub depth_limit: u32,
}

#[async_trait]
impl CandidateHandler for ConsolidateHandler {
    async fn handle(&self, candidate: Expression, _cancel: &CancellationToken) -> CandidateOutcome {
        let Some(readable) = &candidate.readable else {
            return CandidateOutcome::Skipped;
        };

        let title = candidate.title.clone().unwrap_or_default();
        let description = candidate.description.clone().unwrap_or_default();
        let language = candidate.language.clone().unwrap_or_else(|| "en".to_string());
        let relevance = crate::lemma::relevance::score(&title, &description, readable, &self.dictionary, &language);

        // Re-derive links/media from the stored raw markup rather than the
        // readable text, which has already been stripped of tags.
        if let Some(raw) = &candidate.raw_content {
            if let Ok(content) = self.extractor.extract_from_bytes(&candidate.url, raw.as_bytes()).await {
                if !content.links.is_empty() {
                    let _ = self
                        .expander
                        .expand(candidate.land_id, candidate.id, candidate.depth, &content.links, self.depth_limit)
                        .await;
                }
            }
        }

        let patch = ExpressionPatch { relevance: Some(relevance), terminal: false, ..Default::default() };
        match self.persister.record_crawl_outcome(candidate.id, patch).await {
            Ok(()) => CandidateOutcome::Ok,
            Err(_) => CandidateOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractorConfig, HeuristicsConfig};
    use crate::lemma;
    use crate::persist::InMemoryPersister;
    use std::collections::HashMap;
    use uuid::Uuid;

    #[tokio::test]
    async fn recomputes_relevance_against_current_dictionary() {
        let persister = Arc::new(InMemoryPersister::new());
        let expander = Arc::new(LinkGraphExpander::new(persister.clone(), HeuristicsConfig { rules: HashMap::new() }, vec![]));
        let extractor = Arc::new(ContentExtractor::new(ExtractorConfig::default(), None));
        let dict = lemma::dictionary::build(&["climate".to_string()], "en");

        let mut candidate = Expression::new_candidate(Uuid::new_v4(), Uuid::new_v4(), "https://example.com/a", 0);
        candidate.readable = Some("this article discusses climate policy".to_string());
        let expr_id = candidate.id;
        persister.upsert_expression(candidate.clone()).await.unwrap();

        let handler = ConsolidateHandler { persister: persister.clone(), expander, extractor, dictionary: dict, depth_limit: 2 };
        let outcome = handler.handle(candidate, &CancellationToken::new()).await;
        assert_eq!(outcome, CandidateOutcome::Ok);
        assert!(persister.get_expression(expr_id).await.unwrap().relevance > 0);
    }

    #[tokio::test]
    async fn skips_candidates_with_no_readable_text() {
        let persister = Arc::new(InMemoryPersister::new());
        let expander = Arc::new(LinkGraphExpander::new(persister.clone(), HeuristicsConfig { rules: HashMap::new() }, vec![]));
        let extractor = Arc::new(ContentExtractor::new(ExtractorConfig::default(), None));
        let handler = ConsolidateHandler {
            persister,
            expander,
            extractor,
            dictionary: lemma::dictionary::build(&[], "en"),
            depth_limit: 2,
        };
        let candidate = Expression::new_candidate(Uuid::new_v4(), Uuid::new_v4(), "https://example.com/a", 0);
        let outcome = handler.handle(candidate, &CancellationToken::new()).await;
        assert_eq!(outcome, CandidateOutcome::Skipped);
    }
}
