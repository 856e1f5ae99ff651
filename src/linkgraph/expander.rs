//! LinkGraphExpander (spec §4.7): normalizes discovered URLs, rewrites them
//! through the heuristics map, filters candidates (scheme already enforced
//! by `normalize::resolve`, deny-list, existing-approved dedup), and
//! upserts new Expression candidates plus their edges under the job's
//! depth budget.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::HeuristicsConfig;
use crate::error::PersistError;
use crate::extractor::DiscoveredLink;
use crate::model::{Domain, Expression, ExpressionLink, LinkType};
use crate::persist::Persister;

use super::{heuristics, normalize};

pub struct LinkGraphExpander {
    persister: Arc<dyn Persister>,
    heuristics: HeuristicsConfig,
    deny_list: Vec<String>,
}

impl LinkGraphExpander {
    pub fn new(persister: Arc<dyn Persister>, heuristics: HeuristicsConfig, deny_list: Vec<String>) -> Self {
        Self { persister, heuristics, deny_list }
    }

    /// Expands `links` discovered on `source_id` (itself at `source_depth`)
    /// into new candidate Expressions and edges. Links whose target would
    /// exceed `depth_limit` are still linked (edges are always recorded)
    /// but not enqueued as new candidates (spec §8 boundary behavior).
    pub async fn expand(
        &self,
        land_id: Uuid,
        source_id: Uuid,
        source_depth: u32,
        links: &[DiscoveredLink],
        depth_limit: u32,
    ) -> Result<Vec<Expression>, PersistError> {
        let child_depth = source_depth + 1;
        let mut new_candidates = Vec::new();

        for link in links {
            let rewritten = heuristics::rewrite(&link.url, &self.heuristics);
            let normalized = normalize::normalize(&rewritten);

            if self.deny_list.iter().any(|pattern| normalized.contains(pattern.as_str())) {
                continue;
            }

            let Some(host) = url::Url::parse(&normalized).ok().and_then(|u| u.host_str().map(|h| h.to_string())) else {
                continue;
            };
            let domain = self.persister.upsert_domain(Domain::new(land_id, host)).await?;

            let target = match self.persister.get_expression_by_url(land_id, &normalized).await? {
                Some(existing) => existing,
                None => {
                    if child_depth > depth_limit {
                        continue;
                    }
                    let candidate = Expression::new_candidate(land_id, domain.id, normalized.clone(), child_depth);
                    let inserted = self.persister.upsert_expression(candidate).await?;
                    new_candidates.push(inserted.clone());
                    inserted
                }
            };

            let edge = ExpressionLink::new(source_id, target.id, LinkType::Content);
            self.persister.attach_links(vec![edge]).await?;
        }

        Ok(new_candidates)
    }
}
