//! In-memory reference `Persister` (SPEC_FULL §3): a single `Mutex` guards
//! all tables. Grounded in the `rootsignal` `SignalStore` trait-object
//! pattern — the concurrency contract lives in the Scheduler, not the
//! store, so this implementation can afford to be simple.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::PersistError;
use crate::model::{Domain, Expression, ExpressionLink, ExpressionPatch, Job, Land, Media, Paragraph};

use super::Persister;

#[derive(Default)]
struct Tables {
    lands: HashMap<Uuid, Land>,
    domains: HashMap<Uuid, Domain>,
    expressions: HashMap<Uuid, Expression>,
    expression_url_index: HashMap<(Uuid, String), Uuid>,
    media: HashMap<(Uuid, String), Media>,
    links: HashMap<(Uuid, Uuid), ExpressionLink>,
    jobs: HashMap<Uuid, Job>,
    paragraphs: HashMap<Uuid, Vec<Paragraph>>,
}

pub struct InMemoryPersister {
    tables: Mutex<Tables>,
}

impl Default for InMemoryPersister {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPersister {
    pub fn new() -> Self {
        Self { tables: Mutex::new(Tables::default()) }
    }

    pub fn seed_land(&self, land: Land) {
        self.tables.lock().unwrap().lands.insert(land.id, land);
    }
}

#[async_trait]
impl Persister for InMemoryPersister {
    async fn record_crawl_outcome(&self, expr_id: Uuid, patch: ExpressionPatch) -> Result<(), PersistError> {
        let mut tables = self.tables.lock().unwrap();
        let expr = tables
            .expressions
            .get_mut(&expr_id)
            .ok_or(PersistError::NotFound { entity: "expression", id: expr_id })?;

        if let Some(v) = patch.http_status {
            expr.http_status = Some(v);
        }
        if patch.title.is_some() {
            expr.title = patch.title;
        }
        if patch.description.is_some() {
            expr.description = patch.description;
        }
        if patch.language.is_some() {
            expr.language = patch.language;
        }
        if patch.canonical_url.is_some() {
            expr.canonical_url = patch.canonical_url;
        }
        if patch.raw_content.is_some() {
            expr.raw_content = patch.raw_content;
        }
        if patch.readable.is_some() {
            expr.readable = patch.readable;
        }
        if let Some(v) = patch.word_count {
            expr.word_count = v;
        }
        if let Some(v) = patch.relevance {
            expr.relevance = v;
        }
        if patch.quality_score.is_some() {
            expr.quality_score = patch.quality_score;
        }
        if patch.sentiment_score.is_some() {
            expr.sentiment_score = patch.sentiment_score;
        }
        if patch.sentiment_label.is_some() {
            expr.sentiment_label = patch.sentiment_label;
        }
        if patch.sentiment_confidence.is_some() {
            expr.sentiment_confidence = patch.sentiment_confidence;
        }
        if patch.valid_llm.is_some() {
            expr.valid_llm = patch.valid_llm;
        }
        if patch.valid_model.is_some() {
            expr.valid_model = patch.valid_model;
        }
        if patch.seo_rank.is_some() {
            expr.seo_rank = patch.seo_rank;
        }
        if patch.content_hash.is_some() {
            expr.content_hash = patch.content_hash;
        }
        if patch.extraction_source.is_some() {
            expr.extraction_source = patch.extraction_source;
        }
        if patch.crawled_at.is_some() {
            expr.crawled_at = patch.crawled_at;
        }
        if patch.readable_at.is_some() {
            expr.readable_at = patch.readable_at;
        }
        if let Some(v) = patch.is_media_processed {
            expr.is_media_processed = v;
        }
        let now = Utc::now();
        expr.updated_at = now;
        if patch.terminal {
            expr.approved_at = Some(now);
        }
        Ok(())
    }

    async fn attach_media(&self, expr_id: Uuid, media: Vec<Media>) -> Result<(), PersistError> {
        let mut tables = self.tables.lock().unwrap();
        for mut item in media {
            item.expression_id = expr_id;
            tables.media.insert((expr_id, item.url.clone()), item);
        }
        Ok(())
    }

    async fn attach_links(&self, edges: Vec<ExpressionLink>) -> Result<(), PersistError> {
        let mut tables = self.tables.lock().unwrap();
        for edge in edges {
            tables.links.insert((edge.source_id, edge.target_id), edge);
        }
        Ok(())
    }

    async fn upsert_expression(&self, expression: Expression) -> Result<Expression, PersistError> {
        let mut tables = self.tables.lock().unwrap();
        let key = (expression.land_id, expression.url.clone());
        if let Some(existing_id) = tables.expression_url_index.get(&key) {
            if *existing_id != expression.id {
                return Ok(tables.expressions.get(existing_id).cloned().expect("index invariant"));
            }
        }
        if let Some(previous) = tables.expressions.get(&expression.id) {
            if previous.url != expression.url {
                tables.expression_url_index.remove(&(previous.land_id, previous.url.clone()));
            }
        }
        tables.expression_url_index.insert(key, expression.id);
        tables.expressions.insert(expression.id, expression.clone());
        Ok(expression)
    }

    async fn upsert_domain(&self, domain: Domain) -> Result<Domain, PersistError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.domains.values().find(|d| d.land_id == domain.land_id && d.name == domain.name) {
            return Ok(existing.clone());
        }
        tables.domains.insert(domain.id, domain.clone());
        Ok(domain)
    }

    async fn get_expression(&self, id: Uuid) -> Result<Expression, PersistError> {
        self.tables
            .lock()
            .unwrap()
            .expressions
            .get(&id)
            .cloned()
            .ok_or(PersistError::NotFound { entity: "expression", id })
    }

    async fn get_expression_by_url(&self, land_id: Uuid, url: &str) -> Result<Option<Expression>, PersistError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .expression_url_index
            .get(&(land_id, url.to_string()))
            .and_then(|id| tables.expressions.get(id))
            .cloned())
    }

    async fn get_land(&self, id: Uuid) -> Result<Land, PersistError> {
        self.tables.lock().unwrap().lands.get(&id).cloned().ok_or(PersistError::NotFound { entity: "land", id })
    }

    async fn candidates(&self, land_id: Uuid, depth_limit: u32, limit: u64) -> Result<Vec<Expression>, PersistError> {
        let tables = self.tables.lock().unwrap();
        let mut candidates: Vec<Expression> = tables
            .expressions
            .values()
            .filter(|e| e.land_id == land_id && e.is_candidate(depth_limit))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.depth.cmp(&b.depth).then(a.created_at.cmp(&b.created_at)));
        candidates.truncate(limit as usize);
        Ok(candidates)
    }

    async fn all_expressions(&self, land_id: Uuid, limit: u64) -> Result<Vec<Expression>, PersistError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Expression> = tables
            .expressions
            .values()
            .filter(|e| e.land_id == land_id && e.approved_at.is_some())
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn readable_refresh_candidates(&self, land_id: Uuid, limit: u64) -> Result<Vec<Expression>, PersistError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Expression> = tables
            .expressions
            .values()
            .filter(|e| e.land_id == land_id && e.is_readable_refresh_candidate())
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn media_candidates(&self, land_id: Uuid, limit: u64) -> Result<Vec<Expression>, PersistError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Expression> = tables
            .expressions
            .values()
            .filter(|e| e.land_id == land_id && e.approved_at.is_some() && !e.is_media_processed)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn llm_candidates(&self, land_id: Uuid, min_relevance: u64, limit: u64) -> Result<Vec<Expression>, PersistError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Expression> = tables
            .expressions
            .values()
            .filter(|e| e.land_id == land_id && e.valid_llm.is_none() && e.relevance >= min_relevance)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.relevance.cmp(&a.relevance).then(a.created_at.cmp(&b.created_at)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn domains(&self, land_id: Uuid) -> Result<Vec<Domain>, PersistError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.domains.values().filter(|d| d.land_id == land_id).cloned().collect())
    }

    async fn media_for_expression(&self, expr_id: Uuid) -> Result<Vec<Media>, PersistError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.media.values().filter(|m| m.expression_id == expr_id).cloned().collect())
    }

    async fn upsert_job(&self, job: Job) -> Result<Job, PersistError> {
        let mut tables = self.tables.lock().unwrap();
        tables.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> Result<Job, PersistError> {
        self.tables.lock().unwrap().jobs.get(&id).cloned().ok_or(PersistError::NotFound { entity: "job", id })
    }

    async fn attach_paragraphs(&self, expr_id: Uuid, paragraphs: Vec<Paragraph>) -> Result<(), PersistError> {
        self.tables.lock().unwrap().paragraphs.insert(expr_id, paragraphs);
        Ok(())
    }
}
