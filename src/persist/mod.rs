//! Persister (spec §4.8): atomic per-expression writes. The relational
//! store itself is out of scope (spec §1 Non-goals); this crate owns the
//! trait contract and one in-memory implementation for tests and
//! standalone engine use.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PersistError;
use crate::model::{Domain, Expression, ExpressionLink, ExpressionPatch, Job, Land, Media};

pub use memory::InMemoryPersister;

#[async_trait]
pub trait Persister: Send + Sync {
    /// Sets every observable field from `patch` and `approved_at = now()` in
    /// one transaction. Never batches across expressions (spec §4.8).
    async fn record_crawl_outcome(&self, expr_id: Uuid, patch: ExpressionPatch) -> Result<(), PersistError>;

    /// Upserts media rows by `(expr_id, url)`.
    async fn attach_media(&self, expr_id: Uuid, media: Vec<Media>) -> Result<(), PersistError>;

    /// Upserts outbound edges, tolerating duplicates on `(source_id,
    /// target_id)`.
    async fn attach_links(&self, edges: Vec<ExpressionLink>) -> Result<(), PersistError>;

    /// Inserts `expression` as a new candidate, or returns the existing row
    /// unchanged if `(land_id, url)` already exists (spec §4.7: "idempotent
    /// fallback-to-read-then-link under a unique-constraint violation").
    async fn upsert_expression(&self, expression: Expression) -> Result<Expression, PersistError>;

    async fn upsert_domain(&self, domain: Domain) -> Result<Domain, PersistError>;

    async fn get_expression(&self, id: Uuid) -> Result<Expression, PersistError>;

    async fn get_expression_by_url(&self, land_id: Uuid, url: &str) -> Result<Option<Expression>, PersistError>;

    async fn get_land(&self, id: Uuid) -> Result<Land, PersistError>;

    async fn candidates(&self, land_id: Uuid, depth_limit: u32, limit: u64) -> Result<Vec<Expression>, PersistError>;

    /// Every already-crawled expression in the land (`approved_at NOT NULL`),
    /// regardless of depth — unlike `candidates`, which only returns rows
    /// still awaiting a first crawl attempt. Used by pipelines that revisit
    /// already-terminal rows: `consolidate`, `heuristic_update`, `seo_rank`.
    async fn all_expressions(&self, land_id: Uuid, limit: u64) -> Result<Vec<Expression>, PersistError>;

    /// Crawled-but-not-yet-readable candidates (spec §4.10:
    /// `http_status=200 AND approved_at NOT NULL AND readable IS NULL`).
    async fn readable_refresh_candidates(&self, land_id: Uuid, limit: u64) -> Result<Vec<Expression>, PersistError>;

    /// Expressions with discovered-but-unanalyzed media (spec §4.10:
    /// `is_media_processed=false`).
    async fn media_candidates(&self, land_id: Uuid, limit: u64) -> Result<Vec<Expression>, PersistError>;

    /// Expressions awaiting LLM validation (spec §4.10: `valid_llm IS NULL
    /// AND relevance >= min_relevance`).
    async fn llm_candidates(&self, land_id: Uuid, min_relevance: u64, limit: u64) -> Result<Vec<Expression>, PersistError>;

    /// All domains owned by a land, for `domain_crawl` (spec §4.10).
    async fn domains(&self, land_id: Uuid) -> Result<Vec<Domain>, PersistError>;

    /// Media rows attached to one expression, for `media_analysis`.
    async fn media_for_expression(&self, expr_id: Uuid) -> Result<Vec<Media>, PersistError>;

    async fn upsert_job(&self, job: Job) -> Result<Job, PersistError>;

    async fn get_job(&self, id: Uuid) -> Result<Job, PersistError>;

    /// Replaces the stored paragraph segmentation for one expression.
    async fn attach_paragraphs(&self, expr_id: Uuid, paragraphs: Vec<crate::model::Paragraph>) -> Result<(), PersistError>;
}
