//! Side pipelines (spec §4.10): each implements `CandidateHandler` against
//! a different candidate-selection predicate and shares `JobRunner` for
//! wave-by-wave dispatch, except `domain_crawl` which iterates `Domain`
//! rows directly.

pub mod common;
pub mod consolidate;
pub mod crawl;
pub mod domain_crawl;
pub mod heuristic_update;
pub mod llm_batch;
pub mod media_analysis;
pub mod readable_refresh;
pub mod seo;

pub use consolidate::ConsolidateHandler;
pub use crawl::{run_crawl_job, CrawlCandidateHandler};
pub use domain_crawl::DomainCrawlRunner;
pub use heuristic_update::HeuristicUpdateHandler;
pub use llm_batch::LlmBatchHandler;
pub use media_analysis::MediaAnalysisHandler;
pub use readable_refresh::{MergeStrategy, ReadableRefreshHandler};
pub use seo::SeoHandler;
