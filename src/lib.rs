pub mod adapters;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod lemma;
pub mod linkgraph;
pub mod llm;
pub mod media;
pub mod model;
pub mod paragraph;
pub mod persist;
pub mod scheduler;
pub mod scoring;

pub use config::Config;
pub use error::EngineError;
pub use scheduler::Engine;
