//! MediaAnalyzer (spec §4.14).

pub mod analyzer;

pub use analyzer::{AnalyzedMedia, MediaAnalyzer};
