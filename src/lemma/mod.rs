//! LemmaDictionary & RelevanceScorer (spec §4.3).

pub mod dictionary;
pub mod relevance;
mod stemmer;

pub use relevance::score;
