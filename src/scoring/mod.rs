//! QualityScorer and SentimentAnalyzer (spec §4.4, §4.5).

pub mod quality;
pub mod sentiment;
