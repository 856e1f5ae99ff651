//! SentimentAnalyzer (spec §4.5): lexicon polarity, optionally LLM-blended
//! when confidence is low.

use crate::model::SentimentLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentStatus {
    Ok,
    UnsupportedLang,
    NoContent,
}

#[derive(Debug, Clone)]
pub struct SentimentOutcome {
    pub status: SentimentStatus,
    pub score: Option<f64>,
    pub confidence: Option<f64>,
    pub label: Option<SentimentLabel>,
}

/// A small AFINN-style polarity lexicon, English only in this build; other
/// supported languages resolve to an empty lexicon (score 0, confidence 0)
/// rather than silently reusing English words.
fn lexicon(language: &str) -> &'static [(&'static str, i32)] {
    match language {
        "en" => &[
            ("good", 2), ("great", 3), ("excellent", 4), ("positive", 2), ("love", 3),
            ("best", 3), ("improve", 2), ("benefit", 2), ("success", 3), ("happy", 3),
            ("bad", -2), ("terrible", -4), ("awful", -3), ("negative", -2), ("hate", -3),
            ("worst", -3), ("fail", -2), ("failure", -2), ("crisis", -3), ("harm", -2),
        ],
        _ => &[],
    }
}

/// `score ∈ [-1,1]`, `confidence ∈ [0,1]` derived from how many of the
/// body's words carried polarity (spec §4.5).
pub fn analyze(text: &str, language: &str, supported_languages: &[String]) -> SentimentOutcome {
    if !supported_languages.iter().any(|l| l == language) {
        return SentimentOutcome { status: SentimentStatus::UnsupportedLang, score: None, confidence: None, label: None };
    }
    if text.trim().is_empty() {
        return SentimentOutcome { status: SentimentStatus::NoContent, score: None, confidence: None, label: None };
    }

    let lex = lexicon(language);
    let words: Vec<String> = text.split_whitespace().map(|w| w.to_lowercase()).collect();
    let mut polarity_sum = 0i32;
    let mut hits = 0u32;
    for word in &words {
        let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
        if let Some((_, weight)) = lex.iter().find(|(term, _)| *term == clean) {
            polarity_sum += weight;
            hits += 1;
        }
    }

    let max_polarity_per_hit = 4.0;
    let score = if hits == 0 { 0.0 } else { (polarity_sum as f64 / (hits as f64 * max_polarity_per_hit)).clamp(-1.0, 1.0) };
    let confidence = (hits as f64 / words.len().max(1) as f64 * 10.0).clamp(0.0, 1.0);
    let label = label_for(score);

    SentimentOutcome { status: SentimentStatus::Ok, score: Some(score), confidence: Some(confidence), label: Some(label) }
}

fn label_for(score: f64) -> SentimentLabel {
    if score > 0.1 {
        SentimentLabel::Positive
    } else if score < -0.1 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Averages the lexicon score with an LLM-provided score when lexicon
/// confidence fell below the configured threshold (spec §4.5).
pub fn blend(lexicon_score: f64, llm_score: f64) -> f64 {
    ((lexicon_score + llm_score) / 2.0).clamp(-1.0, 1.0)
}
