//! RelevanceScorer (spec §4.3): weighted lemma-hit count against a Land's
//! dictionary.

use crate::model::LandDictionary;

use super::stemmer::{stem, strip_diacritics};

const TITLE_WEIGHT: u64 = 3;
const DESCRIPTION_WEIGHT: u64 = 2;
const BODY_WEIGHT: u64 = 1;

/// Scores `3*title_hits + 2*description_hits + body_hits` against `dict`.
/// An empty dictionary always scores 0 — this is a precondition check, not a
/// fabricated score (spec §4.3).
pub fn score(title: &str, description: &str, body: &str, dict: &LandDictionary, language: &str) -> u64 {
    if dict.is_empty() {
        return 0;
    }
    count_hits(title, dict, language) * TITLE_WEIGHT
        + count_hits(description, dict, language) * DESCRIPTION_WEIGHT
        + count_hits(body, dict, language) * BODY_WEIGHT
}

fn count_hits(text: &str, dict: &LandDictionary, language: &str) -> u64 {
    text.split_whitespace()
        .filter(|token| {
            let normalized = strip_diacritics(token);
            !normalized.is_empty() && dict.contains(&stem(&normalized, language))
        })
        .count() as u64
}
