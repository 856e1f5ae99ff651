//! Language-specific stemming and diacritic stripping (spec §4.3), grounded
//! in the `rust-stemmers`/`unicode-normalization` crates as used by the
//! `stract` search engine's tokenizer.

use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strips combining diacritics via NFD decomposition, then lowercases.
pub fn strip_diacritics(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

/// Maps an ISO 639-1 language code to a stemming algorithm. Unsupported
/// languages fall back to identity stemming (spec §4.3: "identity fallback
/// for unsupported languages").
fn algorithm_for(language: &str) -> Option<Algorithm> {
    match language {
        "ar" => Some(Algorithm::Arabic),
        "da" => Some(Algorithm::Danish),
        "nl" => Some(Algorithm::Dutch),
        "en" => Some(Algorithm::English),
        "fi" => Some(Algorithm::Finnish),
        "fr" => Some(Algorithm::French),
        "de" => Some(Algorithm::German),
        "el" => Some(Algorithm::Greek),
        "hu" => Some(Algorithm::Hungarian),
        "it" => Some(Algorithm::Italian),
        "no" => Some(Algorithm::Norwegian),
        "pt" => Some(Algorithm::Portuguese),
        "ro" => Some(Algorithm::Romanian),
        "ru" => Some(Algorithm::Russian),
        "es" => Some(Algorithm::Spanish),
        "sv" => Some(Algorithm::Swedish),
        "ta" => Some(Algorithm::Tamil),
        "tr" => Some(Algorithm::Turkish),
        _ => None,
    }
}

/// Stems `word` (already diacritic-stripped and lowercased) for `language`.
/// Returns the input unchanged when the language has no known algorithm.
pub fn stem(word: &str, language: &str) -> String {
    match algorithm_for(language) {
        Some(algorithm) => Stemmer::create(algorithm).stem(word).into_owned(),
        None => word.to_string(),
    }
}
