//! Per-Land dictionary construction (spec §4.3): keyword list -> normalized,
//! stemmed, deduplicated lemma set with a reverse lemma -> keywords map.

use crate::model::{LandDictionary, Word};

use super::stemmer::{stem, strip_diacritics};

/// Builds a `LandDictionary` from a Land's raw keyword list and language.
/// Whitespace-splits each keyword (a keyword may be a multi-word phrase),
/// normalizes and stems each token, then dedupes lemmas while preserving
/// every original keyword that produced a given lemma.
pub fn build(keywords: &[String], language: &str) -> LandDictionary {
    let mut dict = LandDictionary::default();
    for keyword in keywords {
        for token in keyword.split_whitespace() {
            let normalized = strip_diacritics(token);
            if normalized.is_empty() {
                continue;
            }
            let lemma = stem(&normalized, language);
            dict.reverse.entry(lemma.clone()).or_default().push(keyword.clone());
            if !dict.contains(&lemma) {
                dict.lemmas.push(Word { lemma, language: language.to_string() });
            }
        }
    }
    for keywords in dict.reverse.values_mut() {
        keywords.sort();
        keywords.dedup();
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_lemmas_across_keywords() {
        let dict = build(&["running".to_string(), "runs".to_string()], "en");
        assert_eq!(dict.lemmas.len(), 1);
        assert_eq!(dict.reverse.get("run").unwrap().len(), 2);
    }

    #[test]
    fn empty_keyword_list_yields_empty_dictionary() {
        let dict = build(&[], "en");
        assert!(dict.is_empty());
    }

    #[test]
    fn multi_word_keyword_contributes_each_token() {
        let dict = build(&["climate change".to_string()], "en");
        assert_eq!(dict.lemmas.len(), 2);
    }
}
