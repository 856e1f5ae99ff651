use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A normalized token, scoped to a language (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub lemma: String,
    pub language: String,
}

/// The per-Land set of normalized lemmas used for relevance scoring (spec
/// §4.3). Built lazily, copy-on-write on keyword mutation (spec §5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandDictionary {
    pub lemmas: Vec<Word>,
    /// lemma -> set of original keywords that produced it.
    pub reverse: HashMap<String, Vec<String>>,
}

impl LandDictionary {
    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }

    pub fn contains(&self, lemma: &str) -> bool {
        self.lemmas.iter().any(|w| w.lemma == lemma)
    }
}
