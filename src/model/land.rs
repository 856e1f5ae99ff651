use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A research project: seeds, keywords, and the lemma dictionary built from
/// them. Owns its Domains, Expressions, and dictionary (spec §3 "Ownership").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Land {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Unique per owner.
    pub name: String,
    pub description: String,
    pub languages: Vec<String>,
    pub seed_urls: Vec<String>,
    pub keywords: Vec<String>,
    pub crawl_status: LandCrawlStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the dictionary was last rebuilt from `keywords`; used to
    /// decide whether consolidation needs to rebuild it (SPEC_FULL Open
    /// Question 3).
    pub dictionary_built_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandCrawlStatus {
    Idle,
    Crawling,
}

impl Land {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            description: String::new(),
            languages: Vec::new(),
            seed_urls: Vec::new(),
            keywords: Vec::new(),
            crawl_status: LandCrawlStatus::Idle,
            created_at: now,
            updated_at: now,
            dictionary_built_at: None,
        }
    }

    /// Whether the lemma dictionary needs rebuilding: keywords changed since
    /// the dictionary was last built, or it was never built.
    pub fn dictionary_stale(&self, keywords_changed_at: DateTime<Utc>) -> bool {
        match self.dictionary_built_at {
            None => true,
            Some(built_at) => keywords_changed_at > built_at,
        }
    }
}
