use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique registrable host within a Land (spec §3). `(land_id, name)` is
/// unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    pub land_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub http_status: Option<u16>,
    pub expression_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    pub fn new(land_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            land_id,
            name: name.into(),
            title: None,
            description: None,
            last_fetched_at: None,
            http_status: None,
            expression_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
