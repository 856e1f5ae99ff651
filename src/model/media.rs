use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

/// One discovered media reference (spec §3). Unique on `(expression_id, url)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub expression_id: Uuid,
    pub url: String,
    pub kind: MediaKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_size: Option<u64>,
    pub dominant_colors: Vec<(u8, u8, u8)>,
    pub perceptual_hash: Option<u64>,
    pub is_processed: bool,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl Media {
    pub fn new_reference(expression_id: Uuid, url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            expression_id,
            url: url.into(),
            kind,
            width: None,
            height: None,
            byte_size: None,
            dominant_colors: Vec::new(),
            perceptual_hash: None,
            is_processed: false,
            analyzed_at: None,
        }
    }
}
