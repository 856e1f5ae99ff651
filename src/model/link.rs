use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    Content,
    Nav,
    Media,
}

/// Directed edge (spec §3). `(source_id, target_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionLink {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub anchor_text: Option<String>,
    pub link_type: LinkType,
}

impl ExpressionLink {
    pub fn new(source_id: Uuid, target_id: Uuid, link_type: LinkType) -> Self {
        Self { source_id, target_id, anchor_text: None, link_type }
    }
}
