use uuid::Uuid;

/// A stable, index-ordered segment of an Expression's readable text (spec
/// §3). Produced only when readable text exists. Consumed by an external
/// embeddings subsystem; this crate only owns deterministic segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub id: Uuid,
    pub expression_id: Uuid,
    pub index: u32,
    pub text: String,
}
