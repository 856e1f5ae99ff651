//! QualityScorer (spec §4.4): five weighted, independently pure blocks
//! summed and clamped to `[0,1]`. Deterministic given its inputs — no
//! network or clock access.

use std::time::Duration;

const ACCESS_WEIGHT: f64 = 0.30;
const STRUCTURE_WEIGHT: f64 = 0.15;
const RICHNESS_WEIGHT: f64 = 0.25;
const COHERENCE_WEIGHT: f64 = 0.20;
const INTEGRITY_WEIGHT: f64 = 0.10;

const ACCESS_ELAPSED_CEILING: Duration = Duration::from_secs(5);
const RICHNESS_WORD_FLOOR: u32 = 300;
const RICHNESS_LINK_RANGE: std::ops::RangeInclusive<u32> = 3..=50;
const STRUCTURE_PARAGRAPH_FLOOR: u32 = 3;

#[derive(Debug, Clone)]
pub struct QualityInputs {
    pub http_status: u16,
    pub elapsed: Duration,
    pub content_type_is_html_ish: bool,
    pub has_title: bool,
    pub heading_density: f64,
    pub paragraph_count: u32,
    pub word_count: u32,
    pub media_count: u32,
    pub outbound_link_count: u32,
    pub title_body_lemma_overlap: f64,
    pub has_canonical: bool,
    pub language_detected: bool,
    pub is_duplicate_content_hash: bool,
}

pub fn score(inputs: &QualityInputs) -> f64 {
    let total = access(inputs) * ACCESS_WEIGHT
        + structure(inputs) * STRUCTURE_WEIGHT
        + richness(inputs) * RICHNESS_WEIGHT
        + coherence(inputs) * COHERENCE_WEIGHT
        + integrity(inputs) * INTEGRITY_WEIGHT;
    total.clamp(0.0, 1.0)
}

fn access(inputs: &QualityInputs) -> f64 {
    let ok = (200..300).contains(&inputs.http_status)
        && inputs.elapsed < ACCESS_ELAPSED_CEILING
        && inputs.content_type_is_html_ish;
    if ok {
        1.0
    } else {
        0.0
    }
}

fn structure(inputs: &QualityInputs) -> f64 {
    let title_component = if inputs.has_title { 1.0 } else { 0.0 };
    let heading_component = inputs.heading_density.clamp(0.0, 1.0);
    let paragraph_component = if inputs.paragraph_count >= STRUCTURE_PARAGRAPH_FLOOR { 1.0 } else { 0.0 };
    (title_component + heading_component + paragraph_component) / 3.0
}

fn richness(inputs: &QualityInputs) -> f64 {
    let word_component = if inputs.word_count >= RICHNESS_WORD_FLOOR { 1.0 } else { 0.0 };
    let media_component = if inputs.media_count >= 1 { 1.0 } else { 0.0 };
    let link_component = if RICHNESS_LINK_RANGE.contains(&inputs.outbound_link_count) { 1.0 } else { 0.0 };
    (word_component + media_component + link_component) / 3.0
}

fn coherence(inputs: &QualityInputs) -> f64 {
    inputs.title_body_lemma_overlap.clamp(0.0, 1.0)
}

fn integrity(inputs: &QualityInputs) -> f64 {
    let canonical_component = if inputs.has_canonical { 1.0 } else { 0.0 };
    let language_component = if inputs.language_detected { 1.0 } else { 0.0 };
    let duplicate_component = if inputs.is_duplicate_content_hash { 0.0 } else { 1.0 };
    (canonical_component + language_component + duplicate_component) / 3.0
}
