//! Paragrapher (spec §4.13): deterministic segmentation of readable
//! markdown into stable `(expression_id, index, text)` triples. A pure
//! function with no embedding-provider dependency — this crate owns only
//! the segmentation contract.

use uuid::Uuid;

use crate::model::Paragraph;

const MIN_PARAGRAPH_CHARS: usize = 20;

/// Splits `readable` on blank-line boundaries, drops empty/too-short
/// segments, and assigns a stable index in order of appearance. Returns an
/// empty vec when `readable` has no usable text — callers should only
/// invoke this once readable text exists (spec §3: "produced only when
/// readable text exists").
pub fn segment(expression_id: Uuid, readable: &str) -> Vec<Paragraph> {
    readable
        .split("\n\n")
        .map(|block| block.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| text.chars().count() >= MIN_PARAGRAPH_CHARS)
        .enumerate()
        .map(|(index, text)| Paragraph { id: Uuid::new_v4(), expression_id, index: index as u32, text })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines_and_preserves_order() {
        let readable = "First paragraph with enough characters to count.\n\nSecond paragraph also long enough.";
        let paragraphs = segment(Uuid::new_v4(), readable);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].index, 0);
        assert_eq!(paragraphs[1].index, 1);
        assert!(paragraphs[0].text.starts_with("First paragraph"));
    }

    #[test]
    fn drops_short_segments() {
        let readable = "ok\n\nThis one is long enough to survive filtering.";
        let paragraphs = segment(Uuid::new_v4(), readable);
        assert_eq!(paragraphs.len(), 1);
    }

    #[test]
    fn empty_readable_yields_no_paragraphs() {
        assert!(segment(Uuid::new_v4(), "").is_empty());
    }

    #[test]
    fn segmentation_is_deterministic() {
        let readable = "Alpha paragraph with sufficient length here.\n\nBeta paragraph also sufficiently long.";
        let id = Uuid::new_v4();
        let as_pairs = |paras: Vec<Paragraph>| paras.into_iter().map(|p| (p.index, p.text)).collect::<Vec<_>>();
        assert_eq!(as_pairs(segment(id, readable)), as_pairs(segment(id, readable)));
    }
}
