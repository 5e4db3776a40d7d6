//! Turns an alignment into display segments flagged changed/unchanged.
//!
//! Each row gets two independent comparisons: the original text against the
//! automatic update (left view) and the original text against the reviewer's
//! current content (right view).

use crate::align::{align, Alignment, Side};
use crate::tokenize::tokenize;
use crate::types::Row;

/// A fragment of displayed text and whether it differs from the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub changed: bool,
}

impl<'a> Segment<'a> {
    pub fn plain(text: &'a str) -> Self {
        Self { text, changed: false }
    }

    pub fn changed(text: &'a str) -> Self {
        Self { text, changed: true }
    }
}

/// Emits every fragment of `source` in order, flagging the ones absent from
/// `alignment` on `side`.
pub fn render_side<'a>(source: &[&'a str], alignment: &Alignment, side: Side) -> Vec<Segment<'a>> {
    let matched = alignment.matched_mask(side, source.len());
    source
        .iter()
        .zip(matched)
        .map(|(&text, is_matched)| Segment { text, changed: !is_matched })
        .collect()
}

/// Compares `original` with `revised` and renders the requested side.
///
/// Byte-identical inputs skip tokenizing entirely and come back as a single
/// unflagged segment.
pub fn highlight<'a>(original: &'a str, revised: &'a str, side: Side) -> Vec<Segment<'a>> {
    if original == revised {
        return if original.is_empty() { Vec::new() } else { vec![Segment::plain(original)] };
    }

    let orig_parts = tokenize(original);
    let rev_parts = tokenize(revised);
    let alignment = align(&orig_parts, &rev_parts);
    match side {
        Side::Original => render_side(&orig_parts, &alignment, Side::Original),
        Side::Revised => render_side(&rev_parts, &alignment, Side::Revised),
    }
}

/// Both highlighted views of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHighlights<'a> {
    /// Original content, flagged where the automatic update differs.
    pub original: Vec<Segment<'a>>,
    /// Current (effective) content, flagged where it differs from the original.
    pub current: Vec<Segment<'a>>,
}

/// Computes the two views for a row, each from its own alignment.
pub fn highlight_row(row: &Row) -> RowHighlights<'_> {
    let original = row.original_content.as_str();
    let updated = row.updated_content.as_deref().unwrap_or(original);
    RowHighlights {
        original: highlight(original, updated, Side::Original),
        current: highlight(original, row.effective_content(), Side::Revised),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::ManualPolicy;
    use crate::types::Role;

    fn changed_texts<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments.iter().filter(|s| s.changed).map(|s| s.text).collect()
    }

    #[test]
    fn identical_text_is_one_plain_segment() {
        let segments = highlight("你好。", "你好。", Side::Original);
        assert_eq!(segments, vec![Segment::plain("你好。")]);
        assert!(highlight("", "", Side::Revised).is_empty());
    }

    #[test]
    fn each_side_flags_its_own_changed_clause() {
        let orig = "你好。订单已发货！";
        let upd = "你好。订单已经发货！";
        assert_eq!(changed_texts(&highlight(orig, upd, Side::Original)), vec!["订单已发货"]);
        assert_eq!(changed_texts(&highlight(orig, upd, Side::Revised)), vec!["订单已经发货"]);
    }

    #[test]
    fn render_side_preserves_order_and_count() {
        let source = ["a", "，", "b"];
        let alignment = align(&source, &["a", "c"]);
        let segments = render_side(&source, &alignment, Side::Original);
        assert_eq!(
            segments,
            vec![Segment::plain("a"), Segment::changed("，"), Segment::changed("b")]
        );
    }

    #[test]
    fn fully_replaced_text_is_all_changed() {
        let segments = highlight("旧的", "全新", Side::Revised);
        assert_eq!(segments, vec![Segment::changed("全新")]);
    }

    #[test]
    fn row_views_use_separate_alignments() {
        let mut row = Row::new(0, Role::Agent, "您好。请稍等。", Some("您好！请稍等。"));
        row.manual("您好。马上处理。", ManualPolicy::default()).unwrap();

        let views = highlight_row(&row);
        // Left compares against the update: only the exclamation mark moved.
        assert_eq!(changed_texts(&views.original), vec!["。"]);
        // Right compares against the manual text.
        assert_eq!(changed_texts(&views.current), vec!["马上处理"]);
    }

    #[test]
    fn row_without_update_shows_no_changes() {
        let row = Row::new(3, Role::Customer, "在吗？", None);
        let views = highlight_row(&row);
        assert_eq!(views.original, vec![Segment::plain("在吗？")]);
        assert_eq!(views.current, vec![Segment::plain("在吗？")]);
    }
}
