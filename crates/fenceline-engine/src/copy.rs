//! Clipboard projection: queued copy transforms resolved into plaintext.
//!
//! Resolution never touches the canonical lines. A working list of entries
//! (one per line, tagged with the source line's identity and original
//! index) is edited in a deterministic order, then joined with newlines.
//! Targets are re-located by identity at every step because earlier splices
//! shift positions.
//!
//! Line-ops (`RemoveLine`, `EditText`) sort independent of registration
//! order except as final tiebreak: highest original line index first, then
//! removals before edits, then edits right to left (descending start, then
//! descending end), then the later registration last so its replacement
//! survives an exact tie. Right-to-left application keeps earlier column
//! offsets valid without drift; a removal outranking an edit on the same
//! line makes the edit find its entry gone and be silently discarded.
//!
//! Insert-ops run afterwards in registration order. An anchor whose entry
//! was removed is reconstructed from the nearest surviving entry by
//! original index, in the direction the transform's `on_delete_line`
//! fallback prefers.

use std::cmp::Reverse;

use crate::block::line::{Line, LineId};
use crate::block::transform::{AnchorFallback, CopyTransform, InsertPosition, TransformSeq};

struct Entry {
    text: String,
    origin: Option<Origin>,
}

/// Identity and original position of the source line behind an entry.
/// Synthetic entries (edit-split tails, inserted literals) have none.
#[derive(Clone, Copy)]
struct Origin {
    index: usize,
    id: LineId,
}

enum LineOpKind {
    Remove,
    Edit { start: usize, end: usize, new_text: Vec<String> },
}

struct LineOp {
    origin_index: usize,
    target: LineId,
    seq: TransformSeq,
    kind: LineOpKind,
}

struct InsertOp {
    origin_index: usize,
    anchor: LineId,
    seq: TransformSeq,
    lines: Vec<String>,
    position: InsertPosition,
    on_delete_line: AnchorFallback,
}

/// Resolve the copied plaintext for the given lines.
pub(crate) fn resolve_copy_text(lines: &[Line]) -> String {
    let mut entries: Vec<Entry> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| Entry {
            text: line.text().to_string(),
            origin: Some(Origin { index, id: line.id() }),
        })
        .collect();

    let (mut line_ops, mut insert_ops) = collect_ops(lines);

    line_ops.sort_by_key(|op| {
        let (rank, start, end) = match &op.kind {
            LineOpKind::Remove => (0, 0, 0),
            LineOpKind::Edit { start, end, .. } => (1, *start, *end),
        };
        (Reverse(op.origin_index), rank, Reverse(start), Reverse(end), op.seq)
    });
    for op in line_ops {
        apply_line_op(&mut entries, op);
    }

    insert_ops.sort_by_key(|op| op.seq);
    for op in insert_ops {
        apply_insert_op(&mut entries, op);
    }

    let texts: Vec<&str> = entries.iter().map(|entry| entry.text.as_str()).collect();
    texts.join("\n")
}

fn collect_ops(lines: &[Line]) -> (Vec<LineOp>, Vec<InsertOp>) {
    let mut line_ops = Vec::new();
    let mut insert_ops = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        for entry in &line.copy_transforms {
            match &entry.transform {
                CopyTransform::RemoveLine => line_ops.push(LineOp {
                    origin_index: index,
                    target: line.id(),
                    seq: entry.seq,
                    kind: LineOpKind::Remove,
                }),
                CopyTransform::EditText { inline_range, new_text } => {
                    let (start, end) = match inline_range {
                        Some(range) => (range.start, range.end),
                        None => (0, line.text().len()),
                    };
                    line_ops.push(LineOp {
                        origin_index: index,
                        target: line.id(),
                        seq: entry.seq,
                        kind: LineOpKind::Edit { start, end, new_text: new_text.clone() },
                    });
                }
                CopyTransform::InsertLines { lines: texts, position, on_delete_line } => {
                    insert_ops.push(InsertOp {
                        origin_index: index,
                        anchor: line.id(),
                        seq: entry.seq,
                        lines: texts.clone(),
                        position: *position,
                        on_delete_line: *on_delete_line,
                    });
                }
            }
        }
    }
    (line_ops, insert_ops)
}

fn apply_line_op(entries: &mut Vec<Entry>, op: LineOp) {
    let target = entries
        .iter()
        .position(|entry| entry.origin.is_some_and(|origin| origin.id == op.target));
    // entry already removed by a higher-priority RemoveLine
    let Some(position) = target else { return };

    match op.kind {
        LineOpKind::Remove => {
            entries.remove(position);
        }
        LineOpKind::Edit { start, end, new_text } => {
            let text = &entries[position].text;
            let start = clamp_boundary(text, start);
            let end = clamp_boundary(text, end).max(start);

            let mut replaced = String::with_capacity(text.len());
            replaced.push_str(&text[..start]);
            replaced.push_str(&new_text.join("\n"));
            replaced.push_str(&text[end..]);

            let mut parts = replaced.split('\n');
            if let Some(first) = parts.next() {
                entries[position].text = first.to_string();
            }
            let tail: Vec<Entry> = parts
                .map(|part| Entry { text: part.to_string(), origin: None })
                .collect();
            entries.splice(position + 1..position + 1, tail);
        }
    }
}

fn apply_insert_op(entries: &mut Vec<Entry>, op: InsertOp) {
    let target = entries
        .iter()
        .position(|entry| entry.origin.is_some_and(|origin| origin.id == op.anchor));
    let at = match target {
        Some(position) => match op.position {
            InsertPosition::Before => position,
            InsertPosition::After => position + 1,
        },
        None => match reconstruct_anchor(entries, op.origin_index, op.on_delete_line) {
            Some((position, InsertPosition::Before)) => position,
            Some((position, InsertPosition::After)) => position + 1,
            None => return,
        },
    };
    let splice = op
        .lines
        .into_iter()
        .map(|text| Entry { text, origin: None });
    entries.splice(at..at, splice);
}

/// Find where a vanished anchor's insertion should land: the nearest
/// surviving entry whose original index precedes/follows the anchor's, in
/// the direction `fallback` prefers, with the opposite direction as backup.
fn reconstruct_anchor(
    entries: &[Entry],
    anchor_index: usize,
    fallback: AnchorFallback,
) -> Option<(usize, InsertPosition)> {
    let survivors: Vec<(usize, usize)> = entries
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| entry.origin.map(|origin| (position, origin.index)))
        .collect();

    let prev = survivors
        .iter()
        .filter(|&&(_, index)| index < anchor_index)
        .max_by_key(|&&(_, index)| index)
        .map(|&(position, _)| (position, InsertPosition::After));
    let next = survivors
        .iter()
        .filter(|&&(_, index)| index > anchor_index)
        .min_by_key(|&&(_, index)| index)
        .map(|&(position, _)| (position, InsertPosition::Before));

    match fallback {
        AnchorFallback::StickPrev => prev.or(next),
        AnchorFallback::StickNext => next.or(prev),
        AnchorFallback::Drop => None,
    }
}

/// Clamp `at` into `text`, stepping back to the nearest char boundary.
/// Column offsets are validated at registration against the canonical text;
/// by resolution time a competing edit may already have reshaped the entry.
fn clamp_boundary(text: &str, at: usize) -> usize {
    let mut at = at.min(text.len());
    while at > 0 && !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::block::Block;
    use crate::block::range::InlineRange;

    use super::*;

    fn edit(start: usize, end: usize, new_text: &[&str]) -> CopyTransform {
        CopyTransform::EditText {
            inline_range: Some(InlineRange::new(start, end)),
            new_text: new_text.iter().map(|text| text.to_string()).collect(),
        }
    }

    fn insert(texts: &[&str], position: InsertPosition, fallback: AnchorFallback) -> CopyTransform {
        CopyTransform::InsertLines {
            lines: texts.iter().map(|text| text.to_string()).collect(),
            position,
            on_delete_line: fallback,
        }
    }

    #[test]
    fn test_copy_round_trips_without_transforms() {
        let block = Block::new("fn main() {\n    x();\n}", "rust", "");
        assert_eq!(block.copy_text(), block.code());
    }

    #[test]
    fn test_remove_line_discards_later_edit_on_same_line() {
        let block_text = "const keep = 1\n// marker\nconst remove = 2";
        let mut block = Block::new(block_text, "js", "");
        block.add_copy_transform(1, CopyTransform::RemoveLine).unwrap();
        block.add_copy_transform(2, CopyTransform::RemoveLine).unwrap();
        block
            .add_copy_transform(
                2,
                CopyTransform::EditText {
                    inline_range: None,
                    new_text: vec!["THIS MUST NOT APPEAR".to_string()],
                },
            )
            .unwrap();

        assert_eq!(block.copy_text(), "const keep = 1");
    }

    #[test]
    fn test_edits_apply_right_to_left_without_offset_drift() {
        let mut block = Block::new("abcdef", "", "");
        // registered left to right; resolution order is right to left
        block.add_copy_transform(0, edit(0, 2, &["X"])).unwrap();
        block.add_copy_transform(0, edit(4, 6, &["Y"])).unwrap();

        assert_eq!(block.copy_text(), "XcdY");
    }

    #[test]
    fn test_later_registered_edit_wins_exact_tie() {
        let mut block = Block::new("value", "", "");
        block.add_copy_transform(0, edit(0, 5, &["first"])).unwrap();
        block.add_copy_transform(0, edit(0, 5, &["second"])).unwrap();

        // identical spans: the later registration applies last and its
        // replacement is what ends up in the clipboard
        assert_eq!(block.copy_text(), "second");
    }

    #[test]
    fn test_whole_line_edit_without_range() {
        let mut block = Block::new("before\ntarget\nafter", "", "");
        block
            .add_copy_transform(
                1,
                CopyTransform::EditText { inline_range: None, new_text: vec!["swapped".to_string()] },
            )
            .unwrap();

        assert_eq!(block.copy_text(), "before\nswapped\nafter");
    }

    #[test]
    fn test_multi_line_edit_splits_into_entries() {
        let mut block = Block::new("head\nbody\ntail", "", "");
        block
            .add_copy_transform(1, edit(0, 4, &["one", "two", "three"]))
            .unwrap();

        assert_eq!(block.copy_text(), "head\none\ntwo\nthree\ntail");
    }

    #[test]
    fn test_inserts_land_before_and_after_anchors() {
        let mut block = Block::new("a\nb\nc", "", "");
        block
            .add_copy_transform(0, insert(&["x"], InsertPosition::After, AnchorFallback::Drop))
            .unwrap();
        block
            .add_copy_transform(2, insert(&["y"], InsertPosition::Before, AnchorFallback::Drop))
            .unwrap();

        assert_eq!(block.copy_text(), "a\nx\nb\ny\nc");
    }

    #[test]
    fn test_later_after_insert_lands_closest_to_anchor() {
        let mut block = Block::new("x", "", "");
        block
            .add_copy_transform(0, insert(&["first"], InsertPosition::After, AnchorFallback::Drop))
            .unwrap();
        block
            .add_copy_transform(0, insert(&["second"], InsertPosition::After, AnchorFallback::Drop))
            .unwrap();

        assert_eq!(block.copy_text(), "x\nsecond\nfirst");
    }

    #[test]
    fn test_insert_reconstructs_anchor_removed_from_copy() {
        let mut block = Block::new("a\nb\nc\nd", "", "");
        block.add_copy_transform(1, CopyTransform::RemoveLine).unwrap();
        block.add_copy_transform(2, CopyTransform::RemoveLine).unwrap();
        block
            .add_copy_transform(1, insert(&["B"], InsertPosition::After, AnchorFallback::StickPrev))
            .unwrap();

        // b's entry is gone; the nearest surviving earlier line is a
        assert_eq!(block.copy_text(), "a\nB\nd");
    }

    #[test]
    fn test_insert_falls_back_across_the_gap_when_direction_is_empty() {
        let mut block = Block::new("a\nb", "", "");
        block.add_copy_transform(0, CopyTransform::RemoveLine).unwrap();
        block
            .add_copy_transform(0, insert(&["A"], InsertPosition::After, AnchorFallback::StickPrev))
            .unwrap();

        // nothing precedes line 0; StickPrev falls back to the next survivor
        assert_eq!(block.copy_text(), "A\nb");
    }

    #[test]
    fn test_insert_with_drop_fallback_vanishes_with_anchor() {
        let mut block = Block::new("a\nb", "", "");
        block.add_copy_transform(1, CopyTransform::RemoveLine).unwrap();
        block
            .add_copy_transform(1, insert(&["gone"], InsertPosition::Before, AnchorFallback::Drop))
            .unwrap();

        assert_eq!(block.copy_text(), "a");
    }

    #[test]
    fn test_edit_split_tail_cannot_anchor_reconstruction() {
        let mut block = Block::new("a\nb", "", "");
        block.add_copy_transform(0, edit(0, 1, &["a1", "a2"])).unwrap();
        block.add_copy_transform(1, CopyTransform::RemoveLine).unwrap();
        block
            .add_copy_transform(1, insert(&["B"], InsertPosition::After, AnchorFallback::StickPrev))
            .unwrap();

        // reconstruction may only anchor on the entry that kept line 0's
        // identity (a1); the synthetic tail a2 is invisible to it
        assert_eq!(block.copy_text(), "a1\nB\na2");
    }

    #[test]
    fn test_copy_of_empty_block_is_empty() {
        let block = Block::new("", "", "");
        assert_eq!(block.copy_text(), "");
    }
}
