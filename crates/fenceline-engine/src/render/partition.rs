//! Boundary partitioning: one line's text plus its annotations become one
//! node tree.
//!
//! The text is sliced into non-overlapping segments at every annotation
//! boundary, then annotations are applied tier by tier. An annotation
//! spanning several segments merges them into a single node first when that
//! cannot trap a later annotation inside an illegal partial nesting;
//! otherwise the segments stay separate and are transformed independently.
//! Merging collapses segment indices, so every other annotation's coverage
//! list is rewritten to match.

use crate::block::annotation::Annotation;
use crate::block::line::Line;
use crate::block::range::InlineRange;
use crate::error::EngineError;
use crate::render::node::Node;

/// One slice of the line under assembly. `start`/`end` are byte offsets into
/// the original text; `node` starts as the plain text slice and accumulates
/// render output.
#[derive(Debug)]
pub(crate) struct Segment {
    pub start: usize,
    pub end: usize,
    pub node: Node,
}

/// Slice `text` at every distinct boundary of the given ranges. Zero-width
/// cuts are skipped; the remainder after the last boundary becomes the final
/// segment. Concatenating the produced slices always reconstructs `text`.
pub(crate) fn slice_segments(text: &str, ranges: impl Iterator<Item = InlineRange>) -> Vec<Segment> {
    let mut boundaries: Vec<usize> = ranges.flat_map(|range| [range.start, range.end]).collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut segments = Vec::new();
    let mut prev = 0;
    for boundary in boundaries {
        let boundary = boundary.min(text.len());
        if boundary <= prev {
            continue;
        }
        segments.push(Segment {
            start: prev,
            end: boundary,
            node: Node::Text(text[prev..boundary].to_string()),
        });
        prev = boundary;
    }
    if prev < text.len() {
        segments.push(Segment {
            start: prev,
            end: text.len(),
            node: Node::Text(text[prev..].to_string()),
        });
    }
    segments
}

/// Indices of the segments fully contained in `range`.
fn covered_indices(segments: &[Segment], range: InlineRange) -> Vec<usize> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.start >= range.start && segment.end <= range.end)
        .map(|(index, _)| index)
        .collect()
}

/// Does any annotation after `k` cover some but not all of `k`'s segments?
/// Merging `k` would then either split the later annotation's target or drag
/// segments it doesn't own into its wrapper, so `k` must keep its segments
/// separate. Supersets and identical coverage are fine. The check is
/// pairwise; three-way mutual partial overlaps get no special treatment.
fn has_partial_later_overlap(coverage: &[Vec<usize>], k: usize) -> bool {
    let covered = &coverage[k];
    coverage[k + 1..].iter().any(|later| {
        let shared = later.iter().filter(|index| covered.contains(index)).count();
        shared > 0 && shared < covered.len()
    })
}

/// Collapse annotation `k`'s covered segments into one, rewriting every
/// coverage list: indices before the merged span are kept, indices inside
/// collapse onto its first index, indices after shift down.
fn merge_segments(segments: &mut Vec<Segment>, coverage: &mut [Vec<usize>], k: usize) {
    let covered = coverage[k].clone();
    debug_assert!(covered.len() > 1);
    debug_assert!(covered.windows(2).all(|pair| pair[1] == pair[0] + 1));

    let first = covered[0];
    let last = covered[covered.len() - 1];
    let removed = covered.len() - 1;

    let drained: Vec<Segment> = segments.drain(first..=last).collect();
    let start = drained[0].start;
    let end = drained[drained.len() - 1].end;
    let node = if drained.iter().all(|segment| matches!(segment.node, Node::Text(_))) {
        let mut text = String::new();
        for segment in &drained {
            if let Node::Text(slice) = &segment.node {
                text.push_str(slice);
            }
        }
        Node::Text(text)
    } else {
        Node::Group(drained.into_iter().map(|segment| segment.node).collect())
    };
    segments.insert(first, Segment { start, end, node });

    for list in coverage.iter_mut() {
        for index in list.iter_mut() {
            if *index > last {
                *index -= removed;
            } else if *index >= first {
                *index = first;
            }
        }
        list.dedup();
    }
}

/// Render one line into its node tree.
pub(crate) fn render_line(line: &Line) -> Result<Node, EngineError> {
    let mut inline: Vec<(&Annotation, InlineRange)> = Vec::new();
    let mut full_line: Vec<&Annotation> = Vec::new();
    for (_, annotation) in line.annotations() {
        match annotation.inline_range {
            Some(range) => inline.push((annotation, range)),
            None => full_line.push(annotation),
        }
    }
    // stable sort: ties keep registration order
    inline.sort_by_key(|(annotation, _)| annotation.render_phase);
    full_line.sort_by_key(|annotation| annotation.render_phase);

    let mut segments = slice_segments(line.text(), inline.iter().map(|(_, range)| *range));
    let mut coverage: Vec<Vec<usize>> = inline
        .iter()
        .map(|(_, range)| covered_indices(&segments, *range))
        .collect();

    for k in 0..inline.len() {
        if coverage[k].is_empty() {
            continue;
        }
        if coverage[k].len() > 1 && !has_partial_later_overlap(&coverage, k) {
            merge_segments(&mut segments, &mut coverage, k);
        }

        let (annotation, _) = inline[k];
        let covered = &coverage[k];
        let input: Vec<Node> = covered.iter().map(|&index| segments[index].node.clone()).collect();
        let expected = input.len();
        let output = annotation.render.apply(input);
        if output.len() != expected {
            return Err(EngineError::RenderCountMismatch {
                name: annotation.name.clone(),
                expected,
                got: output.len(),
            });
        }
        for (&slot, node) in covered.iter().zip(output) {
            segments[slot].node = node;
        }
    }

    let children: Vec<Node> = if segments.is_empty() {
        vec![Node::Text(String::new())]
    } else {
        segments.into_iter().map(|segment| segment.node).collect()
    };
    let mut line_node = Node::Line(children);

    for annotation in full_line {
        let output = annotation.render.apply(vec![line_node]);
        let [node] = <[Node; 1]>::try_from(output).map_err(|output| EngineError::RenderCountMismatch {
            name: annotation.name.clone(),
            expected: 1,
            got: output.len(),
        })?;
        line_node = node;
    }
    Ok(line_node)
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::block::BlockId;
    use crate::block::annotation::{AnnotationEntry, AnnotationId, AnnotationRender, RenderPhase};

    use super::*;

    fn line_with(text: &str, annotations: Vec<Annotation>) -> Line {
        let mut line = Line::new(text, BlockId::new());
        for annotation in annotations {
            line.annotations.push(AnnotationEntry {
                id: AnnotationId::new(),
                inner: annotation,
            });
        }
        line
    }

    fn wrap(name: &str, start: usize, end: usize) -> Annotation {
        Annotation::inline(name, InlineRange::new(start, end), AnnotationRender::wrap(name))
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![(0, 5)])]
    #[case(vec![(2, 7), (4, 9)])]
    #[case(vec![(0, 1), (1, 2), (2, 3)])]
    #[case(vec![(3, 3)])]
    #[case(vec![(0, 11)])]
    #[case(vec![(0, 4), (4, 11), (2, 9)])]
    fn test_segments_concatenate_to_original_text(#[case] ranges: Vec<(usize, usize)>) {
        let text = "hello world";
        let segments = slice_segments(
            text,
            ranges.iter().map(|&(start, end)| InlineRange::new(start, end)),
        );

        let rebuilt: String = segments.iter().map(|segment| segment.node.plain_text()).collect();
        assert_eq!(rebuilt, text);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "segments must be adjacent");
        }
    }

    #[test]
    fn test_unannotated_line_renders_as_plain_text() {
        let line = line_with("let x = 1;", vec![]);
        let node = render_line(&line).unwrap();
        assert_eq!(node, Node::Line(vec![Node::text("let x = 1;")]));
    }

    #[test]
    fn test_empty_line_renders_one_empty_text_node() {
        let line = line_with("", vec![]);
        let node = render_line(&line).unwrap();
        assert_eq!(node, Node::Line(vec![Node::Text(String::new())]));
    }

    #[test]
    fn test_identical_ranges_nest_innermost_first_registered() {
        // "rendered" occupies columns 10..18
        let text = "Wow, I am rendered!";
        let line = line_with(text, vec![wrap("0", 10, 18), wrap("1", 10, 18)]);
        let node = render_line(&line).unwrap();
        assert_eq!(node.to_compact_string(), "Wow, I am <1><0>rendered</0></1>!");
    }

    #[test]
    fn test_nested_range_blocks_outer_merge() {
        let line = line_with("0123456789", vec![wrap("out", 0, 10), wrap("in", 2, 5)]);
        let node = render_line(&line).unwrap();
        assert_snapshot!(
            node.to_compact_string(),
            @"<out>01</out><in><out>234</out></in><out>56789</out>"
        );
    }

    #[test]
    fn test_partial_overlap_keeps_segments_separate() {
        let line = line_with("012345678", vec![wrap("a", 0, 6), wrap("b", 3, 9)]);
        let node = render_line(&line).unwrap();
        assert_snapshot!(node.to_compact_string(), @"<a>012</a><b><a>345</a>678</b>");
    }

    #[test]
    fn test_merge_produces_single_render_call_over_group() {
        let earliest = wrap("b", 0, 3).with_phase(RenderPhase::Earliest);
        let line = line_with("012345", vec![wrap("a", 0, 6), earliest]);
        let node = render_line(&line).unwrap();
        assert_eq!(node.to_compact_string(), "<a><b>012</b>345</a>");

        // the merged segments sit in one group under the single wrapper
        let Node::Line(children) = &node else {
            panic!("expected line node");
        };
        assert_eq!(children.len(), 1);
        let Node::Element(element) = &children[0] else {
            panic!("expected wrapping element");
        };
        assert!(matches!(element.children[0], Node::Group(_)));
    }

    #[test]
    fn test_merge_of_untouched_text_concatenates() {
        // the zero-width annotation cuts a boundary at 3 but covers nothing,
        // so "a" may merge its two still-plain segments back into one text
        // node before rendering
        let line = line_with("012345", vec![wrap("a", 0, 6), wrap("zero", 3, 3)]);
        let node = render_line(&line).unwrap();
        assert_eq!(node.to_compact_string(), "<a>012345</a>");

        let Node::Line(children) = &node else {
            panic!("expected line node");
        };
        let Node::Element(element) = &children[0] else {
            panic!("expected wrapping element");
        };
        assert_eq!(element.children, vec![Node::text("012345")]);
    }

    #[test]
    fn test_phase_order_beats_registration_order() {
        let line = line_with(
            "text",
            vec![
                wrap("later", 0, 4),
                wrap("early", 0, 4).with_phase(RenderPhase::Earliest),
            ],
        );
        let node = render_line(&line).unwrap();
        assert_eq!(node.to_compact_string(), "<later><early>text</early></later>");
    }

    #[test]
    fn test_zero_width_annotation_renders_nothing() {
        let line = line_with("abcd", vec![wrap("zero", 2, 2)]);
        let node = render_line(&line).unwrap();
        assert_eq!(node.to_compact_string(), "abcd");
    }

    #[test]
    fn test_full_line_annotations_apply_in_phase_order() {
        let line = line_with(
            "code",
            vec![
                Annotation::full_line("outer", AnnotationRender::wrap("outer")),
                Annotation::full_line("inner", AnnotationRender::wrap("inner"))
                    .with_phase(RenderPhase::Earlier),
            ],
        );
        let node = render_line(&line).unwrap();
        assert_eq!(node.to_compact_string(), "<outer><inner>code</inner></outer>");
    }

    #[test]
    fn test_inline_render_count_violation_fails_fast() {
        let bad = Annotation::inline(
            "bad",
            InlineRange::new(0, 3),
            AnnotationRender::with(|_| Vec::new()),
        );
        let line = line_with("abc", vec![bad]);
        let err = render_line(&line).unwrap_err();
        assert!(matches!(
            err,
            EngineError::RenderCountMismatch { expected: 1, got: 0, .. }
        ));
    }

    #[test]
    fn test_full_line_render_count_violation_fails_fast() {
        let bad = Annotation::full_line(
            "bad",
            AnnotationRender::with(|nodes| {
                let mut doubled = nodes.clone();
                doubled.extend(nodes);
                doubled
            }),
        );
        let line = line_with("abc", vec![bad]);
        let err = render_line(&line).unwrap_err();
        assert!(matches!(
            err,
            EngineError::RenderCountMismatch { expected: 1, got: 2, .. }
        ));
    }

    #[test]
    fn test_blocked_annotation_transforms_each_segment() {
        // "a" covers two segments and is blocked by the later partial "b";
        // its wrapper must appear once per segment, not once overall
        let line = line_with("0123456789", vec![wrap("a", 0, 6), wrap("b", 3, 10)]);
        let node = render_line(&line).unwrap();
        let compact = node.to_compact_string();
        assert_eq!(compact.matches("<a>").count(), 2);
        assert_eq!(compact, "<a>012</a><b><a>345</a>6789</b>");
    }
}
