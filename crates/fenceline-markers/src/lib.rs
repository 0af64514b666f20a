//! # fenceline-markers
//!
//! Marker plugin: drives annotations and transforms from a block's meta
//! string ([`meta`] module) and from in-code directives. This is the
//! workspace's production consumer of the engine's copy and render transform
//! queues.
//!
//! ## What it does
//!
//! - **Snip directives** (`preprocess_code`): a line whose trimmed text is
//!   `// [!snip]` or `# [!snip]` is deleted and replaced, in the rendered
//!   output only, by a single ellipsis line. The copied text simply omits the
//!   snipped region.
//! - **Diff mode** (`preprocess_code`, `diff` meta flag): lines starting
//!   with `+`/`-` have the marker stripped, carry a full-line `ins`/`del`
//!   annotation, and `-` lines are removed from the copied text so the
//!   clipboard reflects the post-diff state.
//! - **Marks** (`annotate_code`): line ranges become full-line annotations;
//!   substring and regex selectors become inline annotations on every match
//!   of each line's current text.

pub mod meta;

use fenceline_engine::{
    AnchorFallback, Annotation, AnnotationRender, Block, CopyTransform, EngineError, InlineRange,
    InsertPosition, Node, Plugin, RenderTransform,
};

use crate::meta::{Mark, MarkKind, Selector, parse_meta};

/// Text of the synthetic line standing in for snipped code.
pub const ELLIPSIS: &str = "⋯";

/// The marker plugin. Stateless; configuration comes entirely from each
/// block's meta string.
#[derive(Debug, Default)]
pub struct Markers;

impl Markers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for Markers {
    fn name(&self) -> &str {
        "markers"
    }

    fn preprocess_code(&self, block: &mut Block) -> anyhow::Result<()> {
        let spec = parse_meta(block.meta())?;
        apply_snips(block)?;
        if spec.diff {
            apply_diff(block)?;
        }
        Ok(())
    }

    fn annotate_code(&self, block: &mut Block) -> anyhow::Result<()> {
        let spec = parse_meta(block.meta())?;
        for mark in &spec.marks {
            apply_mark(block, mark)?;
        }
        Ok(())
    }
}

fn is_snip_directive(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed == "// [!snip]" || trimmed == "# [!snip]"
}

/// Replace each snip directive line with a render-only ellipsis. The
/// transform anchors on the directive line itself; deleting that line
/// re-homes it onto the next surviving line, which is exactly where the
/// ellipsis belongs.
fn apply_snips(block: &mut Block) -> Result<(), EngineError> {
    let directives: Vec<usize> = block
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| is_snip_directive(line.text()))
        .map(|(index, _)| index)
        .collect();
    if directives.is_empty() {
        return Ok(());
    }

    for &index in &directives {
        block.add_render_transform(
            index,
            RenderTransform::insert(
                InsertPosition::Before,
                AnchorFallback::StickNext,
                |factory| vec![factory.line(vec![Node::text(ELLIPSIS)])],
            ),
        )?;
    }
    block.delete_lines(&directives)
}

fn apply_diff(block: &mut Block) -> Result<(), EngineError> {
    let mut edits: Vec<(usize, MarkKind, isize)> = Vec::new();
    for (index, line) in block.lines().iter().enumerate() {
        let text = line.text();
        let kind = if text.starts_with('+') {
            MarkKind::Ins
        } else if text.starts_with('-') {
            MarkKind::Del
        } else {
            continue;
        };
        // strip the marker and at most one following space
        let strip = if text[1..].starts_with(' ') { 2 } else { 1 };
        edits.push((index, kind, strip));
    }

    for (index, kind, strip) in edits {
        block.edit_line_text(index, Some(0), Some(strip), "")?;
        block.add_annotation(
            index,
            Annotation::full_line(kind.element(), AnnotationRender::wrap(kind.element())),
        )?;
        if kind == MarkKind::Del {
            block.add_copy_transform(index, CopyTransform::RemoveLine)?;
        }
    }
    Ok(())
}

fn apply_mark(block: &mut Block, mark: &Mark) -> Result<(), EngineError> {
    let element = mark.kind.element();
    match &mark.selector {
        Selector::Lines { start, end } => {
            for number in *start..=*end {
                if number == 0 {
                    continue;
                }
                let index = number - 1;
                if index >= block.line_count() {
                    break;
                }
                block.add_annotation(
                    index,
                    Annotation::full_line(element, AnnotationRender::wrap(element)),
                )?;
            }
        }
        Selector::Substring(needle) => {
            if needle.is_empty() {
                return Ok(());
            }
            let found = collect_matches(block, |text| {
                text.match_indices(needle.as_str())
                    .map(|(at, matched)| (at, at + matched.len()))
                    .collect()
            });
            add_inline_marks(block, element, found)?;
        }
        Selector::Pattern(regex) => {
            let found = collect_matches(block, |text| {
                regex
                    .find_iter(text)
                    .filter(|found| !found.is_empty())
                    .map(|found| (found.start(), found.end()))
                    .collect()
            });
            add_inline_marks(block, element, found)?;
        }
    }
    Ok(())
}

fn collect_matches(
    block: &Block,
    matches_in: impl Fn(&str) -> Vec<(usize, usize)>,
) -> Vec<(usize, InlineRange)> {
    let mut found = Vec::new();
    for (index, line) in block.lines().iter().enumerate() {
        for (start, end) in matches_in(line.text()) {
            found.push((index, InlineRange::new(start, end)));
        }
    }
    found
}

fn add_inline_marks(
    block: &mut Block,
    element: &'static str,
    found: Vec<(usize, InlineRange)>,
) -> Result<(), EngineError> {
    for (index, range) in found {
        block.add_annotation(
            index,
            Annotation::inline(element, range, AnnotationRender::wrap(element)),
        )?;
    }
    Ok(())
}
