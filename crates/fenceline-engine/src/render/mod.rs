//! The rendered projection of a block.
//!
//! Rendering never mutates the block: each source line is partitioned and
//! annotated into a [`Node`] tree ([`partition`]), then queued render
//! transforms splice synthetic render-only lines into the list
//! ([`inserts`]). A [`RenderedLine`] remembers which source line produced it
//! via [`LineId`], or `None` for synthetic lines, so later passes and
//! front-ends can correlate rendered output with canonical text.

pub(crate) mod inserts;
pub mod node;
pub(crate) mod partition;

use serde::Serialize;

use crate::block::Block;
use crate::block::line::LineId;
use crate::error::EngineError;
use crate::render::node::Node;

/// One line of rendered output. `source` is the identity of the canonical
/// line it was rendered from; synthetic lines spliced in by render
/// transforms carry `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedLine {
    pub source: Option<LineId>,
    pub node: Node,
}

/// The complete render of one block: its language and metadata at render
/// time, the rendered line list, and the resolved clipboard text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    pub language: String,
    pub meta: String,
    pub lines: Vec<RenderedLine>,
    pub copy_text: String,
}

/// Render every line of `block` into its node tree, one [`RenderedLine`]
/// per source line in order. Render transforms are not applied here; see
/// [`inserts::apply_render_transforms`].
pub fn render_lines(block: &Block) -> Result<Vec<RenderedLine>, EngineError> {
    block
        .lines()
        .iter()
        .map(|line| {
            Ok(RenderedLine {
                source: Some(line.id()),
                node: partition::render_line(line)?,
            })
        })
        .collect()
}
