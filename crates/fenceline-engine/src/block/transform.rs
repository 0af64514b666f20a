use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::block::range::InlineRange;
use crate::render::node::Node;

/// Side of the anchor line where inserted content lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertPosition {
    Before,
    After,
}

/// What happens to an insert-style transform when its anchor line is
/// deleted: re-home onto the nearest surviving line before/after it, or
/// disappear with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorFallback {
    StickPrev,
    StickNext,
    Drop,
}

/// Queued, non-destructive operation shaping the copied plaintext.
///
/// Copy transforms never touch the canonical line text; they are resolved
/// into a separate projection when `copy_text` is requested. `RemoveLine`
/// and `EditText` are bound to their own line and vanish with it;
/// `InsertLines` is an anchor and survives deletion per its fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyTransform {
    /// Drop the anchor line from the copied text.
    RemoveLine,
    /// Replace a column range (the whole line when absent) of the anchor
    /// line. Multiple `new_text` elements split the result into that many
    /// copied lines.
    EditText {
        inline_range: Option<InlineRange>,
        new_text: Vec<String>,
    },
    /// Splice literal lines next to the anchor line.
    InsertLines {
        lines: Vec<String>,
        position: InsertPosition,
        on_delete_line: AnchorFallback,
    },
}

/// Factory handed to render-transform callbacks so inserted lines share the
/// node shape of real rendered lines.
pub struct LineFactory;

impl LineFactory {
    /// A rendered line with the given children.
    pub fn line(&self, children: Vec<Node>) -> Node {
        Node::Line(children)
    }

    /// A rendered line holding a single empty text node, the same shape an
    /// empty source line renders to.
    pub fn blank_line(&self) -> Node {
        Node::Line(vec![Node::Text(String::new())])
    }
}

/// Queued insertion of synthetic rendered lines next to the anchor line.
///
/// Strictly additive: the produced nodes are spliced into the rendered line
/// list and never replace or edit existing rendered lines. There is no
/// copied-text counterpart unless the caller also queues an `InsertLines`
/// copy transform.
#[derive(Clone)]
pub struct RenderTransform {
    pub position: InsertPosition,
    pub on_delete_line: AnchorFallback,
    pub render: Arc<dyn Fn(&LineFactory) -> Vec<Node> + Send + Sync>,
}

impl RenderTransform {
    pub fn insert(
        position: InsertPosition,
        on_delete_line: AnchorFallback,
        render: impl Fn(&LineFactory) -> Vec<Node> + Send + Sync + 'static,
    ) -> Self {
        Self {
            position,
            on_delete_line,
            render: Arc::new(render),
        }
    }
}

impl fmt::Debug for RenderTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTransform")
            .field("position", &self.position)
            .field("on_delete_line", &self.on_delete_line)
            .field("render", &"..")
            .finish()
    }
}

/// Registration ticket. Transforms keep their ticket when retargeting moves
/// them between lines, so "registration order" stays well-defined across the
/// whole block.
pub(crate) type TransformSeq = u64;

#[derive(Debug, Clone)]
pub(crate) struct CopyEntry {
    pub seq: TransformSeq,
    pub transform: CopyTransform,
}

#[derive(Debug, Clone)]
pub(crate) struct RenderEntry {
    pub seq: TransformSeq,
    pub transform: RenderTransform,
}
