use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::BlockId;
use crate::block::annotation::{Annotation, AnnotationEntry, AnnotationId};
use crate::block::transform::{CopyEntry, RenderEntry};

/// Stable identity of a line within (and across edits of) a block.
///
/// All anchor and backreference bookkeeping uses these handles, never
/// positions: a `LineId` keeps meaning the same line after other lines are
/// inserted or deleted around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(Uuid);

impl LineId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// One line of code plus everything attached to it: annotations in
/// registration order and the two transform queues.
///
/// The backreference to the owning block is set at construction and never
/// changes; lines cannot move between blocks.
#[derive(Debug, Clone)]
pub struct Line {
    pub(crate) id: LineId,
    pub(crate) text: String,
    pub(crate) owner: BlockId,
    pub(crate) annotations: Vec<AnnotationEntry>,
    pub(crate) copy_transforms: Vec<CopyEntry>,
    pub(crate) render_transforms: Vec<RenderEntry>,
}

impl Line {
    pub(crate) fn new(text: impl Into<String>, owner: BlockId) -> Self {
        Self {
            id: LineId::new(),
            text: text.into(),
            owner,
            annotations: Vec::new(),
            copy_transforms: Vec::new(),
            render_transforms: Vec::new(),
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The block this line belongs to.
    pub fn owner(&self) -> BlockId {
        self.owner
    }

    /// Annotations in registration order.
    pub fn annotations(&self) -> impl Iterator<Item = (AnnotationId, &Annotation)> {
        self.annotations.iter().map(|entry| (entry.id, &entry.inner))
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Number of queued copy transforms.
    pub fn copy_transform_count(&self) -> usize {
        self.copy_transforms.len()
    }

    /// Number of queued render transforms.
    pub fn render_transform_count(&self) -> usize {
        self.render_transforms.len()
    }
}
