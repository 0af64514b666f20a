use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::range::InlineRange;
use crate::render::node::{Element, Node};

/// Stable identity of an annotation on its line, handed out by
/// `Block::add_annotation` and consumed by `Block::delete_annotation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Relative application tier for annotation render operations.
///
/// Annotations are applied tier by tier; within a tier registration order is
/// kept. Syntax tokens typically go `Earliest` so semantic markers wrap
/// around them rather than the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RenderPhase {
    Earliest,
    Earlier,
    #[default]
    Normal,
    Later,
    Latest,
}

/// Render operation applied to the nodes covered by an annotation.
///
/// The contract is strict: the operation receives a sequence of nodes and
/// must return a sequence of the same length. The renderer checks this and
/// fails fast on a mismatch.
#[derive(Clone)]
pub enum AnnotationRender {
    /// Wrap each covered node in a named element.
    Wrap {
        element: String,
        attrs: Vec<(String, String)>,
    },
    /// Arbitrary same-length node transformation.
    With(Arc<dyn Fn(Vec<Node>) -> Vec<Node> + Send + Sync>),
}

impl AnnotationRender {
    pub fn wrap(element: impl Into<String>) -> Self {
        AnnotationRender::Wrap {
            element: element.into(),
            attrs: Vec::new(),
        }
    }

    pub fn wrap_with_class(element: impl Into<String>, class: impl Into<String>) -> Self {
        AnnotationRender::Wrap {
            element: element.into(),
            attrs: vec![("class".into(), class.into())],
        }
    }

    pub fn with(render: impl Fn(Vec<Node>) -> Vec<Node> + Send + Sync + 'static) -> Self {
        AnnotationRender::With(Arc::new(render))
    }

    pub(crate) fn apply(&self, nodes: Vec<Node>) -> Vec<Node> {
        match self {
            AnnotationRender::Wrap { element, attrs } => nodes
                .into_iter()
                .map(|node| {
                    Node::Element(Element {
                        name: element.clone(),
                        attrs: attrs.clone(),
                        children: vec![node],
                    })
                })
                .collect(),
            AnnotationRender::With(render) => render(nodes),
        }
    }
}

impl fmt::Debug for AnnotationRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationRender::Wrap { element, attrs } => f
                .debug_struct("Wrap")
                .field("element", element)
                .field("attrs", attrs)
                .finish(),
            AnnotationRender::With(_) => f.write_str("With(..)"),
        }
    }
}

/// A tagged decoration over a line.
///
/// `inline_range` of `None` means the annotation covers the whole line and
/// is applied to the assembled line node after all inline annotations. The
/// name never encodes how the annotation was produced; two annotations with
/// the same name from different plugins are indistinguishable by design.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: String,
    pub inline_range: Option<InlineRange>,
    pub render_phase: RenderPhase,
    pub render: AnnotationRender,
}

impl Annotation {
    /// Full-line annotation at the default phase.
    pub fn full_line(name: impl Into<String>, render: AnnotationRender) -> Self {
        Self {
            name: name.into(),
            inline_range: None,
            render_phase: RenderPhase::default(),
            render,
        }
    }

    /// Inline annotation at the default phase.
    pub fn inline(name: impl Into<String>, range: InlineRange, render: AnnotationRender) -> Self {
        Self {
            name: name.into(),
            inline_range: Some(range),
            render_phase: RenderPhase::default(),
            render,
        }
    }

    pub fn with_phase(mut self, phase: RenderPhase) -> Self {
        self.render_phase = phase;
        self
    }
}

/// An annotation as stored on a line, paired with its identity.
#[derive(Debug, Clone)]
pub(crate) struct AnnotationEntry {
    pub id: AnnotationId,
    pub inner: Annotation,
}
