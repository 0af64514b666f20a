//! Splicing of queued render transforms into a rendered line list.
//!
//! Transforms anchor to source lines by identity, so the rendered list can
//! be reordered or partially built without the anchors drifting. Synthetic
//! lines carry no source id and can never anchor further transforms.

use crate::block::Block;
use crate::block::line::LineId;
use crate::block::transform::{InsertPosition, LineFactory, RenderTransform, TransformSeq};
use crate::render::RenderedLine;

/// Splice every queued render transform into `rendered`, in registration
/// order across the whole block. Each transform re-resolves its anchor's
/// current position by line identity and splices directly before/after it;
/// transforms whose anchor is absent from `rendered` are skipped. Existing
/// rendered nodes are never touched.
pub(crate) fn apply_render_transforms(block: &Block, rendered: &mut Vec<RenderedLine>) {
    let mut pending: Vec<(TransformSeq, LineId, &RenderTransform)> = Vec::new();
    for line in block.lines() {
        for entry in &line.render_transforms {
            pending.push((entry.seq, line.id(), &entry.transform));
        }
    }
    // retargeting re-homes entries out of push order
    pending.sort_by_key(|(seq, _, _)| *seq);

    let factory = LineFactory;
    for (_, anchor, transform) in pending {
        let Some(position) = rendered.iter().position(|line| line.source == Some(anchor)) else {
            continue;
        };
        let at = match transform.position {
            InsertPosition::Before => position,
            InsertPosition::After => position + 1,
        };
        let nodes = (transform.render)(&factory);
        rendered.splice(at..at, nodes.into_iter().map(|node| RenderedLine { source: None, node }));
    }
}
