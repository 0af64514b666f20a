//! Re-homes insert-style transforms before their anchor line is removed.
//!
//! `delete_lines` walks its (descending-sorted) index batch one removal at a
//! time and calls into here first, so "nearest surviving neighbor" at each
//! step already reflects the removals made earlier in the batch. A transform
//! re-homed onto a line that is itself scheduled for deletion later in the
//! batch simply gets retargeted again when that line's turn comes.

use crate::block::line::Line;
use crate::block::transform::{
    AnchorFallback, CopyEntry, CopyTransform, InsertPosition, RenderEntry, RenderTransform,
};

/// Where a displaced transform lands relative to the doomed index, given the
/// current line count. `None` means the transform is discarded.
fn resolve_target(doomed: usize, len: usize, fallback: AnchorFallback) -> Option<(usize, InsertPosition)> {
    let prev = (doomed > 0).then(|| (doomed - 1, InsertPosition::After));
    let next = (doomed + 1 < len).then(|| (doomed + 1, InsertPosition::Before));
    match fallback {
        AnchorFallback::Drop => None,
        AnchorFallback::StickPrev => prev.or(next),
        AnchorFallback::StickNext => next.or(prev),
    }
}

/// Move the insert-style transforms off `lines[doomed]` onto surviving
/// neighbors per each transform's fallback policy. `RemoveLine`/`EditText`
/// copy transforms stay behind and die with the line; there is nothing left
/// for them to remove or edit.
pub(crate) fn retarget_line_transforms(lines: &mut [Line], doomed: usize) {
    let len = lines.len();

    let mut displaced_copy: Vec<CopyEntry> = Vec::new();
    let mut index = 0;
    while index < lines[doomed].copy_transforms.len() {
        if matches!(
            lines[doomed].copy_transforms[index].transform,
            CopyTransform::InsertLines { .. }
        ) {
            displaced_copy.push(lines[doomed].copy_transforms.remove(index));
        } else {
            index += 1;
        }
    }
    let displaced_render = std::mem::take(&mut lines[doomed].render_transforms);

    for entry in displaced_copy {
        let CopyTransform::InsertLines {
            lines: texts,
            on_delete_line,
            ..
        } = entry.transform
        else {
            continue;
        };
        if let Some((target, position)) = resolve_target(doomed, len, on_delete_line) {
            lines[target].copy_transforms.push(CopyEntry {
                seq: entry.seq,
                transform: CopyTransform::InsertLines {
                    lines: texts,
                    position,
                    on_delete_line,
                },
            });
        }
    }

    for entry in displaced_render {
        let RenderTransform {
            on_delete_line,
            render,
            ..
        } = entry.transform;
        if let Some((target, position)) = resolve_target(doomed, len, on_delete_line) {
            lines[target].render_transforms.push(RenderEntry {
                seq: entry.seq,
                transform: RenderTransform {
                    position,
                    on_delete_line,
                    render,
                },
            });
        }
    }
}
