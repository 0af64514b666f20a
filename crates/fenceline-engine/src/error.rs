use crate::block::state::EditCapability;
use crate::pipeline::Phase;

/// Errors surfaced by the engine.
///
/// Everything here is a programmer error in the sense of the processing
/// contract: surfaced immediately at the call site, never retried, never
/// recovered internally. `PluginFailed` additionally wraps arbitrary failures
/// escaping a plugin hook so callers can tell which plugin and phase aborted
/// the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Index-based access past the end of the block's line list.
    #[error("line index {index} out of bounds for block with {len} lines")]
    LineIndexOutOfBounds { index: usize, len: usize },

    /// `delete_lines` was handed the same index twice.
    #[error("duplicate line index {index} in deletion set")]
    DuplicateLineIndex { index: usize },

    /// A mutation arrived while its capability flag was already locked.
    #[error("cannot edit {capability} in the current processing state")]
    EditLocked { capability: EditCapability },

    /// The block already belongs to a render pass; blocks render once.
    #[error("block is already owned by a render pass")]
    PassAlreadyAssigned,

    /// `delete_annotation` could not find the given annotation on its line.
    #[error("annotation not found on line")]
    AnnotationNotFound,

    /// An inline range with `start > end`.
    #[error("inline range start {start} is greater than end {end}")]
    RangeInverted { start: usize, end: usize },

    /// An inline range extending past the end of its line's text.
    #[error("inline range {start}..{end} exceeds line length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    /// A byte offset that splits a multi-byte character.
    #[error("column range {start}..{end} does not fall on character boundaries")]
    RangeNotCharAligned { start: usize, end: usize },

    /// Single-line text (edits, inserted line texts) containing `\n`.
    #[error("text for a single line must not contain line breaks")]
    EmbeddedNewline,

    /// A render operation broke the same-length contract.
    #[error("render operation for annotation {name:?} returned {got} nodes for {expected} inputs")]
    RenderCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// A plugin hook failed; the pipeline for this render call is aborted.
    #[error("plugin `{plugin}` failed during {phase}: {cause}")]
    PluginFailed {
        plugin: String,
        phase: Phase,
        cause: anyhow::Error,
    },
}
