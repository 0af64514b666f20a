use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Which mutable aspect of a block an API call touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditCapability {
    Code,
    Language,
    Metadata,
    Annotations,
}

impl fmt::Display for EditCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditCapability::Code => "code",
            EditCapability::Language => "language",
            EditCapability::Metadata => "metadata",
            EditCapability::Annotations => "annotations",
        };
        f.write_str(name)
    }
}

/// Identity of one render pass over a block.
///
/// A block accepts exactly one pass; rendering it a second time fails with
/// [`EngineError::PassAlreadyAssigned`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(Uuid);

impl PassId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Mutability contract for one window of the render pipeline.
///
/// The orchestrator replaces a block's state wholesale at each phase
/// transition; mutation methods consult the current value and refuse calls
/// whose capability is locked. Once a capability's window has passed it
/// never reopens within the pass (code is locked during the language window
/// and opens with the code window, then closes for good). The copy/render
/// transform queues are deliberately not represented here: they are additive
/// and never mutate the canonical text, so they stay open for the whole
/// pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub can_edit_code: bool,
    pub can_edit_language: bool,
    pub can_edit_metadata: bool,
    pub can_edit_annotations: bool,
}

impl ProcessingState {
    /// State of a freshly constructed block, before any render pass.
    pub fn unlocked() -> Self {
        Self {
            can_edit_code: true,
            can_edit_language: true,
            can_edit_metadata: true,
            can_edit_annotations: true,
        }
    }

    /// Fully frozen; the block is a read-only projection source.
    pub fn sealed() -> Self {
        Self {
            can_edit_code: false,
            can_edit_language: false,
            can_edit_metadata: false,
            can_edit_annotations: false,
        }
    }

    /// Language hooks may retag the block but not touch its text.
    pub(crate) fn language_window() -> Self {
        Self {
            can_edit_code: false,
            can_edit_language: true,
            can_edit_metadata: true,
            can_edit_annotations: true,
        }
    }

    /// Metadata/code preprocessing and syntax analysis: text is editable,
    /// the language is fixed.
    pub(crate) fn code_window() -> Self {
        Self {
            can_edit_code: true,
            can_edit_language: false,
            can_edit_metadata: true,
            can_edit_annotations: true,
        }
    }

    /// Annotation phases: text and language are fixed.
    pub(crate) fn annotation_window() -> Self {
        Self {
            can_edit_code: false,
            can_edit_language: false,
            can_edit_metadata: true,
            can_edit_annotations: true,
        }
    }

    pub fn allows(&self, capability: EditCapability) -> bool {
        match capability {
            EditCapability::Code => self.can_edit_code,
            EditCapability::Language => self.can_edit_language,
            EditCapability::Metadata => self.can_edit_metadata,
            EditCapability::Annotations => self.can_edit_annotations,
        }
    }

    pub(crate) fn require(&self, capability: EditCapability) -> Result<(), EngineError> {
        if self.allows(capability) {
            Ok(())
        } else {
            Err(EngineError::EditLocked { capability })
        }
    }
}
