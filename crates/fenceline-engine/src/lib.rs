pub mod block;
mod copy;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod render;

// Re-export key types for easier usage
pub use block::annotation::{Annotation, AnnotationId, AnnotationRender, RenderPhase};
pub use block::line::{Line, LineId};
pub use block::range::InlineRange;
pub use block::state::{EditCapability, PassId, ProcessingState};
pub use block::transform::{
    AnchorFallback, CopyTransform, InsertPosition, LineFactory, RenderTransform,
};
pub use block::{Block, BlockId, PropValue};
pub use error::EngineError;
pub use extract::extract_blocks;
pub use pipeline::{Engine, Phase, Plugin};
pub use render::node::{Element, Node};
pub use render::{RenderedBlock, RenderedLine};
