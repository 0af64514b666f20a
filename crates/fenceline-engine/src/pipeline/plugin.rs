//! The plugin surface of the pipeline.
//!
//! A plugin implements any subset of the phase hooks; every hook defaults
//! to a no-op so plugins only write the phases they care about. Mutating
//! hooks receive `&mut Block` and operate under that phase's
//! [`ProcessingState`](crate::block::state::ProcessingState) window; the
//! rendered-output hooks receive the block read-only plus the output under
//! construction. Hook errors are reported as `anyhow::Error` and abort the
//! whole render call, re-wrapped with the plugin's name and the phase.

use crate::block::Block;
use crate::block::line::Line;
use crate::render::RenderedBlock;
use crate::render::node::Node;

pub trait Plugin: Send + Sync {
    /// Short identifier used in error context and logs.
    fn name(&self) -> &str;

    /// Inspect or correct the block's language before it becomes fixed.
    /// Code is not editable here.
    fn preprocess_language(&self, _block: &mut Block) -> anyhow::Result<()> {
        Ok(())
    }

    /// React to block metadata: parse option strings, set props.
    fn preprocess_metadata(&self, _block: &mut Block) -> anyhow::Result<()> {
        Ok(())
    }

    /// Reshape the code before analysis: strip directive lines, normalize.
    fn preprocess_code(&self, _block: &mut Block) -> anyhow::Result<()> {
        Ok(())
    }

    /// Tokenize/highlight: add inline annotations over the preprocessed
    /// text. Code is still editable in this phase.
    fn perform_syntax_analysis(&self, _block: &mut Block) -> anyhow::Result<()> {
        Ok(())
    }

    /// Last chance to edit code, with analysis results available.
    fn postprocess_analyzed_code(&self, _block: &mut Block) -> anyhow::Result<()> {
        Ok(())
    }

    /// Add semantic annotations (marks, diff marks, inserted content).
    /// Code and language are locked here.
    fn annotate_code(&self, _block: &mut Block) -> anyhow::Result<()> {
        Ok(())
    }

    /// Adjust annotations added by earlier plugins before rendering seals
    /// the block.
    fn postprocess_annotations(&self, _block: &mut Block) -> anyhow::Result<()> {
        Ok(())
    }

    /// Rewrite one rendered line's node tree. Called once per source line,
    /// after that line has been partitioned and annotated.
    fn postprocess_rendered_line(
        &self,
        _block: &Block,
        _line: &Line,
        _node: &mut Node,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Rewrite the fully assembled rendered block (synthetic lines already
    /// spliced, copy text resolved).
    fn postprocess_rendered_block(
        &self,
        _block: &Block,
        _rendered: &mut RenderedBlock,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Observe or rewrite every rendered block of the group at once. Runs
    /// after the last block's pipeline completes.
    fn postprocess_rendered_block_group(
        &self,
        _blocks: &[Block],
        _rendered: &mut [RenderedBlock],
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
