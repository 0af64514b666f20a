//! The phase orchestrator.
//!
//! [`Engine::render_group`] drives each block through the fixed phase
//! order, invoking every plugin's hook for a phase before moving to the
//! next. Blocks are processed strictly sequentially; the group hook runs
//! once at the end over all blocks and their outputs. State windows are
//! assigned between phases so mutations arriving in the wrong phase fail
//! with the violated capability. A hook error aborts the remaining phases
//! for the whole render call.

pub mod plugin;

use std::fmt;
use std::slice;

use crate::block::Block;
use crate::block::state::ProcessingState;
use crate::error::EngineError;
use crate::render::{self, RenderedBlock};
use crate::render::inserts::apply_render_transforms;

pub use plugin::Plugin;

/// Pipeline phases, in execution order. Carried in hook errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreprocessLanguage,
    PreprocessMetadata,
    PreprocessCode,
    PerformSyntaxAnalysis,
    PostprocessAnalyzedCode,
    AnnotateCode,
    PostprocessAnnotations,
    PostprocessRenderedLine,
    PostprocessRenderedBlock,
    PostprocessRenderedBlockGroup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::PreprocessLanguage => "preprocess_language",
            Phase::PreprocessMetadata => "preprocess_metadata",
            Phase::PreprocessCode => "preprocess_code",
            Phase::PerformSyntaxAnalysis => "perform_syntax_analysis",
            Phase::PostprocessAnalyzedCode => "postprocess_analyzed_code",
            Phase::AnnotateCode => "annotate_code",
            Phase::PostprocessAnnotations => "postprocess_annotations",
            Phase::PostprocessRenderedLine => "postprocess_rendered_line",
            Phase::PostprocessRenderedBlock => "postprocess_rendered_block",
            Phase::PostprocessRenderedBlockGroup => "postprocess_rendered_block_group",
        };
        f.write_str(name)
    }
}

/// An ordered set of plugins driving blocks through the pipeline.
#[derive(Default)]
pub struct Engine {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugins(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    /// Append a plugin; hooks run in registration order within each phase.
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    /// Render a single block as a group of one, group hook included.
    pub fn render(&self, block: &mut Block) -> Result<RenderedBlock, EngineError> {
        let mut rendered = self.render_group(slice::from_mut(block))?;
        debug_assert_eq!(rendered.len(), 1);
        Ok(rendered.remove(0))
    }

    /// Render a group of blocks sequentially, then run the group hook over
    /// all of them. Each block renders at most once; a second call with the
    /// same block fails.
    pub fn render_group(&self, blocks: &mut [Block]) -> Result<Vec<RenderedBlock>, EngineError> {
        let mut rendered = Vec::with_capacity(blocks.len());
        for block in blocks.iter_mut() {
            rendered.push(self.render_block(block)?);
        }

        let blocks: &[Block] = blocks;
        for plugin in &self.plugins {
            plugin
                .postprocess_rendered_block_group(blocks, &mut rendered)
                .map_err(|cause| EngineError::PluginFailed {
                    plugin: plugin.name().to_string(),
                    phase: Phase::PostprocessRenderedBlockGroup,
                    cause,
                })?;
        }
        Ok(rendered)
    }

    fn render_block(&self, block: &mut Block) -> Result<RenderedBlock, EngineError> {
        block.begin_pass()?;

        block.set_state(ProcessingState::language_window());
        self.run_phase(block, Phase::PreprocessLanguage, |plugin, block| {
            plugin.preprocess_language(block)
        })?;

        // language is fixed from here on; code reopens for preprocessing
        // and stays editable through analysis
        block.set_state(ProcessingState::code_window());
        self.run_phase(block, Phase::PreprocessMetadata, |plugin, block| {
            plugin.preprocess_metadata(block)
        })?;
        self.run_phase(block, Phase::PreprocessCode, |plugin, block| {
            plugin.preprocess_code(block)
        })?;
        self.run_phase(block, Phase::PerformSyntaxAnalysis, |plugin, block| {
            plugin.perform_syntax_analysis(block)
        })?;
        self.run_phase(block, Phase::PostprocessAnalyzedCode, |plugin, block| {
            plugin.postprocess_analyzed_code(block)
        })?;

        block.set_state(ProcessingState::annotation_window());
        self.run_phase(block, Phase::AnnotateCode, |plugin, block| {
            plugin.annotate_code(block)
        })?;
        self.run_phase(block, Phase::PostprocessAnnotations, |plugin, block| {
            plugin.postprocess_annotations(block)
        })?;

        // rendering begins: only the additive transform queues stay open
        block.set_state(ProcessingState::sealed());

        let mut lines = render::render_lines(block)?;
        for (line, out) in block.lines().iter().zip(lines.iter_mut()) {
            for plugin in &self.plugins {
                plugin
                    .postprocess_rendered_line(block, line, &mut out.node)
                    .map_err(|cause| EngineError::PluginFailed {
                        plugin: plugin.name().to_string(),
                        phase: Phase::PostprocessRenderedLine,
                        cause,
                    })?;
            }
        }
        apply_render_transforms(block, &mut lines);

        let mut rendered = RenderedBlock {
            language: block.language().to_string(),
            meta: block.meta().to_string(),
            copy_text: block.copy_text(),
            lines,
        };
        for plugin in &self.plugins {
            plugin
                .postprocess_rendered_block(block, &mut rendered)
                .map_err(|cause| EngineError::PluginFailed {
                    plugin: plugin.name().to_string(),
                    phase: Phase::PostprocessRenderedBlock,
                    cause,
                })?;
        }
        Ok(rendered)
    }

    fn run_phase<F>(&self, block: &mut Block, phase: Phase, hook: F) -> Result<(), EngineError>
    where
        F: Fn(&dyn Plugin, &mut Block) -> anyhow::Result<()>,
    {
        for plugin in &self.plugins {
            hook(plugin.as_ref(), block).map_err(|cause| EngineError::PluginFailed {
                plugin: plugin.name().to_string(),
                phase,
                cause,
            })?;
        }
        Ok(())
    }
}
