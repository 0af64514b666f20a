/*!
 * # Block Model
 *
 * The mutable document model the whole engine revolves around:
 *
 * - A [`Block`] owns an ordered sequence of [`Line`]s plus a language tag, a
 *   meta string and a props map. It is created once from raw text and then
 *   mutated only through the gated API below, driven by the pipeline's hook
 *   phases.
 * - Lines are identified by [`LineId`] handles, never by index. Indexes are
 *   accepted as call arguments for convenience but nothing stores them:
 *   annotations live on their line, transforms anchor to line identities,
 *   and everything survives insertion/deletion shifting positions around.
 * - Every mutation checks the block's current [`ProcessingState`] and fails
 *   with the violated capability when the relevant window has closed. The
 *   two transform queues are the deliberate exception: they are additive,
 *   never touch the canonical text, and stay open for the whole pass.
 *
 * Reading is never gated. `code()`, `get_lines()` and `copy_text()` are
 * projections over current state and can be called at any point.
 */

pub mod annotation;
pub mod line;
pub mod range;
pub(crate) mod retarget;
pub mod state;
pub mod transform;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::annotation::{Annotation, AnnotationEntry, AnnotationId};
use crate::block::line::{Line, LineId};
use crate::block::range::resolve_absolute_range;
use crate::block::retarget::retarget_line_transforms;
use crate::block::state::{EditCapability, PassId, ProcessingState};
use crate::block::transform::{CopyEntry, CopyTransform, RenderEntry, RenderTransform, TransformSeq};
use crate::error::EngineError;

/// Stable identity of a block, used as the backreference on its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A typed property value on a block's props map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

/// A code block under processing.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) lines: Vec<Line>,
    pub(crate) language: String,
    pub(crate) meta: String,
    pub(crate) props: BTreeMap<String, PropValue>,
    pub(crate) state: ProcessingState,
    pub(crate) pass: Option<PassId>,
    pub(crate) transform_seq: TransformSeq,
}

/// Apply a signed delta to an annotation bound. The case analysis in
/// `edit_line_text` guarantees the result is non-negative.
fn shift(value: usize, delta: isize) -> usize {
    debug_assert!(value as isize + delta >= 0);
    (value as isize + delta) as usize
}

impl Block {
    /// Create a block from raw text.
    ///
    /// Normalizes `\r\n`/`\r` line endings to `\n`, trims trailing
    /// whitespace from every line and drops leading/trailing fully-empty
    /// lines. The result starts fully editable; the pipeline narrows the
    /// state as phases progress.
    pub fn new(code: &str, language: &str, meta: &str) -> Self {
        let normalized = code.replace("\r\n", "\n").replace('\r', "\n");
        let mut texts: Vec<&str> = normalized.split('\n').map(str::trim_end).collect();
        while texts.first().is_some_and(|text| text.is_empty()) {
            texts.remove(0);
        }
        while texts.last().is_some_and(|text| text.is_empty()) {
            texts.pop();
        }

        let id = BlockId::new();
        let lines = texts.into_iter().map(|text| Line::new(text, id)).collect();
        Self {
            id,
            lines,
            language: language.to_string(),
            meta: meta.to_string(),
            props: BTreeMap::new(),
            state: ProcessingState::unlocked(),
            pass: None,
            transform_seq: 0,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn meta(&self) -> &str {
        &self.meta
    }

    pub fn props(&self) -> &BTreeMap<String, PropValue> {
        &self.props
    }

    pub fn prop(&self, key: &str) -> Option<&PropValue> {
        self.props.get(key)
    }

    /// Frozen snapshot of the current mutability contract.
    pub fn state(&self) -> ProcessingState {
        self.state
    }

    /// The render pass that owns this block, once rendering has started.
    pub fn pass(&self) -> Option<PassId> {
        self.pass
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn get_line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Slice-style line access: negative indices count from the end, `None`
    /// leaves the bound open, out-of-range values clamp. Never fails;
    /// nonsensical ranges come back empty.
    pub fn get_lines(&self, start: Option<isize>, end: Option<isize>) -> &[Line] {
        let (abs_start, abs_end) = resolve_absolute_range(start, end, self.lines.len());
        &self.lines[abs_start..abs_end]
    }

    /// The canonical text: all lines joined with `\n`.
    pub fn code(&self) -> String {
        let texts: Vec<&str> = self.lines.iter().map(|line| line.text.as_str()).collect();
        texts.join("\n")
    }

    /// The clipboard projection: current lines with all queued copy
    /// transforms resolved.
    pub fn copy_text(&self) -> String {
        crate::copy::resolve_copy_text(&self.lines)
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), EngineError> {
        self.state.require(EditCapability::Language)?;
        self.language = language.to_string();
        Ok(())
    }

    pub fn set_meta(&mut self, meta: &str) -> Result<(), EngineError> {
        self.state.require(EditCapability::Metadata)?;
        self.meta = meta.to_string();
        Ok(())
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Result<(), EngineError> {
        self.state.require(EditCapability::Metadata)?;
        self.props.insert(key.into(), value.into());
        Ok(())
    }

    /// Insert new lines before `index` (`index == line_count()` appends).
    /// Returns the identities of the inserted lines in order.
    pub fn insert_lines(&mut self, index: usize, texts: &[&str]) -> Result<Vec<LineId>, EngineError> {
        self.state.require(EditCapability::Code)?;
        if index > self.lines.len() {
            return Err(EngineError::LineIndexOutOfBounds {
                index,
                len: self.lines.len(),
            });
        }
        if texts.iter().any(|text| text.contains('\n')) {
            return Err(EngineError::EmbeddedNewline);
        }

        let mut ids = Vec::with_capacity(texts.len());
        for (offset, text) in texts.iter().enumerate() {
            let line = Line::new(*text, self.id);
            ids.push(line.id);
            self.lines.insert(index + offset, line);
        }
        Ok(ids)
    }

    /// Delete the lines at the given indices.
    ///
    /// Indices must be distinct and in bounds; the order they are listed in
    /// does not matter (removal is internally index-descending). Insert-style
    /// transforms anchored to deleted lines are re-homed per their fallback
    /// policy before each removal.
    pub fn delete_lines(&mut self, indices: &[usize]) -> Result<(), EngineError> {
        self.state.require(EditCapability::Code)?;

        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        for pair in sorted.windows(2) {
            if pair[0] == pair[1] {
                return Err(EngineError::DuplicateLineIndex { index: pair[0] });
            }
        }
        if let Some(&max) = sorted.first()
            && max >= self.lines.len()
        {
            return Err(EngineError::LineIndexOutOfBounds {
                index: max,
                len: self.lines.len(),
            });
        }

        for index in sorted {
            retarget_line_transforms(&mut self.lines, index);
            self.lines.remove(index);
        }
        Ok(())
    }

    /// Replace a column range of a line's text, adjusting the line's inline
    /// annotation ranges to track the edit.
    ///
    /// `start`/`end` follow the same slice conventions as [`get_lines`].
    /// Annotations are processed in reverse registration order so removals
    /// during the walk don't disturb it:
    ///
    /// - entirely before the edit: untouched
    /// - entirely after the edit: shifted by the length delta
    /// - edit fully inside the annotation: the annotation absorbs the delta
    /// - annotation fully inside the edit: the annotation is deleted
    /// - partial overlap: the annotation is cut back to the edit boundary
    ///
    /// Full-line annotations are never touched.
    ///
    /// [`get_lines`]: Block::get_lines
    pub fn edit_line_text(
        &mut self,
        index: usize,
        start: Option<isize>,
        end: Option<isize>,
        new_text: &str,
    ) -> Result<(), EngineError> {
        self.state.require(EditCapability::Code)?;
        if new_text.contains('\n') {
            return Err(EngineError::EmbeddedNewline);
        }
        let len = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(EngineError::LineIndexOutOfBounds { index, len })?;

        let (edit_start, edit_end) = resolve_absolute_range(start, end, line.text.len());
        if !line.text.is_char_boundary(edit_start) || !line.text.is_char_boundary(edit_end) {
            return Err(EngineError::RangeNotCharAligned {
                start: edit_start,
                end: edit_end,
            });
        }
        let delta = new_text.len() as isize - (edit_end - edit_start) as isize;

        for i in (0..line.annotations.len()).rev() {
            let Some(range) = &mut line.annotations[i].inner.inline_range else {
                continue;
            };
            if range.end < edit_start {
                // entirely before the edit
            } else if range.start > edit_end {
                range.start = shift(range.start, delta);
                range.end = shift(range.end, delta);
            } else if edit_start >= range.start && edit_end <= range.end {
                range.end = shift(range.end, delta);
            } else if edit_start <= range.start && edit_end >= range.end {
                line.annotations.remove(i);
            } else if edit_start > range.start {
                range.end = edit_start;
            } else {
                range.start = shift(edit_end, delta);
                range.end = shift(range.end, delta);
            }
        }

        let mut text = String::with_capacity(line.text.len() + new_text.len());
        text.push_str(&line.text[..edit_start]);
        text.push_str(new_text);
        text.push_str(&line.text[edit_end..]);
        line.text = text;
        Ok(())
    }

    /// Attach an annotation to the line at `index`. Inline ranges are
    /// validated against the line's current text.
    pub fn add_annotation(&mut self, index: usize, annotation: Annotation) -> Result<AnnotationId, EngineError> {
        self.state.require(EditCapability::Annotations)?;
        let len = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(EngineError::LineIndexOutOfBounds { index, len })?;
        if let Some(range) = &annotation.inline_range {
            range.validate(&line.text)?;
        }

        let id = AnnotationId::new();
        line.annotations.push(AnnotationEntry {
            id,
            inner: annotation,
        });
        Ok(id)
    }

    pub fn delete_annotation(&mut self, index: usize, id: AnnotationId) -> Result<(), EngineError> {
        self.state.require(EditCapability::Annotations)?;
        let len = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(EngineError::LineIndexOutOfBounds { index, len })?;
        let position = line
            .annotations
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(EngineError::AnnotationNotFound)?;
        line.annotations.remove(position);
        Ok(())
    }

    /// Queue a copy transform on the line at `index`. Not gated by the
    /// processing state: copy transforms never mutate the canonical text.
    pub fn add_copy_transform(&mut self, index: usize, transform: CopyTransform) -> Result<(), EngineError> {
        let len = self.lines.len();
        let line = self
            .lines
            .get(index)
            .ok_or(EngineError::LineIndexOutOfBounds { index, len })?;

        match &transform {
            CopyTransform::RemoveLine => {}
            CopyTransform::EditText {
                inline_range,
                new_text,
            } => {
                if new_text.iter().any(|text| text.contains('\n')) {
                    return Err(EngineError::EmbeddedNewline);
                }
                if let Some(range) = inline_range {
                    range.validate(&line.text)?;
                }
            }
            CopyTransform::InsertLines { lines, .. } => {
                if lines.iter().any(|text| text.contains('\n')) {
                    return Err(EngineError::EmbeddedNewline);
                }
            }
        }

        let seq = self.next_seq();
        self.lines[index].copy_transforms.push(CopyEntry { seq, transform });
        Ok(())
    }

    /// Queue a render transform on the line at `index`. Not gated by the
    /// processing state for the same reason as [`add_copy_transform`].
    ///
    /// [`add_copy_transform`]: Block::add_copy_transform
    pub fn add_render_transform(&mut self, index: usize, transform: RenderTransform) -> Result<(), EngineError> {
        let len = self.lines.len();
        if index >= len {
            return Err(EngineError::LineIndexOutOfBounds { index, len });
        }
        let seq = self.next_seq();
        self.lines[index].render_transforms.push(RenderEntry { seq, transform });
        Ok(())
    }

    pub(crate) fn begin_pass(&mut self) -> Result<PassId, EngineError> {
        if self.pass.is_some() {
            return Err(EngineError::PassAlreadyAssigned);
        }
        let pass = PassId::new();
        self.pass = Some(pass);
        Ok(pass)
    }

    pub(crate) fn set_state(&mut self, state: ProcessingState) {
        self.state = state;
    }

    fn next_seq(&mut self) -> TransformSeq {
        let seq = self.transform_seq;
        self.transform_seq += 1;
        seq
    }
}
