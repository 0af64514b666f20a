use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Half-open byte range `[start, end)` into a line's text.
///
/// Offsets must fall on `char` boundaries; ranges are validated against the
/// owning line's text when an annotation or transform is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRange {
    pub start: usize,
    pub end: usize,
}

impl InlineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check the range against the text it will index into.
    pub(crate) fn validate(&self, text: &str) -> Result<(), EngineError> {
        if self.start > self.end {
            return Err(EngineError::RangeInverted {
                start: self.start,
                end: self.end,
            });
        }
        if self.end > text.len() {
            return Err(EngineError::RangeOutOfBounds {
                start: self.start,
                end: self.end,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(self.start) || !text.is_char_boundary(self.end) {
            return Err(EngineError::RangeNotCharAligned {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Resolve slice-style `start`/`end` arguments against a sequence length.
///
/// Follows array-slice conventions: negative values count from the end,
/// `None` leaves the bound open, and everything clamps into `0..=len`, so
/// callers never see an out-of-range pair. An inverted pair collapses to an
/// empty range at the resolved start. This is the single definition of those
/// conventions; line slicing and text editing both go through it.
pub fn resolve_absolute_range(start: Option<isize>, end: Option<isize>, len: usize) -> (usize, usize) {
    let resolve = |bound: Option<isize>, open_default: usize| -> usize {
        match bound {
            None => open_default,
            Some(v) if v < 0 => len.saturating_sub(v.unsigned_abs()),
            Some(v) => (v as usize).min(len),
        }
    };
    let abs_start = resolve(start, 0);
    let abs_end = resolve(end, len);
    (abs_start, abs_end.max(abs_start))
}
