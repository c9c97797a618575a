//! Source spans and locations.
//!
//! A `Span` is a half-open byte range `[start, end)` inside one file. A
//! `Location` pairs a span with the file it belongs to. Declaration fragments
//! are ordered by `Location`, which orders by file name first and start
//! offset second.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A half-open byte range in a source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `pos`.
    #[inline]
    pub const fn at(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `offset` lies inside this span.
    #[inline]
    pub const fn contains_offset(self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Returns `true` if the two spans share at least one offset.
    ///
    /// Zero-width spans intersect a span that contains their position.
    pub const fn intersects(self, other: Span) -> bool {
        if self.is_empty() {
            return other.contains_offset(self.start) || other.start == self.start;
        }
        if other.is_empty() {
            return self.contains_offset(other.start) || self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }
}

/// A span inside a named file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: Arc<str>,
    #[serde(flatten)]
    pub span: Span,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, start: u32, end: u32) -> Self {
        Self {
            file: file.into(),
            span: Span::new(start, end),
        }
    }

    /// Location used for members the engine synthesizes; they point at the
    /// start of the first declaration of their owner.
    pub fn synthesized_at(owner: &Location) -> Self {
        Self {
            file: Arc::clone(&owner.file),
            span: Span::at(owner.span.start),
        }
    }

    #[inline]
    pub fn start(&self) -> u32 {
        self.span.start
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.span.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Returns `true` if both locations are in the same file and overlap.
    pub fn intersects(&self, other: &Location) -> bool {
        self.file == other.file && self.span.intersects(other.span)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            file: Arc::from(""),
            span: Span::default(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.span.start)
    }
}

#[cfg(test)]
#[path = "../tests/span_tests.rs"]
mod tests;
