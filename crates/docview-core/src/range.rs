#![forbid(unsafe_code)]

//! Inclusive line ranges.
//!
//! Line numbers follow the renderer's own convention (the web adapter is
//! 1-indexed). A [`LineRange`] always satisfies `first <= last`; inverted
//! pairs are rejected at construction and surface as `None`.

use serde::{Deserialize, Serialize};

/// Inclusive range of document lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    first: usize,
    last: usize,
}

impl LineRange {
    /// Build a range, returning `None` when `first > last`.
    #[must_use]
    pub const fn new(first: usize, last: usize) -> Option<Self> {
        if first > last {
            None
        } else {
            Some(Self { first, last })
        }
    }

    /// Single-line range.
    #[must_use]
    pub const fn single(line: usize) -> Self {
        Self {
            first: line,
            last: line,
        }
    }

    #[must_use]
    pub const fn first(self) -> usize {
        self.first
    }

    #[must_use]
    pub const fn last(self) -> usize {
        self.last
    }

    /// Number of lines covered (never zero).
    #[must_use]
    pub const fn len(self) -> usize {
        self.last - self.first + 1
    }

    #[must_use]
    pub const fn contains(self, line: usize) -> bool {
        line >= self.first && line <= self.last
    }

    /// Overlapping part of two ranges.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        Self::new(self.first.max(other.first), self.last.min(other.last))
    }

    /// Iterate every line number in the range.
    pub fn iter(self) -> impl DoubleEndedIterator<Item = usize> {
        self.first..=self.last
    }

    /// Translate a line offset relative to `first` into a document line.
    #[must_use]
    pub fn absolute(self, relative: usize) -> Option<usize> {
        let line = self.first.checked_add(relative)?;
        self.contains(line).then_some(line)
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}
