#![forbid(unsafe_code)]

//! Two-slot "jump back" bookmark.
//!
//! `proximal` follows the viewport; `distal` remembers where the reader was
//! before the last big jump. Small scrolls drift the proximal slot, a move
//! larger than the threshold pushes the old position into the distal slot,
//! and [`ToggleBookmark::toggle`] swaps the two.
//!
//! ```
//! use docview_core::bookmark::ToggleBookmark;
//!
//! let mut b = ToggleBookmark::new(1, 20);
//! b.observe(100);          // jump
//! b.observe(110);          // drift
//! assert_eq!(b.toggle(), 1);
//! assert_eq!(b.toggle(), 110);
//! ```

use serde::Serialize;
use tracing::debug;

/// Snapshot of the bookmark slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkState {
    pub proximal: usize,
    pub distal: usize,
    pub big_move_threshold: usize,
}

/// Hysteresis between drift and jump.
#[derive(Debug, Clone)]
pub struct ToggleBookmark {
    state: BookmarkState,
    min_big_move: usize,
    padding: usize,
}

impl ToggleBookmark {
    /// Both slots start at `start_line`; the threshold starts at
    /// `min_big_move` until the first [`resize`](Self::resize).
    #[must_use]
    pub const fn new(start_line: usize, min_big_move: usize) -> Self {
        Self::with_padding(start_line, min_big_move, 10)
    }

    #[must_use]
    pub const fn with_padding(start_line: usize, min_big_move: usize, padding: usize) -> Self {
        Self {
            state: BookmarkState {
                proximal: start_line,
                distal: start_line,
                big_move_threshold: min_big_move,
            },
            min_big_move,
            padding,
        }
    }

    #[must_use]
    pub const fn state(&self) -> BookmarkState {
        self.state
    }

    #[must_use]
    pub const fn proximal(&self) -> usize {
        self.state.proximal
    }

    #[must_use]
    pub const fn distal(&self) -> usize {
        self.state.distal
    }

    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.state.big_move_threshold
    }

    /// Track the first visible line after a scroll settles.
    pub fn observe(&mut self, first_visible: usize) {
        let delta = self.state.proximal.abs_diff(first_visible);
        if delta > self.state.big_move_threshold {
            debug!(
                target: "docview_core::bookmark",
                from = self.state.proximal,
                to = first_visible,
                delta,
                "bookmark jump"
            );
            self.state.distal = self.state.proximal;
        }
        self.state.proximal = first_visible;
    }

    /// Swap the slots and return the line to scroll to.
    pub fn toggle(&mut self) -> usize {
        std::mem::swap(&mut self.state.proximal, &mut self.state.distal);
        self.state.proximal
    }

    /// Rescale the threshold to the number of visible lines.
    pub fn resize(&mut self, visible_line_count: usize) {
        self.state.big_move_threshold = self
            .min_big_move
            .max(visible_line_count.saturating_add(self.padding));
    }

    /// Point both slots at `start_line` (new document). The threshold is kept.
    pub fn reset(&mut self, start_line: usize) {
        self.state.proximal = start_line;
        self.state.distal = start_line;
    }
}
