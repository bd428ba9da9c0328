#![forbid(unsafe_code)]

//! In-memory host fakes.
//!
//! Used by this crate's tests and by downstream crates that want to drive a
//! [`ViewerSession`](crate::session::ViewerSession) without a browser.
//! Enabled by the `test-helpers` feature.

use crate::range::LineRange;
use crate::renderer::{Marker, Renderer, TocPanel};
use crate::toc::TocSlot;

/// Renderer over a vector of lines, 1-indexed.
#[derive(Debug, Clone, Default)]
pub struct MemoryRenderer {
    lines: Vec<String>,
    top: usize,
    bottom: usize,
    markers: Vec<Marker>,
    scrolls: Vec<usize>,
    clears: usize,
    line_height: f64,
}

impl MemoryRenderer {
    /// Document of `count` lines reading `line 1`, `line 2`, ...
    #[must_use]
    pub fn with_lines(count: usize) -> Self {
        Self::from_lines((1..=count).map(|i| format!("line {i}")).collect())
    }

    /// Document split on newlines.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        Self::from_lines(text.lines().map(str::to_owned).collect())
    }

    fn from_lines(lines: Vec<String>) -> Self {
        let bottom = lines.len().min(1);
        Self {
            lines,
            top: 1,
            bottom,
            line_height: 16.0,
            ..Self::default()
        }
    }

    /// Set the raw visible window. Values are not validated.
    pub fn set_viewport(&mut self, top: usize, bottom: usize) {
        self.top = top;
        self.bottom = bottom;
    }

    /// Replace one line's text (1-indexed). Out-of-range lines are ignored.
    pub fn set_line(&mut self, line: usize, text: &str) {
        if let Some(slot) = line.checked_sub(1).and_then(|i| self.lines.get_mut(i)) {
            *slot = text.to_owned();
        }
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Markers on one line, in placement order.
    #[must_use]
    pub fn markers_on(&self, line: usize) -> Vec<&Marker> {
        self.markers.iter().filter(|m| m.line == line).collect()
    }

    /// Every line passed to `scroll_to_line`, in order.
    #[must_use]
    pub fn scroll_history(&self) -> &[usize] {
        &self.scrolls
    }

    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    #[must_use]
    pub fn viewport(&self) -> (usize, usize) {
        (self.top, self.bottom)
    }
}

impl Renderer for MemoryRenderer {
    fn visible_top_line(&self) -> usize {
        self.top
    }

    fn visible_bottom_line(&self) -> usize {
        self.bottom
    }

    fn last_line(&self) -> usize {
        self.lines.len()
    }

    fn text_for_line_range(&self, range: LineRange) -> String {
        let start = range.first().saturating_sub(1).min(self.lines.len());
        let end = range.last().min(self.lines.len());
        self.lines[start..end.max(start)].join("\n")
    }

    fn place_marker(&mut self, marker: &Marker) {
        if !self.markers.contains(marker) {
            self.markers.push(marker.clone());
        }
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
        self.clears += 1;
    }

    fn scroll_to_line(&mut self, line: usize) {
        let height = self.bottom.saturating_sub(self.top);
        self.top = line;
        self.bottom = line + height;
        self.scrolls.push(line);
    }

    fn line_height(&self) -> f64 {
        self.line_height
    }
}

/// Records highlight state per slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTocPanel {
    slots: Vec<(TocSlot, bool)>,
    calls: usize,
}

impl MemoryTocPanel {
    /// Highlighted slots, in first-touched order.
    #[must_use]
    pub fn highlighted(&self) -> Vec<TocSlot> {
        self.slots
            .iter()
            .filter(|(_, on)| *on)
            .map(|(slot, _)| *slot)
            .collect()
    }

    /// Number of `set_highlighted` calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl TocPanel for MemoryTocPanel {
    fn set_highlighted(&mut self, slot: TocSlot, on: bool) {
        self.calls += 1;
        match self.slots.iter_mut().find(|(s, _)| *s == slot) {
            Some(entry) => entry.1 = on,
            None => self.slots.push((slot, on)),
        }
    }
}
