#![forbid(unsafe_code)]

//! Table-of-contents index and highlight synchronization.
//!
//! The host hands over a structured list of headings (panel order). The
//! index keeps them sorted by target line so both lookups are a binary
//! search:
//!
//! - **click**: which heading governs the clicked line (nearest at or above);
//! - **scroll settle**: which heading is at the top of the viewport (nearest
//!   at or below the first visible line, bounded by the last visible line).
//!
//! ```
//! use docview_core::toc::{TocEntryInput, TocIndex, TocSlot};
//!
//! let index = TocIndex::build(vec![
//!     TocEntryInput::new("Intro", 10),
//!     TocEntryInput::new("Usage", 50),
//!     TocEntryInput::new("FAQ", 120),
//! ]);
//! assert_eq!(index.nearest_at_or_above(75), TocSlot::Entry(1));
//! assert_eq!(index.nearest_at_or_above(5), TocSlot::Entry(0));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::renderer::TocPanel;

/// One heading as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntryInput {
    pub anchor_text: String,
    #[serde(alias = "targetLineNumber")]
    pub target_line: usize,
}

impl TocEntryInput {
    #[must_use]
    pub fn new(anchor_text: impl Into<String>, target_line: usize) -> Self {
        Self {
            anchor_text: anchor_text.into(),
            target_line,
        }
    }
}

/// A heading in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub anchor_text: String,
    pub target_line: usize,
    /// Position in the host panel.
    pub panel_index: usize,
}

/// Highlight target in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TocSlot {
    /// Sentinel "top of document" entry, used when the index is empty.
    Top,
    /// Entry at this panel index.
    Entry(usize),
}

/// Headings sorted by target line.
#[derive(Debug, Clone, Default)]
pub struct TocIndex {
    entries: Vec<TocEntry>,
}

impl TocIndex {
    /// Build from panel-ordered input. Sorting is stable, so headings that
    /// share a target line keep their panel order.
    #[must_use]
    pub fn build(inputs: Vec<TocEntryInput>) -> Self {
        let mut entries: Vec<TocEntry> = inputs
            .into_iter()
            .enumerate()
            .map(|(panel_index, input)| TocEntry {
                anchor_text: input.anchor_text,
                target_line: input.target_line,
                panel_index,
            })
            .collect();
        entries.sort_by_key(|e| e.target_line);
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in target-line order.
    #[must_use]
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Entry for a panel index, if any.
    #[must_use]
    pub fn entry_for_slot(&self, slot: TocSlot) -> Option<&TocEntry> {
        match slot {
            TocSlot::Top => None,
            TocSlot::Entry(panel_index) => {
                self.entries.iter().find(|e| e.panel_index == panel_index)
            }
        }
    }

    fn slot_of(&self, pos: usize) -> TocSlot {
        self.entries
            .get(pos)
            .map_or(TocSlot::Top, |e| TocSlot::Entry(e.panel_index))
    }

    /// Heading with the largest target line `<= line`; the first heading when
    /// none precedes `line`; [`TocSlot::Top`] when empty.
    #[must_use]
    pub fn nearest_at_or_above(&self, line: usize) -> TocSlot {
        let after = self.entries.partition_point(|e| e.target_line <= line);
        self.slot_of(after.saturating_sub(1))
    }

    /// Heading with the smallest target line in `[line, limit]`; otherwise
    /// the heading with the largest target line `<= limit`; otherwise the
    /// first heading; [`TocSlot::Top`] when empty.
    #[must_use]
    pub fn nearest_at_or_below_within(&self, line: usize, limit: usize) -> TocSlot {
        let first_at_or_below = self.entries.partition_point(|e| e.target_line < line);
        if let Some(entry) = self.entries.get(first_at_or_below)
            && entry.target_line <= limit
        {
            return TocSlot::Entry(entry.panel_index);
        }
        let after_limit = self.entries.partition_point(|e| e.target_line <= limit);
        self.slot_of(after_limit.saturating_sub(1))
    }
}

/// Heading names that text mentions may link to.
///
/// An anchor `name` registers the bare form; an anchor such as `name()` or
/// `name(args)` registers the call form, matched only when the mention is
/// immediately followed by `(`. The first heading wins when names repeat.
#[derive(Debug, Clone, Default)]
pub struct HeadingNames {
    bare: HashMap<String, usize>,
    call: HashMap<String, usize>,
}

impl HeadingNames {
    /// Index every entry whose name passes `is_token`.
    #[must_use]
    pub fn build(index: &TocIndex, is_token: impl Fn(&str) -> bool) -> Self {
        let mut names = Self::default();
        for entry in index.entries() {
            let text = entry.anchor_text.trim();
            let (name, table) = match text.split_once('(') {
                Some((name, _)) => (name.trim_end(), &mut names.call),
                None => (text, &mut names.bare),
            };
            if name.is_empty() || !is_token(name) {
                continue;
            }
            table.entry(name.to_owned()).or_insert(entry.target_line);
        }
        debug!(
            target: "docview_core::toc",
            bare = names.bare.len(),
            call = names.call.len(),
            "heading names indexed"
        );
        names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bare.is_empty() && self.call.is_empty()
    }

    /// Target line for a mention of `token`.
    ///
    /// `followed_by_paren` selects the call form when one exists.
    #[must_use]
    pub fn resolve(&self, token: &str, followed_by_paren: bool) -> Option<usize> {
        if followed_by_paren && let Some(&line) = self.call.get(token) {
            return Some(line);
        }
        self.bare.get(token).copied()
    }
}

/// Keeps exactly one panel slot highlighted.
#[derive(Debug, Clone, Default)]
pub struct TocSynchronizer {
    index: TocIndex,
    current: Option<TocSlot>,
}

impl TocSynchronizer {
    #[must_use]
    pub fn new(index: TocIndex) -> Self {
        Self {
            index,
            current: None,
        }
    }

    #[must_use]
    pub fn index(&self) -> &TocIndex {
        &self.index
    }

    #[must_use]
    pub fn current(&self) -> Option<TocSlot> {
        self.current
    }

    /// Highlight `slot` and clear every other slot.
    ///
    /// Repeating the current slot leaves the panel untouched.
    pub fn update_highlight(&mut self, slot: TocSlot, panel: &mut dyn TocPanel) {
        if self.current == Some(slot) {
            return;
        }
        panel.set_highlighted(TocSlot::Top, slot == TocSlot::Top);
        for entry in self.index.entries() {
            let this = TocSlot::Entry(entry.panel_index);
            panel.set_highlighted(this, this == slot);
        }
        debug!(target: "docview_core::toc", ?slot, "toc highlight moved");
        self.current = Some(slot);
    }

    /// Highlight the heading governing a clicked line.
    pub fn on_text_click(&mut self, line: usize, panel: &mut dyn TocPanel) -> TocSlot {
        let slot = self.index.nearest_at_or_above(line);
        self.update_highlight(slot, panel);
        slot
    }

    /// Highlight the heading at the top of the settled viewport.
    pub fn on_scroll_settled(
        &mut self,
        first_visible: usize,
        last_visible: usize,
        panel: &mut dyn TocPanel,
    ) -> TocSlot {
        let slot = self
            .index
            .nearest_at_or_below_within(first_visible, last_visible);
        self.update_highlight(slot, panel);
        slot
    }

    /// Forget which slot is lit (the panel was rebuilt).
    pub fn reset_highlight(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTocPanel;

    fn sample() -> TocIndex {
        TocIndex::build(vec![
            TocEntryInput::new("Intro", 10),
            TocEntryInput::new("Usage", 50),
            TocEntryInput::new("FAQ", 120),
        ])
    }

    #[test]
    fn nearest_at_or_above() {
        let index = sample();
        assert_eq!(index.nearest_at_or_above(75), TocSlot::Entry(1));
        assert_eq!(index.nearest_at_or_above(5), TocSlot::Entry(0));
        assert_eq!(index.nearest_at_or_above(50), TocSlot::Entry(1));
        assert_eq!(index.nearest_at_or_above(10_000), TocSlot::Entry(2));
        assert_eq!(TocIndex::default().nearest_at_or_above(3), TocSlot::Top);
    }

    #[test]
    fn nearest_at_or_below_within() {
        let index = sample();
        assert_eq!(index.nearest_at_or_below_within(40, 80), TocSlot::Entry(1));
        assert_eq!(index.nearest_at_or_below_within(60, 100), TocSlot::Entry(1));
        assert_eq!(index.nearest_at_or_below_within(1, 5), TocSlot::Entry(0));
        assert_eq!(index.nearest_at_or_below_within(115, 140), TocSlot::Entry(2));
        assert_eq!(TocIndex::default().nearest_at_or_below_within(1, 9), TocSlot::Top);
    }

    #[test]
    fn build_sorts_but_keeps_panel_index() {
        let index = TocIndex::build(vec![
            TocEntryInput::new("B", 40),
            TocEntryInput::new("A", 5),
        ]);
        let lines: Vec<_> = index.entries().iter().map(|e| e.target_line).collect();
        assert_eq!(lines, vec![5, 40]);
        assert_eq!(index.nearest_at_or_above(6), TocSlot::Entry(1));
        assert_eq!(
            index.entry_for_slot(TocSlot::Entry(0)).map(|e| e.target_line),
            Some(40)
        );
    }

    #[test]
    fn heading_names_split_call_form() {
        let index = TocIndex::build(vec![
            TocEntryInput::new("parse", 10),
            TocEntryInput::new("parse(input)", 20),
            TocEntryInput::new("render()", 30),
            TocEntryInput::new("Getting started", 40),
            TocEntryInput::new("parse", 99),
        ]);
        let names = HeadingNames::build(&index, |s| !s.contains(' '));
        assert_eq!(names.resolve("parse", false), Some(10));
        assert_eq!(names.resolve("parse", true), Some(20));
        assert_eq!(names.resolve("render", false), None);
        assert_eq!(names.resolve("render", true), Some(30));
        assert_eq!(names.resolve("Getting", false), None);
    }

    #[test]
    fn highlight_is_exclusive_and_idempotent() {
        let mut sync = TocSynchronizer::new(sample());
        let mut panel = MemoryTocPanel::default();

        assert_eq!(sync.on_text_click(75, &mut panel), TocSlot::Entry(1));
        assert_eq!(panel.highlighted(), vec![TocSlot::Entry(1)]);
        let calls = panel.calls();

        sync.on_text_click(60, &mut panel);
        assert_eq!(panel.calls(), calls, "same slot must not touch the panel");

        sync.on_scroll_settled(115, 140, &mut panel);
        assert_eq!(panel.highlighted(), vec![TocSlot::Entry(2)]);
    }
}
