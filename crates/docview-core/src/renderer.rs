#![forbid(unsafe_code)]

//! Host boundary: the text renderer and the TOC panel.
//!
//! The engine never touches a concrete widget. Hosts adapt whatever rich-text
//! or grid renderer they embed to [`Renderer`], and the table-of-contents
//! panel to [`TocPanel`]. The web crate ships adapters for a JS renderer
//! object and a list of DOM elements; tests use in-memory fakes.

use crate::annotation::Annotation;
use crate::range::LineRange;
use crate::toc::TocSlot;

/// A decoration to apply to one line of the renderer.
///
/// `columns` is a half-open character range within `line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub line: usize,
    pub columns: std::ops::Range<usize>,
    pub style_class: &'static str,
    /// Markup that replaces the covered text (external links).
    pub replacement: Option<String>,
    /// Document line an internal-header mention jumps to.
    pub target_line: Option<usize>,
}

impl From<&Annotation> for Marker {
    fn from(annotation: &Annotation) -> Self {
        Self {
            line: annotation.line,
            columns: annotation.column_start..annotation.column_end,
            style_class: annotation.category.style_class(),
            replacement: annotation.payload.markup().map(str::to_owned),
            target_line: annotation.payload.target_line(),
        }
    }
}

/// Capability set the engine consumes from the text renderer.
///
/// Line numbers are in the renderer's convention; `first_line` says where
/// the document starts (1 unless overridden).
pub trait Renderer {
    /// First line whose top edge is inside the renderer's bounding box.
    fn visible_top_line(&self) -> usize;

    /// Last line whose bottom edge is inside the renderer's bounding box.
    /// May overshoot the document end; callers clamp.
    fn visible_bottom_line(&self) -> usize;

    /// Final line of the document.
    fn last_line(&self) -> usize;

    /// First line of the document.
    fn first_line(&self) -> usize {
        1
    }

    /// Raw text of `range`, lines joined with `\n`.
    fn text_for_line_range(&self, range: LineRange) -> String;

    /// Apply a decoration. Re-applying an identical marker must be harmless.
    fn place_marker(&mut self, marker: &Marker);

    /// Drop every decoration (document replaced or edited).
    fn clear_markers(&mut self);

    fn scroll_to_line(&mut self, line: usize);

    /// Line height in CSS pixels.
    fn line_height(&self) -> f64;
}

/// Highlight sink for the table-of-contents panel.
pub trait TocPanel {
    /// Toggle the highlight style on one slot.
    fn set_highlighted(&mut self, slot: TocSlot, on: bool);
}

/// Panel that ignores highlight changes (no TOC attached).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTocPanel;

impl TocPanel for NoTocPanel {
    fn set_highlighted(&mut self, _slot: TocSlot, _on: bool) {}
}
