#![forbid(unsafe_code)]

//! Visible line range tracking.
//!
//! Pure functions of renderer state, cheap enough to run on every scroll
//! tick. Out-of-bounds reports from the renderer are clamped to the document,
//! never treated as errors.

use tracing::trace;

use crate::range::LineRange;
use crate::renderer::Renderer;

/// Currently visible lines, clamped to the document.
///
/// Returns `None` for an empty document or when the renderer reports a
/// bottom line above its top line.
#[must_use]
pub fn visible_range<R: Renderer + ?Sized>(renderer: &R) -> Option<LineRange> {
    let doc_first = renderer.first_line();
    let doc_last = renderer.last_line();
    if doc_last < doc_first {
        return None;
    }

    let reported_top = renderer.visible_top_line();
    let reported_bottom = renderer.visible_bottom_line();
    let top = reported_top.clamp(doc_first, doc_last);
    let bottom = reported_bottom.clamp(doc_first, doc_last);

    if top != reported_top || bottom != reported_bottom {
        trace!(
            target: "docview_core::viewport",
            reported_top,
            reported_bottom,
            top,
            bottom,
            "clamped visible range to document"
        );
    }

    LineRange::new(top, bottom)
}

/// Number of visible lines (0 when nothing is visible).
#[must_use]
pub fn visible_line_count<R: Renderer + ?Sized>(renderer: &R) -> usize {
    visible_range(renderer).map_or(0, LineRange::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRenderer;

    #[test]
    fn reports_renderer_window() {
        let mut r = MemoryRenderer::with_lines(500);
        r.set_viewport(1, 40);
        assert_eq!(visible_range(&r), LineRange::new(1, 40));
        assert_eq!(visible_line_count(&r), 40);
    }

    #[test]
    fn bottom_past_document_end_is_clamped() {
        let mut r = MemoryRenderer::with_lines(30);
        r.set_viewport(10, 52);
        assert_eq!(visible_range(&r), LineRange::new(10, 30));
    }

    #[test]
    fn top_before_document_start_is_clamped() {
        let mut r = MemoryRenderer::with_lines(30);
        r.set_viewport(0, 12);
        assert_eq!(visible_range(&r), LineRange::new(1, 12));
    }

    #[test]
    fn empty_document_has_no_range() {
        let r = MemoryRenderer::with_lines(0);
        assert_eq!(visible_range(&r), None);
        assert_eq!(visible_line_count(&r), 0);
    }

    #[test]
    fn inverted_report_is_nothing_visible() {
        let mut r = MemoryRenderer::with_lines(100);
        r.set_viewport(50, 20);
        assert_eq!(visible_range(&r), None);
    }
}
