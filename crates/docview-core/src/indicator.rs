#![forbid(unsafe_code)]

//! Overlay scroll indicator geometry.
//!
//! The overlay thumb tracks the text's native scroll position but is drawn by
//! the host, so it must reproduce the native track: on pointer devices the
//! track loses the height of the scrollbar arrow buttons (two for a vertical
//! bar, three when a horizontal bar takes the bottom-right corner too); on
//! touch devices a small gap is kept at each end instead.
//!
//! ```text
//!   viewport_top ─┬─ arrow
//!                 │  ┌─┐ thumb_top = slope * offset + viewport_top + arrow
//!        usable   │  └─┘
//!                 │
//!                 └─ arrow (x multiplier)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::caps::{Capabilities, PointerKind};
use crate::config::EngineConfig;

/// Measurements of the scrolling text element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrollbarMetrics {
    pub bounding_width: f64,
    pub bounding_height: f64,
    pub client_width: f64,
    pub client_height: f64,
    /// Visible height of the scrolling content.
    pub viewable_height: f64,
    /// Full scroll height of the content.
    pub total_scroll_height: f64,
    /// Page offset of the element's top edge.
    pub viewport_top: f64,
}

impl ScrollbarMetrics {
    /// Largest valid scroll offset.
    #[must_use]
    pub fn max_scroll_offset(&self) -> f64 {
        (self.total_scroll_height - self.viewable_height).max(0.0)
    }
}

/// Mapping from scroll offset to thumb position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorModel {
    pub slope: f64,
    pub arrow_height: f64,
    pub arrow_multiplier: u8,
    /// `None` when the content fits and no thumb is drawn.
    pub thumb_height: Option<f64>,
    pub viewport_top: f64,
    pub max_scroll_offset: f64,
}

impl IndicatorModel {
    /// Model for content that fits: no thumb, zero slope.
    #[must_use]
    pub const fn hidden(arrow_height: f64, arrow_multiplier: u8, viewport_top: f64) -> Self {
        Self {
            slope: 0.0,
            arrow_height,
            arrow_multiplier,
            thumb_height: None,
            viewport_top,
            max_scroll_offset: 0.0,
        }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.thumb_height.is_some()
    }

    /// Thumb top edge for a scroll offset. Negative offsets (overscroll)
    /// pin the thumb to the top of the track.
    #[must_use]
    pub fn thumb_top(&self, scroll_offset: f64) -> f64 {
        self.slope * scroll_offset.max(0.0) + self.viewport_top + self.arrow_height
    }

    /// Scroll offset that puts the thumb top at `y`, for dragging.
    #[must_use]
    pub fn scroll_offset_for_thumb_top(&self, y: f64) -> f64 {
        if self.slope <= 0.0 {
            return 0.0;
        }
        let offset = (y - self.viewport_top - self.arrow_height) / self.slope;
        offset.clamp(0.0, self.max_scroll_offset)
    }
}

/// Computes [`IndicatorModel`]s for one pointer kind.
///
/// The branch is fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct ScrollIndicatorMapper {
    pointer: PointerKind,
    arrow_height_px: f64,
    touch_gap_px: f64,
    min_thumb_px: f64,
    scrollbar_presence_px: f64,
    arrow_min_px: f64,
    arrow_max_px: f64,
}

impl ScrollIndicatorMapper {
    #[must_use]
    pub fn new(config: &EngineConfig, caps: &Capabilities) -> Self {
        Self {
            pointer: caps.pointer,
            arrow_height_px: config.arrow_height_px,
            touch_gap_px: config.touch_gap_px,
            min_thumb_px: config.min_thumb_px,
            scrollbar_presence_px: config.scrollbar_presence_px,
            arrow_min_px: config.arrow_min_px,
            arrow_max_px: config.arrow_max_px,
        }
    }

    #[must_use]
    pub const fn pointer(&self) -> PointerKind {
        self.pointer
    }

    fn arrows(&self, m: &ScrollbarMetrics) -> (f64, u8) {
        match self.pointer {
            PointerKind::Touch => (self.touch_gap_px, 2),
            PointerKind::Fine => {
                let width_diff = m.bounding_width - m.client_width;
                let height_diff = m.bounding_height - m.client_height;
                let vertical = width_diff > self.scrollbar_presence_px;
                let horizontal = height_diff > self.scrollbar_presence_px;
                let has_arrows = vertical
                    && width_diff >= self.arrow_min_px
                    && width_diff <= self.arrow_max_px;
                let arrow = if has_arrows { self.arrow_height_px } else { 0.0 };
                let multiplier = if vertical && horizontal { 3 } else { 2 };
                (arrow, multiplier)
            }
        }
    }

    /// Derive the model for the current measurements.
    #[must_use]
    pub fn compute(&self, m: &ScrollbarMetrics) -> IndicatorModel {
        let (arrow_height, arrow_multiplier) = self.arrows(m);
        let viewable = m.viewable_height.max(0.0);
        let total = m.total_scroll_height.max(0.0);
        let usable = viewable - f64::from(arrow_multiplier) * arrow_height;

        if total <= usable || total <= 0.0 {
            debug!(
                target: "docview_core::indicator",
                total,
                usable,
                "content fits; indicator hidden"
            );
            return IndicatorModel::hidden(arrow_height, arrow_multiplier, m.viewport_top);
        }

        let thumb = (usable * viewable / total).max(self.min_thumb_px);
        let scrollable = total - viewable;
        let slope = if scrollable > 0.0 {
            ((usable - thumb) / scrollable).max(0.0)
        } else {
            0.0
        };
        let model = IndicatorModel {
            slope,
            arrow_height,
            arrow_multiplier,
            thumb_height: Some(thumb),
            viewport_top: m.viewport_top,
            max_scroll_offset: scrollable.max(0.0),
        };
        debug!(
            target: "docview_core::indicator",
            pointer = self.pointer.as_str(),
            slope,
            thumb,
            arrow_height,
            arrow_multiplier,
            "indicator model computed"
        );
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::ClientFlags;

    fn mapper(pointer: PointerKind) -> ScrollIndicatorMapper {
        ScrollIndicatorMapper::new(
            &EngineConfig::default(),
            &Capabilities::new(pointer, ClientFlags::empty()),
        )
    }

    fn metrics(width_diff: f64, height_diff: f64) -> ScrollbarMetrics {
        ScrollbarMetrics {
            bounding_width: 800.0,
            bounding_height: 600.0,
            client_width: 800.0 - width_diff,
            client_height: 600.0 - height_diff,
            viewable_height: 600.0,
            total_scroll_height: 6_000.0,
            viewport_top: 40.0,
        }
    }

    #[test]
    fn pointer_with_vertical_scrollbar_reserves_two_arrows() {
        let model = mapper(PointerKind::Fine).compute(&metrics(15.0, 0.0));
        assert_eq!(model.arrow_height, 17.0);
        assert_eq!(model.arrow_multiplier, 2);
        // usable = 600 - 34 = 566; thumb = 566 * 600 / 6000 = 56.6
        let thumb = model.thumb_height.expect("visible thumb");
        assert!((thumb - 56.6).abs() < 1e-9);
        assert!((model.slope - (566.0 - 56.6) / 5_400.0).abs() < 1e-12);
        assert_eq!(model.thumb_top(0.0), 57.0);
    }

    #[test]
    fn both_scrollbars_reserve_three_arrows() {
        let model = mapper(PointerKind::Fine).compute(&metrics(15.0, 15.0));
        assert_eq!(model.arrow_multiplier, 3);
    }

    #[test]
    fn overlay_scrollbar_has_no_arrows() {
        let model = mapper(PointerKind::Fine).compute(&metrics(0.0, 0.0));
        assert_eq!(model.arrow_height, 0.0);
        let wide = mapper(PointerKind::Fine).compute(&metrics(40.0, 0.0));
        assert_eq!(wide.arrow_height, 0.0);
    }

    #[test]
    fn touch_uses_gap() {
        let model = mapper(PointerKind::Touch).compute(&metrics(15.0, 15.0));
        assert_eq!(model.arrow_height, 2.0);
        assert_eq!(model.arrow_multiplier, 2);
    }

    #[test]
    fn small_thumb_is_clamped_to_minimum() {
        let mut m = metrics(15.0, 0.0);
        m.total_scroll_height = 1_000_000.0;
        let model = mapper(PointerKind::Fine).compute(&m);
        assert_eq!(model.thumb_height, Some(20.0));
        let bottom = model.thumb_top(m.max_scroll_offset()) + 20.0;
        assert!((bottom - (40.0 + 600.0 - 17.0)).abs() < 1e-6);
    }

    #[test]
    fn fitting_content_hides_indicator() {
        let mut m = metrics(15.0, 0.0);
        m.total_scroll_height = 500.0;
        let model = mapper(PointerKind::Fine).compute(&m);
        assert!(!model.is_visible());
        assert_eq!(model.slope, 0.0);
    }

    #[test]
    fn negative_offset_pins_thumb() {
        let model = mapper(PointerKind::Fine).compute(&metrics(15.0, 0.0));
        assert_eq!(model.thumb_top(-50.0), model.thumb_top(0.0));
    }

    #[test]
    fn inverse_mapping_round_trips_and_clamps() {
        let model = mapper(PointerKind::Fine).compute(&metrics(15.0, 0.0));
        let y = model.thumb_top(1_234.0);
        assert!((model.scroll_offset_for_thumb_top(y) - 1_234.0).abs() < 1e-6);
        assert_eq!(model.scroll_offset_for_thumb_top(-1_000.0), 0.0);
        assert_eq!(model.scroll_offset_for_thumb_top(1e9), 5_400.0);
    }
}
