#![forbid(unsafe_code)]

//! Engine tuning as data.
//!
//! Every field has a default, and partial documents are accepted, so a host
//! only spells out what it wants to change:
//!
//! ```toml
//! annotate_debounce_ms = 400
//! arrow_height_px = 15.0
//! ```
//!
//! ```
//! use docview_core::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "min_thumb_px": 24.0 }"#).unwrap();
//! assert_eq!(config.min_thumb_px, 24.0);
//! assert_eq!(config.annotate_debounce_ms, 250);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Status shown when a classification round trip fails.
pub const DEFAULT_CLASSIFY_FAILED_STATUS: &str =
    "Could not reach the link service. Links will be retried on the next scroll.";

/// Tunable parameters for every engine component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before unseen lines are sent for classification.
    pub annotate_debounce_ms: u64,
    /// Quiet period before the indicator thumb is repositioned.
    pub indicator_debounce_ms: u64,
    /// Quiet period before the TOC highlight follows the viewport.
    pub toc_debounce_ms: u64,
    /// Quiet period before the bookmark observes the new position.
    pub bookmark_debounce_ms: u64,

    /// Height of one decorative scrollbar arrow on pointer devices.
    pub arrow_height_px: f64,
    /// Gap kept at the scrollbar ends on touch devices.
    pub touch_gap_px: f64,
    /// Smallest thumb drawn on the indicator.
    pub min_thumb_px: f64,
    /// Bounding/client size difference above which a native scrollbar is present.
    pub scrollbar_presence_px: f64,
    /// Plausible scrollbar width range for arrow-button scrollbars.
    pub arrow_min_px: f64,
    pub arrow_max_px: f64,

    /// Lower bound of the bookmark's big-move threshold.
    pub min_big_move: usize,
    /// Lines added to the visible line count to form the threshold.
    pub big_move_padding: usize,

    /// User-visible status for a failed classification round trip.
    pub status_classify_failed: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            annotate_debounce_ms: 250,
            indicator_debounce_ms: 30,
            toc_debounce_ms: 150,
            bookmark_debounce_ms: 150,
            arrow_height_px: 17.0,
            touch_gap_px: 2.0,
            min_thumb_px: 20.0,
            scrollbar_presence_px: 2.0,
            arrow_min_px: 6.0,
            arrow_max_px: 30.0,
            min_big_move: 20,
            big_move_padding: 10,
            status_classify_failed: DEFAULT_CLASSIFY_FAILED_STATUS.to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.into_checked()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.into_checked()
    }

    fn into_checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Check every parameter. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let px_fields = [
            ("arrow_height_px", self.arrow_height_px),
            ("touch_gap_px", self.touch_gap_px),
            ("min_thumb_px", self.min_thumb_px),
            ("scrollbar_presence_px", self.scrollbar_presence_px),
            ("arrow_min_px", self.arrow_min_px),
            ("arrow_max_px", self.arrow_max_px),
        ];
        for (name, value) in px_fields {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be a finite non-negative number"));
            }
        }
        if self.arrow_min_px > self.arrow_max_px {
            errors.push("arrow_min_px must be <= arrow_max_px".to_owned());
        }
        if self.annotate_debounce_ms < self.indicator_debounce_ms {
            errors.push("annotate_debounce_ms must be >= indicator_debounce_ms".to_owned());
        }
        if self.min_big_move == 0 {
            errors.push("min_big_move must be positive".to_owned());
        }
        errors
    }

    /// Clamp every parameter into a usable range instead of rejecting it.
    #[must_use]
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        for (value, fallback) in [
            (&mut self.arrow_height_px, defaults.arrow_height_px),
            (&mut self.touch_gap_px, defaults.touch_gap_px),
            (&mut self.min_thumb_px, defaults.min_thumb_px),
            (&mut self.scrollbar_presence_px, defaults.scrollbar_presence_px),
            (&mut self.arrow_min_px, defaults.arrow_min_px),
            (&mut self.arrow_max_px, defaults.arrow_max_px),
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = fallback;
            }
        }
        if self.arrow_min_px > self.arrow_max_px {
            std::mem::swap(&mut self.arrow_min_px, &mut self.arrow_max_px);
        }
        self.annotate_debounce_ms = self.annotate_debounce_ms.max(self.indicator_debounce_ms);
        self.min_big_move = self.min_big_move.max(1);
        self
    }

    #[must_use]
    pub fn annotate_debounce(&self) -> Duration {
        Duration::from_millis(self.annotate_debounce_ms)
    }

    #[must_use]
    pub fn indicator_debounce(&self) -> Duration {
        Duration::from_millis(self.indicator_debounce_ms)
    }

    #[must_use]
    pub fn toc_debounce(&self) -> Duration {
        Duration::from_millis(self.toc_debounce_ms)
    }

    #[must_use]
    pub fn bookmark_debounce(&self) -> Duration {
        Duration::from_millis(self.bookmark_debounce_ms)
    }
}
