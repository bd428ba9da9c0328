#![forbid(unsafe_code)]

//! Platform-independent half of the web viewer.
//!
//! Option parsing, response classification, thumb styling, and JSON
//! snapshots live here so they can be tested natively. No JS/WASM types.

use core::time::Duration;

use docview_core::annotation::{LinkSpan, decode_classify_response};
use docview_core::bookmark::BookmarkState;
use docview_core::caps::{Capabilities, ClientFlags, PointerKind};
use docview_core::config::EngineConfig;
use docview_core::debounce::SettleTasks;
use docview_core::error::{ClassifyError, ConfigError};
use docview_core::indicator::IndicatorModel;
use docview_core::session::SettleReport;
use docview_core::toc::TocEntryInput;
use serde_json::Value;

/// Endpoint used when the options object names none.
pub const DEFAULT_CLASSIFY_ENDPOINT: &str = "/api/links/classify";

/// CSS class toggled on the current TOC entry.
pub const DEFAULT_HIGHLIGHT_CLASS: &str = "dv-toc-current";

/// Everything the constructor's `options` object configures.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    pub config: EngineConfig,
    /// Capability flags; the pointer kind is `None` unless overridden.
    pub flags: ClientFlags,
    pub pointer: Option<PointerKind>,
    pub endpoint: String,
    pub highlight_class: String,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            flags: ClientFlags::empty(),
            pointer: None,
            endpoint: DEFAULT_CLASSIFY_ENDPOINT.to_owned(),
            highlight_class: DEFAULT_HIGHLIGHT_CLASS.to_owned(),
        }
    }
}

impl ViewerOptions {
    /// Parse the JSON form of the options object.
    ///
    /// Engine fields use their config names (`annotate_debounce_ms`, ...);
    /// capability flags use the backend's names (`remote`, `allowEdit`,
    /// `usePreferredApp`, `readOnly`). Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let trimmed = json.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
            return Ok(Self::default());
        }
        let config = EngineConfig::from_json_str(trimmed)?;
        let value: Value = serde_json::from_str(trimmed)?;

        let mut errors = Vec::new();
        let mut flags = ClientFlags::empty();
        for (key, flag) in [
            ("remote", ClientFlags::REMOTE),
            ("allowEdit", ClientFlags::ALLOW_EDIT),
            ("usePreferredApp", ClientFlags::PREFERRED_APP),
            ("readOnly", ClientFlags::READ_ONLY),
        ] {
            match value.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::Bool(on)) => flags.set(flag, *on),
                Some(_) => errors.push(format!("field {key} must be a boolean")),
            }
        }

        let pointer = match value.get("pointer") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => match PointerKind::parse(raw) {
                Some(kind) => Some(kind),
                None => {
                    errors.push(format!("field pointer has unknown value {raw:?}"));
                    None
                }
            },
            Some(_) => {
                errors.push("field pointer must be a string".to_owned());
                None
            }
        };

        let endpoint = string_field(&value, "endpoint", &mut errors)
            .unwrap_or_else(|| DEFAULT_CLASSIFY_ENDPOINT.to_owned());
        let highlight_class = string_field(&value, "highlightClass", &mut errors)
            .unwrap_or_else(|| DEFAULT_HIGHLIGHT_CLASS.to_owned());

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        Ok(Self {
            config,
            flags,
            pointer,
            endpoint,
            highlight_class,
        })
    }

    /// Capabilities, with the probed pointer kind used unless overridden.
    #[must_use]
    pub fn capabilities(&self, probed: PointerKind) -> Capabilities {
        Capabilities::new(self.pointer.unwrap_or(probed), self.flags)
    }
}

fn string_field(value: &Value, key: &str, errors: &mut Vec<String>) -> Option<String> {
    match value.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(_) => {
            errors.push(format!("field {key} must be a non-empty string"));
            None
        }
    }
}

/// Parse the JSON form of the structured TOC list.
pub fn parse_toc_entries(json: &str) -> Result<Vec<TocEntryInput>, ConfigError> {
    let trimmed = json.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Outcome of one HTTP round trip: non-2xx is a failure, any 2xx body
/// decodes (possibly to nothing).
pub fn classify_outcome(status: u16, body: &str) -> Result<Vec<LinkSpan>, ClassifyError> {
    if (200..300).contains(&status) {
        Ok(decode_classify_response(body))
    } else {
        Err(ClassifyError::Status { code: status })
    }
}

/// Host milliseconds (`performance.now()`) as a duration. Garbage clamps to
/// zero.
#[must_use]
pub fn duration_from_ms(ms: f64) -> Duration {
    if !ms.is_finite() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
}

/// Milliseconds for handing a deadline back to JS.
#[must_use]
pub fn ms_from_duration(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Inline style for the overlay thumb element.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbStyle {
    pub display: &'static str,
    pub top: Option<String>,
    pub height: Option<String>,
}

impl ThumbStyle {
    #[must_use]
    pub fn for_offset(model: Option<&IndicatorModel>, scroll_offset: f64) -> Self {
        match model.and_then(|m| m.thumb_height.map(|h| (m, h))) {
            Some((model, height)) => Self {
                display: "block",
                top: Some(format!("{:.1}px", model.thumb_top(scroll_offset))),
                height: Some(format!("{height:.1}px")),
            },
            None => Self {
                display: "none",
                top: None,
                height: None,
            },
        }
    }

    /// Style to apply after a settle tick. `None` unless the indicator task
    /// ran; a hidden model yields `display: none`.
    #[must_use]
    pub fn after_settle(
        report: &SettleReport,
        model: Option<&IndicatorModel>,
        scroll_offset: f64,
    ) -> Option<Self> {
        report
            .ran
            .contains(SettleTasks::INDICATOR)
            .then(|| Self::for_offset(model, scroll_offset))
    }
}

/// JSON snapshot returned by `bookmarkState()`.
#[must_use]
pub fn bookmark_json(state: &BookmarkState) -> String {
    serde_json::json!({
        "proximal": state.proximal,
        "distal": state.distal,
        "bigMoveThreshold": state.big_move_threshold,
    })
    .to_string()
}

/// JSON snapshot returned by `indicatorModel()`; `null` before the first
/// measurement.
#[must_use]
pub fn indicator_json(model: Option<&IndicatorModel>) -> String {
    match model {
        Some(m) => serde_json::json!({
            "slope": m.slope,
            "arrowHeight": m.arrow_height,
            "arrowMultiplier": m.arrow_multiplier,
            "thumbHeight": m.thumb_height,
            "viewportTop": m.viewport_top,
            "maxScrollOffset": m.max_scroll_offset,
        })
        .to_string(),
        None => "null".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docview_core::caps::ClientFlags;
    use docview_core::indicator::{ScrollIndicatorMapper, ScrollbarMetrics};
    use pretty_assertions::assert_eq;

    #[test]
    fn options_default_when_absent() {
        for raw in ["", "null", "undefined", "{}"] {
            let opts = ViewerOptions::from_json(raw).expect("empty options parse");
            assert_eq!(opts, ViewerOptions::default());
        }
    }

    #[test]
    fn options_mix_config_and_flags() {
        let opts = ViewerOptions::from_json(
            r#"{
                "annotate_debounce_ms": 400,
                "remote": true,
                "readOnly": true,
                "allowEdit": false,
                "pointer": "touch",
                "endpoint": "/classify"
            }"#,
        )
        .expect("options parse");
        assert_eq!(opts.config.annotate_debounce_ms, 400);
        assert_eq!(opts.flags, ClientFlags::REMOTE | ClientFlags::READ_ONLY);
        assert_eq!(opts.endpoint, "/classify");
        assert_eq!(
            opts.capabilities(PointerKind::Fine).pointer,
            PointerKind::Touch
        );
    }

    #[test]
    fn options_type_errors_are_collected() {
        let err = ViewerOptions::from_json(r#"{"remote": "yes", "pointer": "pen", "endpoint": ""}"#)
            .expect_err("bad options should fail");
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].contains("remote"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn probed_pointer_used_without_override() {
        let opts = ViewerOptions::default();
        assert!(opts.capabilities(PointerKind::Touch).is_touch());
    }

    #[test]
    fn toc_entries_accept_both_line_spellings() {
        let entries = parse_toc_entries(
            r#"[{"anchorText":"Intro","targetLine":3},{"anchorText":"Usage","targetLineNumber":40}]"#,
        )
        .expect("toc parses");
        assert_eq!(
            entries,
            vec![TocEntryInput::new("Intro", 3), TocEntryInput::new("Usage", 40)]
        );
        assert!(parse_toc_entries("null").expect("null toc").is_empty());
        assert!(parse_toc_entries("{").is_err());
    }

    #[test]
    fn non_success_status_is_failure() {
        assert_eq!(
            classify_outcome(503, "[]"),
            Err(ClassifyError::Status { code: 503 })
        );
        assert_eq!(classify_outcome(200, "none"), Ok(Vec::new()));
        assert_eq!(classify_outcome(204, ""), Ok(Vec::new()));
    }

    #[test]
    fn host_time_conversion_is_total() {
        assert_eq!(duration_from_ms(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_ms(-5.0), Duration::ZERO);
        assert_eq!(duration_from_ms(1_500.0), Duration::from_millis(1_500));
        assert_eq!(ms_from_duration(Duration::from_millis(250)), 250.0);
    }

    #[test]
    fn thumb_style_hidden_without_thumb() {
        assert_eq!(ThumbStyle::for_offset(None, 10.0).display, "none");
        let mapper = ScrollIndicatorMapper::new(
            &EngineConfig::default(),
            &Capabilities::new(PointerKind::Touch, ClientFlags::empty()),
        );
        let model = mapper.compute(&ScrollbarMetrics {
            viewable_height: 500.0,
            total_scroll_height: 5_000.0,
            ..ScrollbarMetrics::default()
        });
        let style = ThumbStyle::for_offset(Some(&model), 0.0);
        assert_eq!(style.display, "block");
        assert_eq!(style.top.as_deref(), Some("2.0px"));
        assert_eq!(style.height.as_deref(), Some("49.6px"));
    }

    #[test]
    fn settled_indicator_hides_thumb_when_content_fits() {
        let hidden = IndicatorModel::hidden(17.0, 1, 0.0);
        let settled = SettleReport {
            ran: SettleTasks::INDICATOR,
            ..SettleReport::default()
        };
        let style = ThumbStyle::after_settle(&settled, Some(&hidden), 120.0)
            .expect("indicator task ran");
        assert_eq!(style.display, "none");
        assert_eq!(style.top, None);

        let other = SettleReport {
            ran: SettleTasks::TOC,
            ..SettleReport::default()
        };
        assert_eq!(ThumbStyle::after_settle(&other, Some(&hidden), 120.0), None);
    }

    #[test]
    fn snapshots_are_camel_case_json() {
        let json = bookmark_json(&BookmarkState {
            proximal: 114,
            distal: 300,
            big_move_threshold: 40,
        });
        let v: Value = serde_json::from_str(&json).expect("bookmark json");
        assert_eq!(v["bigMoveThreshold"], 40);
        assert_eq!(indicator_json(None), "null");
    }
}
