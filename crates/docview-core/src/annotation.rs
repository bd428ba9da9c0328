#![forbid(unsafe_code)]

//! Annotation model and the classification wire format.
//!
//! The backend receives the raw text of a line range and answers with link
//! spans whose line numbers are relative to that range. This module owns the
//! request body, the tolerant response decoder, and the translation from a
//! relative [`LinkSpan`] to a document-absolute [`Annotation`].
//!
//! # Response shapes
//!
//! | Body | Meaning |
//! |------|---------|
//! | `[ {span}, … ]` | spans |
//! | `{ "links": [ {span}, … ] }` | spans |
//! | `""`, `null`, `"none"` (any bare string) | no annotations |
//! | anything else | malformed, treated as no annotations |

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::caps::ClientFlags;
use crate::range::LineRange;

/// Kind of decoration applied to a character span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationCategory {
    File,
    Image,
    Web,
    Video,
    Directory,
    Glossary,
    /// Client-side mention of a TOC heading.
    InternalHeader,
}

impl AnnotationCategory {
    /// Categories the backend may return.
    pub const PRIMARY: [Self; 6] = [
        Self::File,
        Self::Image,
        Self::Web,
        Self::Video,
        Self::Directory,
        Self::Glossary,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Image => "image",
            Self::Web => "web",
            Self::Video => "video",
            Self::Directory => "directory",
            Self::Glossary => "glossary",
            Self::InternalHeader => "internal-header",
        }
    }

    /// Parse a backend `linkType`. Internal headers are never backend-sourced.
    #[must_use]
    pub fn parse_link_type(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "image" | "img" => Some(Self::Image),
            "web" | "url" => Some(Self::Web),
            "video" => Some(Self::Video),
            "directory" | "dir" => Some(Self::Directory),
            "glossary" => Some(Self::Glossary),
            _ => None,
        }
    }

    /// Backend-sourced categories take precedence over heading mentions.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        !matches!(self, Self::InternalHeader)
    }

    /// CSS class the renderer applies to the span.
    #[must_use]
    pub const fn style_class(self) -> &'static str {
        match self {
            Self::File => "dv-link-file",
            Self::Image => "dv-link-image",
            Self::Web => "dv-link-web",
            Self::Video => "dv-link-video",
            Self::Directory => "dv-link-directory",
            Self::Glossary => "dv-link-glossary",
            Self::InternalHeader => "dv-heading-mention",
        }
    }
}

/// Category-specific annotation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationPayload {
    /// Markup fragment rendered in place of the covered text.
    Markup(String),
    /// Line an internal-header mention jumps to.
    TargetLine(usize),
}

impl AnnotationPayload {
    #[must_use]
    pub fn markup(&self) -> Option<&str> {
        match self {
            Self::Markup(markup) => Some(markup),
            Self::TargetLine(_) => None,
        }
    }

    #[must_use]
    pub const fn target_line(&self) -> Option<usize> {
        match self {
            Self::Markup(_) => None,
            Self::TargetLine(line) => Some(*line),
        }
    }
}

/// A decoration on one line, in document-absolute coordinates.
///
/// `column_end` is exclusive for rendering; overlap checks treat the span as
/// the closed interval `[column_start, column_end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub line: usize,
    pub column_start: usize,
    pub column_end: usize,
    pub category: AnnotationCategory,
    pub payload: AnnotationPayload,
}

impl Annotation {
    /// Resolve a backend span against the range it was requested for.
    ///
    /// Returns `None` for unknown link types and for spans that fall outside
    /// `sent`.
    #[must_use]
    pub fn from_span(span: &LinkSpan, sent: LineRange) -> Option<Self> {
        let category = AnnotationCategory::parse_link_type(&span.link_type)?;
        let line = sent.absolute(span.line_num_in_text)?;
        Some(Self {
            line,
            column_start: span.column_in_text,
            column_end: span.column_in_text.saturating_add(span.length),
            category,
            payload: AnnotationPayload::Markup(span.link_path.clone()),
        })
    }

    /// Closed-interval span used for overlap checks.
    #[must_use]
    pub const fn span(&self) -> ColumnSpan {
        ColumnSpan {
            start: self.column_start,
            end: self.column_end,
        }
    }
}

/// Closed column interval on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpan {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Closed-interval intersection test.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        !(self.end < other.start || self.start > other.end)
    }
}

/// One detected link, relative to the requested range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpan {
    pub line_num_in_text: usize,
    pub column_in_text: usize,
    pub length: usize,
    pub link_path: String,
    pub link_type: String,
}

/// Monotonic identifier of an annotation request within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// A classification request ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyRequest {
    pub id: RequestId,
    /// Sub-range actually sent (absolute lines).
    pub range: LineRange,
    /// Lines of `range` joined with `\n`.
    pub text: String,
    pub flags: ClientFlags,
}

impl ClassifyRequest {
    /// JSON body for the backend.
    #[must_use]
    pub fn to_json_body(&self) -> String {
        json!({
            "text": self.text,
            "firstLine": self.range.first(),
            "lastLine": self.range.last(),
            "remote": self.flags.contains(ClientFlags::REMOTE),
            "allowEdit": self.flags.contains(ClientFlags::ALLOW_EDIT),
            "usePreferredApp": self.flags.contains(ClientFlags::PREFERRED_APP),
            "readOnly": self.flags.contains(ClientFlags::READ_ONLY),
        })
        .to_string()
    }
}

/// Decode a backend response body. Never fails: malformed bodies decode to
/// no spans.
#[must_use]
pub fn decode_classify_response(body: &str) -> Vec<LinkSpan> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                target: "docview_core::annotation",
                error = %err,
                body_len = body.len(),
                "classification response is not JSON; treating as no annotations"
            );
            return Vec::new();
        }
    };

    let spans = match value {
        Value::Null | Value::String(_) => return Vec::new(),
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("links") {
            Some(links @ Value::Array(_)) => links,
            _ => {
                warn!(
                    target: "docview_core::annotation",
                    "classification response object has no links array"
                );
                return Vec::new();
            }
        },
        other => {
            warn!(
                target: "docview_core::annotation",
                kind = json_kind(&other),
                "unexpected classification response shape"
            );
            return Vec::new();
        }
    };

    match serde_json::from_value::<Vec<LinkSpan>>(spans) {
        Ok(spans) => spans,
        Err(err) => {
            warn!(
                target: "docview_core::annotation",
                error = %err,
                "malformed link span; treating response as no annotations"
            );
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
