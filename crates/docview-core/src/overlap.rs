#![forbid(unsafe_code)]

//! Heading mentions inside document text.
//!
//! After the backend's spans for a range are placed, each line of the range
//! is scanned for tokens naming a TOC heading. A mention is kept only when
//! its span is disjoint from every primary span on the same line, so backend
//! links always win.
//!
//! Columns are character offsets; the regex reports byte offsets, which are
//! converted per match.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::annotation::{Annotation, AnnotationCategory, AnnotationPayload, ColumnSpan};
use crate::toc::HeadingNames;

static WORD_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").ok());
static HYPHEN_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+").ok());

/// Source language convention for identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDialect {
    /// Identifiers are word characters.
    #[default]
    Standard,
    /// Identifiers may contain `-` (Lisp-family sources).
    Hyphenated,
}

impl SourceDialect {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "standard" | "default" => Some(Self::Standard),
            "hyphenated" | "lisp" | "elisp" | "clojure" | "scheme" => Some(Self::Hyphenated),
            _ => None,
        }
    }

    fn token_regex(self) -> Option<&'static Regex> {
        match self {
            Self::Standard => WORD_TOKEN.as_ref(),
            Self::Hyphenated => HYPHEN_TOKEN.as_ref(),
        }
    }

    /// Whether `s` is exactly one token in this dialect.
    #[must_use]
    pub fn is_token(self, s: &str) -> bool {
        !s.is_empty()
            && s.chars().all(|c| {
                c.is_ascii_alphanumeric() || c == '_' || (c == '-' && self == Self::Hyphenated)
            })
    }
}

/// Mentions accepted so far, for click dispatch.
///
/// Keyed by token and by whether the mention was written in call form
/// (`name(`), so `parse(` and a bare `parse` on the same page keep their
/// own headings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionIndex {
    targets: HashMap<(String, bool), usize>,
}

impl MentionIndex {
    pub fn record(&mut self, token: &str, call_form: bool, target_line: usize) {
        self.targets
            .insert((token.to_owned(), call_form), target_line);
    }

    #[must_use]
    pub fn target(&self, token: &str, call_form: bool) -> Option<usize> {
        self.targets.get(&(token.to_owned(), call_form)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }
}

/// Finds heading mentions that do not collide with primary spans.
#[derive(Debug, Clone, Copy)]
pub struct OverlapResolver {
    dialect: SourceDialect,
}

impl OverlapResolver {
    #[must_use]
    pub const fn new(dialect: SourceDialect) -> Self {
        Self { dialect }
    }

    #[must_use]
    pub const fn dialect(&self) -> SourceDialect {
        self.dialect
    }

    /// Mentions on one line, in column order.
    ///
    /// Accepted mentions are also recorded in `mentions`.
    pub fn resolve_line(
        &self,
        line: usize,
        text: &str,
        primaries: &[ColumnSpan],
        names: &HeadingNames,
        mentions: &mut MentionIndex,
    ) -> Vec<Annotation> {
        if names.is_empty() || text.is_empty() {
            return Vec::new();
        }
        let Some(re) = self.dialect.token_regex() else {
            warn!(target: "docview_core::overlap", "token pattern unavailable");
            return Vec::new();
        };

        let mut accepted = Vec::new();
        let mut char_col = 0usize;
        let mut byte_cursor = 0usize;
        for m in re.find_iter(text) {
            char_col += text[byte_cursor..m.start()].chars().count();
            byte_cursor = m.start();

            let token = m.as_str();
            let followed_by_paren = text[m.end()..].starts_with('(');
            let Some(target) = names.resolve(token, followed_by_paren) else {
                continue;
            };
            if target == line {
                continue;
            }

            let len = token.chars().count();
            let candidate = ColumnSpan::new(char_col, char_col + len);
            if primaries.iter().any(|p| candidate.overlaps(*p)) {
                trace!(
                    target: "docview_core::overlap",
                    line,
                    token,
                    column = char_col,
                    "mention rejected: overlaps primary span"
                );
                continue;
            }

            mentions.record(token, followed_by_paren, target);
            accepted.push(Annotation {
                line,
                column_start: candidate.start,
                column_end: candidate.end,
                category: AnnotationCategory::InternalHeader,
                payload: AnnotationPayload::TargetLine(target),
            });
        }
        accepted
    }
}
