#![forbid(unsafe_code)]

//! Lazy annotation of the visible text.
//!
//! Annotation is split in two phases because the backend round trip is
//! asynchronous while the engine is single-threaded:
//!
//! 1. [`AnnotationRequester::begin`] trims the visible range against the seen
//!    cache and returns a [`ClassifyRequest`] for the host to send.
//! 2. [`AnnotationRequester::complete`] takes the backend outcome, places
//!    primary markers and heading mentions, and marks the sent range seen.
//!
//! Lines are marked seen only after a successful round trip, so a failure
//! leaves the range eligible for the next settled scroll.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::annotation::{Annotation, ClassifyRequest, ColumnSpan, LinkSpan, RequestId};
use crate::caps::ClientFlags;
use crate::error::ClassifyError;
use crate::overlap::{MentionIndex, OverlapResolver};
use crate::range::LineRange;
use crate::renderer::{Marker, Renderer};
use crate::seen::SeenLineCache;
use crate::toc::HeadingNames;
use crate::viewport::visible_range;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    range: LineRange,
    generation: u64,
}

/// Heading-mention inputs for [`AnnotationRequester::complete`].
pub struct MentionContext<'a> {
    pub resolver: OverlapResolver,
    pub names: &'a HeadingNames,
    pub mentions: &'a mut MentionIndex,
}

/// What a completion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionReport {
    /// Markers placed and `range` marked seen.
    Applied {
        range: LineRange,
        primary: usize,
        mentions: usize,
    },
    /// Round trip failed; `range` stays unseen.
    Failed { range: LineRange },
    /// Unknown id or a document that has since changed.
    Stale,
}

/// Tracks in-flight classification requests for one document view.
#[derive(Debug, Clone)]
pub struct AnnotationRequester {
    next_id: u64,
    generation: u64,
    in_flight: HashMap<RequestId, InFlight>,
    failed_status: String,
    status: Option<String>,
}

impl AnnotationRequester {
    #[must_use]
    pub fn new(failed_status: impl Into<String>) -> Self {
        Self {
            next_id: 1,
            generation: 0,
            in_flight: HashMap::new(),
            failed_status: failed_status.into(),
            status: None,
        }
    }

    /// Current document generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new document generation. Completions of requests sent before
    /// this call are dropped as stale.
    pub fn new_generation(&mut self) {
        self.generation += 1;
        self.status = None;
        debug!(
            target: "docview_core::annotate",
            generation = self.generation,
            stale_in_flight = self.in_flight.len(),
            "annotation generation advanced"
        );
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether `range` is already awaiting a response in this generation.
    #[must_use]
    pub fn is_in_flight(&self, range: LineRange) -> bool {
        self.in_flight
            .values()
            .any(|f| f.generation == self.generation && f.range == range)
    }

    /// User-visible status left by the last failure.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Forget request `id` without applying anything. Returns whether it was
    /// in flight.
    pub fn abandon(&mut self, id: RequestId) -> bool {
        let Some(flight) = self.in_flight.remove(&id) else {
            return false;
        };
        debug!(
            target: "docview_core::annotate",
            %id,
            range = %flight.range,
            "request abandoned"
        );
        true
    }

    /// Build a request for the unseen part of the viewport, if any.
    pub fn begin<R: Renderer + ?Sized>(
        &mut self,
        renderer: &R,
        seen: &SeenLineCache,
        flags: ClientFlags,
    ) -> Option<ClassifyRequest> {
        let visible = visible_range(renderer)?;
        let Some(range) = seen.filter_unseen(visible) else {
            debug!(
                target: "docview_core::annotate",
                %visible,
                "viewport already annotated"
            );
            return None;
        };
        if self.is_in_flight(range) {
            debug!(target: "docview_core::annotate", %range, "request already in flight");
            return None;
        }

        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.in_flight.insert(
            id,
            InFlight {
                range,
                generation: self.generation,
            },
        );
        let text = renderer.text_for_line_range(range);
        info!(
            target: "docview_core::annotate",
            %id,
            %range,
            %visible,
            bytes = text.len(),
            "classification request started"
        );
        Some(ClassifyRequest {
            id,
            range,
            text,
            flags,
        })
    }

    /// Apply the backend outcome for request `id`.
    pub fn complete<R: Renderer + ?Sized>(
        &mut self,
        id: RequestId,
        outcome: Result<Vec<LinkSpan>, ClassifyError>,
        renderer: &mut R,
        seen: &mut SeenLineCache,
        ctx: MentionContext<'_>,
    ) -> CompletionReport {
        let Some(flight) = self.in_flight.remove(&id) else {
            debug!(target: "docview_core::annotate", %id, "completion for unknown request");
            return CompletionReport::Stale;
        };
        if flight.generation != self.generation {
            debug!(
                target: "docview_core::annotate",
                %id,
                sent_generation = flight.generation,
                generation = self.generation,
                "completion for replaced document dropped"
            );
            return CompletionReport::Stale;
        }
        let range = flight.range;

        let spans = match outcome {
            Ok(spans) => spans,
            Err(err) => {
                warn!(
                    target: "docview_core::annotate",
                    %id,
                    %range,
                    error = %err,
                    "classification failed; range left unseen"
                );
                self.status = Some(self.failed_status.clone());
                return CompletionReport::Failed { range };
            }
        };

        // Lines seen by an earlier request may ride along as context; their
        // annotations are already placed.
        let fresh = |line: usize| !seen.is_seen(line);

        let mut primaries: HashMap<usize, Vec<ColumnSpan>> = HashMap::new();
        let mut primary = 0usize;
        for span in &spans {
            let Some(annotation) = Annotation::from_span(span, range) else {
                debug!(
                    target: "docview_core::annotate",
                    line_in_text = span.line_num_in_text,
                    link_type = %span.link_type,
                    "skipping span outside range or of unknown type"
                );
                continue;
            };
            if !fresh(annotation.line) {
                continue;
            }
            renderer.place_marker(&Marker::from(&annotation));
            primaries
                .entry(annotation.line)
                .or_default()
                .push(annotation.span());
            primary += 1;
        }

        let mut mentions = 0usize;
        if !ctx.names.is_empty() {
            for line in range.iter().filter(|&l| fresh(l)) {
                let text = renderer.text_for_line_range(LineRange::single(line));
                let blocked = primaries.get(&line).map_or(&[][..], Vec::as_slice);
                let found =
                    ctx.resolver
                        .resolve_line(line, &text, blocked, ctx.names, &mut *ctx.mentions);
                for mention in found {
                    renderer.place_marker(&Marker::from(&mention));
                    mentions += 1;
                }
            }
        }

        seen.mark_seen(range);
        self.status = None;
        info!(
            target: "docview_core::annotate",
            %id,
            %range,
            primary,
            mentions,
            seen_lines = seen.seen_line_count(),
            "classification applied"
        );
        CompletionReport::Applied {
            range,
            primary,
            mentions,
        }
    }
}
