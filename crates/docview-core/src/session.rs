#![forbid(unsafe_code)]

//! One document view.
//!
//! [`ViewerSession`] owns every piece of per-view state: the seen cache,
//! in-flight requests, the TOC index and highlight, heading mentions, the
//! indicator model, the bookmark, and the settle scheduler. Hosts forward
//! raw events with a monotonic `now` and call [`ViewerSession::tick`] when
//! [`ViewerSession::next_deadline`] passes.
//!
//! # Event flow
//!
//! ```text
//! scroll ──► on_scroll ──► poke(all) ──► tick ──► begin annotation
//!                                          ├────► thumb top
//!                                          ├────► TOC highlight
//!                                          └────► bookmark observe
//! fetch resolves ──► complete_annotation ──► markers + seen
//! ```

use std::time::Duration;

use tracing::{debug, info};

use crate::annotate::{AnnotationRequester, CompletionReport, MentionContext};
use crate::annotation::{ClassifyRequest, LinkSpan, RequestId};
use crate::bookmark::{BookmarkState, ToggleBookmark};
use crate::caps::Capabilities;
use crate::config::EngineConfig;
use crate::debounce::{SettleScheduler, SettleTasks};
use crate::error::ClassifyError;
use crate::indicator::{IndicatorModel, ScrollIndicatorMapper, ScrollbarMetrics};
use crate::overlap::{MentionIndex, OverlapResolver, SourceDialect};
use crate::renderer::{Renderer, TocPanel};
use crate::seen::SeenLineCache;
use crate::toc::{HeadingNames, TocEntryInput, TocIndex, TocSlot, TocSynchronizer};
use crate::viewport::{visible_line_count, visible_range};

/// Work done by one [`ViewerSession::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettleReport {
    /// Tasks whose quiet period elapsed.
    pub ran: SettleTasks,
    /// Classification request for the host to send.
    pub request: Option<ClassifyRequest>,
    /// New overlay thumb top, when the indicator is visible.
    pub thumb_top: Option<f64>,
    /// Highlighted TOC slot.
    pub toc: Option<TocSlot>,
    /// Bookmark after observing the settled position.
    pub bookmark: Option<BookmarkState>,
}

/// Per-view engine state.
#[derive(Debug)]
pub struct ViewerSession {
    config: EngineConfig,
    caps: Capabilities,
    seen: SeenLineCache,
    requester: AnnotationRequester,
    resolver: OverlapResolver,
    names: HeadingNames,
    mentions: MentionIndex,
    toc: TocSynchronizer,
    mapper: ScrollIndicatorMapper,
    model: Option<IndicatorModel>,
    bookmark: ToggleBookmark,
    scheduler: SettleScheduler,
    scroll_offset: f64,
}

impl ViewerSession {
    #[must_use]
    pub fn new(config: EngineConfig, caps: Capabilities) -> Self {
        info!(
            target: "docview_core::session",
            pointer = caps.pointer.as_str(),
            flags = ?caps.flags,
            "viewer session created"
        );
        Self {
            requester: AnnotationRequester::new(config.status_classify_failed.clone()),
            mapper: ScrollIndicatorMapper::new(&config, &caps),
            bookmark: ToggleBookmark::with_padding(1, config.min_big_move, config.big_move_padding),
            scheduler: SettleScheduler::new(&config),
            seen: SeenLineCache::new(),
            resolver: OverlapResolver::new(SourceDialect::Standard),
            names: HeadingNames::default(),
            mentions: MentionIndex::default(),
            toc: TocSynchronizer::default(),
            model: None,
            scroll_offset: 0.0,
            config,
            caps,
        }
    }

    // --- accessors -------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.caps
    }

    #[must_use]
    pub fn seen(&self) -> &SeenLineCache {
        &self.seen
    }

    #[must_use]
    pub fn toc_index(&self) -> &TocIndex {
        self.toc.index()
    }

    #[must_use]
    pub fn bookmark_state(&self) -> BookmarkState {
        self.bookmark.state()
    }

    #[must_use]
    pub fn indicator_model(&self) -> Option<IndicatorModel> {
        self.model
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.requester.in_flight_count()
    }

    /// Earliest time [`tick`](Self::tick) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// User-visible status message, if any.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.requester.status()
    }

    pub fn clear_status(&mut self) {
        self.requester.clear_status();
    }

    // --- document lifecycle ------------------------------------------------

    fn forget_annotations<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        self.seen.clear();
        self.mentions.clear();
        renderer.clear_markers();
        self.requester.new_generation();
    }

    /// Install a new document and request annotations for the first screen.
    pub fn load_document<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        toc_entries: Vec<TocEntryInput>,
        dialect: SourceDialect,
        now: Duration,
    ) -> Option<ClassifyRequest> {
        self.forget_annotations(renderer);
        self.scheduler.cancel(SettleTasks::all());

        let index = TocIndex::build(toc_entries);
        self.names = HeadingNames::build(&index, |s| dialect.is_token(s));
        self.resolver = OverlapResolver::new(dialect);
        self.toc = TocSynchronizer::new(index);

        self.bookmark.reset(renderer.first_line());
        self.bookmark.resize(visible_line_count(&*renderer));
        self.scroll_offset = 0.0;

        info!(
            target: "docview_core::session",
            lines = renderer.last_line(),
            toc_entries = self.toc.index().len(),
            ?dialect,
            generation = self.requester.generation(),
            "document loaded"
        );

        self.scheduler
            .poke(SettleTasks::INDICATOR | SettleTasks::TOC, now);
        self.requester.begin(&*renderer, &self.seen, self.caps.flags)
    }

    /// The text changed in place; everything annotated so far is stale.
    pub fn on_edit<R: Renderer + ?Sized>(&mut self, renderer: &mut R, now: Duration) {
        self.forget_annotations(renderer);
        self.scheduler.poke(SettleTasks::ANNOTATE, now);
        debug!(target: "docview_core::session", "document edited; annotations reset");
    }

    // --- scroll / layout events --------------------------------------------

    pub fn on_scroll(&mut self, scroll_offset: f64, now: Duration) {
        self.scroll_offset = scroll_offset;
        self.scheduler.poke(SettleTasks::all(), now);
    }

    pub fn on_resize<R: Renderer + ?Sized>(
        &mut self,
        renderer: &R,
        metrics: &ScrollbarMetrics,
        now: Duration,
    ) {
        self.model = Some(self.mapper.compute(metrics));
        self.bookmark.resize(visible_line_count(renderer));
        self.scheduler.poke(SettleTasks::all(), now);
    }

    /// Content grew or shrank without a resize (late layout, images).
    pub fn on_content_height_changed(&mut self, metrics: &ScrollbarMetrics) {
        self.model = Some(self.mapper.compute(metrics));
    }

    /// Run every task whose quiet period has elapsed.
    pub fn tick<R: Renderer + ?Sized>(
        &mut self,
        renderer: &R,
        panel: &mut dyn TocPanel,
        now: Duration,
    ) -> SettleReport {
        let ran = self.scheduler.drain_due(now);
        let mut report = SettleReport {
            ran,
            ..SettleReport::default()
        };
        if ran.is_empty() {
            return report;
        }

        if ran.contains(SettleTasks::ANNOTATE) {
            report.request = self.requester.begin(renderer, &self.seen, self.caps.flags);
        }
        if ran.contains(SettleTasks::INDICATOR) {
            report.thumb_top = self
                .model
                .filter(IndicatorModel::is_visible)
                .map(|m| m.thumb_top(self.scroll_offset));
        }
        let visible = visible_range(renderer);
        if ran.contains(SettleTasks::TOC) {
            report.toc = visible.map(|v| self.toc.on_scroll_settled(v.first(), v.last(), panel));
        }
        if ran.contains(SettleTasks::BOOKMARK)
            && let Some(v) = visible
        {
            self.bookmark.observe(v.first());
            report.bookmark = Some(self.bookmark.state());
        }
        debug!(
            target: "docview_core::session",
            ran = ?ran,
            request = report.request.as_ref().map(|r| r.id.0),
            "settle tick"
        );
        report
    }

    /// Feed back the outcome of a request returned by `load_document` or
    /// `tick`.
    pub fn complete_annotation<R: Renderer + ?Sized>(
        &mut self,
        id: RequestId,
        outcome: Result<Vec<LinkSpan>, ClassifyError>,
        renderer: &mut R,
    ) -> CompletionReport {
        self.requester.complete(
            id,
            outcome,
            renderer,
            &mut self.seen,
            MentionContext {
                resolver: self.resolver,
                names: &self.names,
                mentions: &mut self.mentions,
            },
        )
    }

    // --- user actions --------------------------------------------------------

    /// Highlight the heading that governs a clicked line.
    pub fn on_text_click(&mut self, line: usize, panel: &mut dyn TocPanel) -> TocSlot {
        self.toc.on_text_click(line, panel)
    }

    /// Swap bookmark slots and scroll to the new proximal line.
    pub fn toggle_bookmark<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        panel: &mut dyn TocPanel,
    ) -> usize {
        let line = self.bookmark.toggle();
        renderer.scroll_to_line(line);
        self.toc.on_text_click(line, panel);
        info!(target: "docview_core::session", line, "bookmark toggled");
        line
    }

    /// Target line of a heading mention placed earlier. `call_form` is true
    /// when the clicked token is immediately followed by `(`.
    #[must_use]
    pub fn mention_target(&self, token: &str, call_form: bool) -> Option<usize> {
        self.mentions.target(token, call_form)
    }

    /// Jump to the heading a mention names.
    pub fn follow_mention<R: Renderer + ?Sized>(
        &mut self,
        token: &str,
        call_form: bool,
        renderer: &mut R,
        panel: &mut dyn TocPanel,
    ) -> Option<usize> {
        let line = self.mentions.target(token, call_form)?;
        renderer.scroll_to_line(line);
        self.toc.on_text_click(line, panel);
        debug!(
            target: "docview_core::session",
            token,
            call_form,
            line,
            "followed heading mention"
        );
        Some(line)
    }

    /// A new TOC panel replaced the old one: light the current slot on it.
    pub fn rebind_toc_panel(&mut self, panel: &mut dyn TocPanel) {
        let current = self.toc.current();
        self.toc.reset_highlight();
        if let Some(slot) = current {
            self.toc.update_highlight(slot, panel);
        }
    }

    /// Drop the bookkeeping for a request whose outcome will never arrive.
    /// Its range becomes requestable again.
    pub fn abandon_annotation(&mut self, id: RequestId) -> bool {
        self.requester.abandon(id)
    }
}
