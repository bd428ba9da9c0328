#![forbid(unsafe_code)]

//! Core engine for a lazily annotated document viewer.
//!
//! # Role in docview
//! `docview-core` holds every piece of viewer logic that does not depend on a
//! browser: which lines are on screen, which of them still need links, where
//! heading mentions may be placed, which TOC entry is current, where the
//! overlay scroll thumb sits, and the two-slot jump-back bookmark.
//!
//! # Primary responsibilities
//! - **Viewport + seen cache**: visible range and two-ended trimming of lines
//!   already sent for classification.
//! - **Annotation**: split-phase requests to a classification backend, marker
//!   placement, and heading mentions that never overlap backend links.
//! - **TOC sync**: binary-searched lookups over a structured heading list.
//! - **Indicator**: overlay scrollbar geometry per pointer kind.
//! - **Bookmark**: drift/jump hysteresis with toggle.
//!
//! # How it fits in the system
//! Hosts implement [`renderer::Renderer`] and [`renderer::TocPanel`], own a
//! [`session::ViewerSession`], forward raw events with a host clock, and send
//! the [`annotation::ClassifyRequest`]s it hands back. `docview-web` is the
//! browser host.

pub mod annotate;
pub mod annotation;
pub mod bookmark;
pub mod caps;
pub mod config;
pub mod debounce;
pub mod error;
pub mod indicator;
pub mod overlap;
pub mod range;
pub mod renderer;
pub mod seen;
pub mod session;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod toc;
pub mod viewport;

pub use annotate::CompletionReport;
pub use annotation::{
    Annotation, AnnotationCategory, ClassifyRequest, LinkSpan, RequestId,
    decode_classify_response,
};
pub use caps::{Capabilities, ClientFlags, PointerKind};
pub use config::EngineConfig;
pub use error::{ClassifyError, ConfigError};
pub use indicator::{IndicatorModel, ScrollbarMetrics};
pub use overlap::SourceDialect;
pub use range::LineRange;
pub use renderer::{Marker, NoTocPanel, Renderer, TocPanel};
pub use session::{SettleReport, ViewerSession};
pub use toc::{TocEntryInput, TocSlot};
