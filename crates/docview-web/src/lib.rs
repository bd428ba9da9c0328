#![forbid(unsafe_code)]

//! Browser frontend for the docview engine.
//!
//! This crate provides [`DocViewWeb`], a `wasm-bindgen`-exported struct that
//! owns a `docview_core::ViewerSession` and binds it to:
//!
//! - a JS renderer object (`visibleTopLine`, `textForLineRange`,
//!   `placeMarker`, `scrollToLine`, ...);
//! - TOC panel elements whose highlight class it toggles;
//! - an overlay scroll thumb positioned from the text element's metrics;
//! - a `fetch`-based classification endpoint.
//!
//! Time is host-driven: every event takes `performance.now()` and the host
//! calls `tick` at the deadline `tick` returns.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{DocViewWeb, init_logging};

pub mod logging;
pub mod viewer_core;
