#![forbid(unsafe_code)]

//! Trailing debounce driven by a host clock.
//!
//! The engine never reads a clock. Hosts pass a monotonic `now` (the web
//! crate forwards `performance.now()`), which keeps scheduling deterministic
//! and testable without timers.
//!
//! A [`TrailingDebounce`] fires once after `delay` has elapsed with no
//! further [`poke`](TrailingDebounce::poke). [`SettleScheduler`] holds one
//! per scroll-driven task so each task can use its own quiet period.
//!
//! ```
//! use std::time::Duration;
//! use docview_core::debounce::TrailingDebounce;
//!
//! let mut d = TrailingDebounce::new(Duration::from_millis(100));
//! d.poke(Duration::from_millis(0));
//! d.poke(Duration::from_millis(60));
//! assert!(!d.fire_if_due(Duration::from_millis(120)));
//! assert!(d.fire_if_due(Duration::from_millis(160)));
//! assert!(!d.fire_if_due(Duration::from_millis(500)));
//! ```

use std::time::Duration;

use bitflags::bitflags;

use crate::config::EngineConfig;

/// Fires once per quiet period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingDebounce {
    delay: Duration,
    deadline: Option<Duration>,
}

impl TrailingDebounce {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the quiet period at `now`.
    pub fn poke(&mut self, now: Duration) {
        self.deadline = Some(now.saturating_add(self.delay));
    }

    /// Returns `true` exactly once when the quiet period has elapsed.
    pub fn fire_if_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

bitflags! {
    /// Scroll-driven work items.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SettleTasks: u8 {
        const ANNOTATE = 1 << 0;
        const INDICATOR = 1 << 1;
        const TOC = 1 << 2;
        const BOOKMARK = 1 << 3;
    }
}

/// One debounce per scroll-driven task.
#[derive(Debug, Clone)]
pub struct SettleScheduler {
    annotate: TrailingDebounce,
    indicator: TrailingDebounce,
    toc: TrailingDebounce,
    bookmark: TrailingDebounce,
}

impl SettleScheduler {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            annotate: TrailingDebounce::new(config.annotate_debounce()),
            indicator: TrailingDebounce::new(config.indicator_debounce()),
            toc: TrailingDebounce::new(config.toc_debounce()),
            bookmark: TrailingDebounce::new(config.bookmark_debounce()),
        }
    }

    fn slots_mut(&mut self) -> [(SettleTasks, &mut TrailingDebounce); 4] {
        [
            (SettleTasks::ANNOTATE, &mut self.annotate),
            (SettleTasks::INDICATOR, &mut self.indicator),
            (SettleTasks::TOC, &mut self.toc),
            (SettleTasks::BOOKMARK, &mut self.bookmark),
        ]
    }

    /// Restart the quiet period of every task in `tasks`.
    pub fn poke(&mut self, tasks: SettleTasks, now: Duration) {
        for (task, debounce) in self.slots_mut() {
            if tasks.contains(task) {
                debounce.poke(now);
            }
        }
    }

    /// Tasks whose quiet period has elapsed; each is reported once.
    pub fn drain_due(&mut self, now: Duration) -> SettleTasks {
        let mut due = SettleTasks::empty();
        for (task, debounce) in self.slots_mut() {
            if debounce.fire_if_due(now) {
                due |= task;
            }
        }
        due
    }

    pub fn cancel(&mut self, tasks: SettleTasks) {
        for (task, debounce) in self.slots_mut() {
            if tasks.contains(task) {
                debounce.cancel();
            }
        }
    }

    /// Tasks still waiting for their quiet period.
    #[must_use]
    pub fn pending(&self) -> SettleTasks {
        let mut pending = SettleTasks::empty();
        for (task, debounce) in [
            (SettleTasks::ANNOTATE, &self.annotate),
            (SettleTasks::INDICATOR, &self.indicator),
            (SettleTasks::TOC, &self.toc),
            (SettleTasks::BOOKMARK, &self.bookmark),
        ] {
            if debounce.is_pending() {
                pending |= task;
            }
        }
        pending
    }

    /// Earliest pending deadline, for hosts that schedule a single timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        [self.annotate, self.indicator, self.toc, self.bookmark]
            .iter()
            .filter_map(TrailingDebounce::deadline)
            .min()
    }
}
