//! Property-based invariant tests for the viewer engine.
//!
//! These hold for any input the generators produce:
//!
//! 1. `filter_unseen` agrees with a per-line walk from both ends.
//! 2. Trimmed ranges start and end on unseen lines and stay inside the input.
//! 3. Seen intervals are disjoint, non-adjacent, and count every marked line.
//! 4. Heading mentions never overlap a primary span or each other.
//! 5. Thumb top is monotone non-decreasing in the scroll offset.
//! 6. The thumb never shrinks below the configured minimum.
//! 7. Bookmark observe always moves proximal; distal moves only on a jump.
//! 8. TOC nearest-at-or-above agrees with a linear scan.

use std::collections::BTreeSet;

use docview_core::annotation::ColumnSpan;
use docview_core::bookmark::ToggleBookmark;
use docview_core::caps::{Capabilities, ClientFlags, PointerKind};
use docview_core::config::EngineConfig;
use docview_core::indicator::{ScrollIndicatorMapper, ScrollbarMetrics};
use docview_core::overlap::{MentionIndex, OverlapResolver, SourceDialect};
use docview_core::range::LineRange;
use docview_core::seen::SeenLineCache;
use docview_core::toc::{HeadingNames, TocEntryInput, TocIndex, TocSlot};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn line_range(max: usize) -> impl Strategy<Value = LineRange> {
    (1..=max, 0..40usize).prop_map(move |(first, len)| {
        let last = (first + len).min(max);
        LineRange::new(first, last).unwrap_or(LineRange::single(first))
    })
}

fn marked_ranges() -> impl Strategy<Value = Vec<LineRange>> {
    prop::collection::vec(line_range(300), 0..12)
}

fn pointer_kind() -> impl Strategy<Value = PointerKind> {
    prop_oneof![Just(PointerKind::Fine), Just(PointerKind::Touch)]
}

fn metrics() -> impl Strategy<Value = ScrollbarMetrics> {
    (
        0.0f64..40.0,
        0.0f64..40.0,
        100.0f64..1_200.0,
        0.0f64..200_000.0,
        0.0f64..300.0,
    )
        .prop_map(|(width_diff, height_diff, viewable, total, top)| ScrollbarMetrics {
            bounding_width: 900.0,
            bounding_height: viewable,
            client_width: 900.0 - width_diff,
            client_height: viewable - height_diff,
            viewable_height: viewable,
            total_scroll_height: total,
            viewport_top: top,
        })
}

const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta", "x", "run", "init"];
const SEPARATORS: &[&str] = &[" ", "(", ", ", ".", "  "];

fn line_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (prop::sample::select(WORDS), prop::sample::select(SEPARATORS)),
        0..12,
    )
    .prop_map(|parts| parts.into_iter().map(|(w, sep)| format!("{w}{sep}")).collect())
}

fn primary_spans() -> impl Strategy<Value = Vec<ColumnSpan>> {
    prop::collection::vec((0usize..80, 0usize..12), 0..4)
        .prop_map(|v| v.into_iter().map(|(s, len)| ColumnSpan::new(s, s + len)).collect())
}

// ── Models ────────────────────────────────────────────────────────────────

fn naive_filter(seen: &BTreeSet<usize>, range: LineRange) -> Option<LineRange> {
    let mut first = range.first();
    while first <= range.last() && seen.contains(&first) {
        first += 1;
    }
    let mut last = range.last();
    while last >= first && seen.contains(&last) {
        last -= 1;
    }
    LineRange::new(first, last).filter(|_| first <= range.last())
}

fn build(marked: &[LineRange]) -> (SeenLineCache, BTreeSet<usize>) {
    let mut cache = SeenLineCache::new();
    let mut model = BTreeSet::new();
    for r in marked {
        cache.mark_seen(*r);
        model.extend(r.iter());
    }
    (cache, model)
}

// ═══════════════════════════════════════════════════════════════════════════
// 1–2. Range trimming
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn filter_unseen_matches_per_line_walk(marked in marked_ranges(), query in line_range(300)) {
        let (cache, model) = build(&marked);
        prop_assert_eq!(cache.filter_unseen(query), naive_filter(&model, query));
    }

    #[test]
    fn trimmed_range_has_unseen_edges(marked in marked_ranges(), query in line_range(300)) {
        let (cache, _) = build(&marked);
        match cache.filter_unseen(query) {
            Some(t) => {
                prop_assert!(t.first() >= query.first() && t.last() <= query.last());
                prop_assert!(!cache.is_seen(t.first()));
                prop_assert!(!cache.is_seen(t.last()));
                for line in query.first()..t.first() {
                    prop_assert!(cache.is_seen(line));
                }
                for line in t.last() + 1..=query.last() {
                    prop_assert!(cache.is_seen(line));
                }
            }
            None => {
                for line in query.iter() {
                    prop_assert!(cache.is_seen(line), "line {} unseen but range filtered out", line);
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 3. Interval bookkeeping
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn intervals_are_disjoint_and_complete(marked in marked_ranges()) {
        let (cache, model) = build(&marked);
        prop_assert_eq!(cache.seen_line_count(), model.len());
        let intervals: Vec<_> = cache.intervals().collect();
        for pair in intervals.windows(2) {
            prop_assert!(
                pair[0].last() + 1 < pair[1].first(),
                "intervals {} and {} touch",
                pair[0],
                pair[1]
            );
        }
        let covered: usize = intervals.iter().map(|r| r.len()).sum();
        prop_assert_eq!(covered, model.len());
    }

    #[test]
    fn unseen_runs_partition_the_unseen_lines(marked in marked_ranges(), query in line_range(300)) {
        let (cache, model) = build(&marked);
        let from_runs: BTreeSet<usize> = cache
            .unseen_runs(query)
            .into_iter()
            .flat_map(LineRange::iter)
            .collect();
        let expected: BTreeSet<usize> = query.iter().filter(|l| !model.contains(l)).collect();
        prop_assert_eq!(from_runs, expected);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 4. Mention overlap
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mentions_are_disjoint_from_primaries(text in line_text(), primaries in primary_spans()) {
        let index = TocIndex::build(vec![
            TocEntryInput::new("alpha", 1),
            TocEntryInput::new("gamma", 2),
            TocEntryInput::new("run()", 3),
            TocEntryInput::new("x", 4),
        ]);
        let names = HeadingNames::build(&index, |s| SourceDialect::Standard.is_token(s));
        let mut mentions = MentionIndex::default();
        let found = OverlapResolver::new(SourceDialect::Standard)
            .resolve_line(100, &text, &primaries, &names, &mut mentions);

        for m in &found {
            let c = m.span();
            for p in &primaries {
                prop_assert!(c.end < p.start || c.start > p.end, "{:?} overlaps {:?}", c, p);
            }
        }
        for pair in found.windows(2) {
            prop_assert!(pair[0].column_end <= pair[1].column_start);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 5–6. Indicator geometry
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn thumb_top_is_monotone(
        pointer in pointer_kind(),
        m in metrics(),
        a in -500.0f64..200_000.0,
        b in -500.0f64..200_000.0,
    ) {
        let config = EngineConfig::default();
        let mapper = ScrollIndicatorMapper::new(&config, &Capabilities::new(pointer, ClientFlags::empty()));
        let model = mapper.compute(&m);
        prop_assert!(model.slope >= 0.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(model.thumb_top(lo) <= model.thumb_top(hi));
    }

    #[test]
    fn thumb_respects_minimum(pointer in pointer_kind(), m in metrics()) {
        let config = EngineConfig::default();
        let mapper = ScrollIndicatorMapper::new(&config, &Capabilities::new(pointer, ClientFlags::empty()));
        if let Some(thumb) = mapper.compute(&m).thumb_height {
            prop_assert!(thumb >= config.min_thumb_px);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 7. Bookmark hysteresis
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bookmark_drift_and_jump(
        visible in 0usize..80,
        moves in prop::collection::vec(1usize..2_000, 1..30),
    ) {
        let mut b = ToggleBookmark::new(1, 20);
        b.resize(visible);
        let threshold = b.threshold();
        prop_assert_eq!(threshold, 20usize.max(visible + 10));

        for line in moves {
            let before = b.state();
            b.observe(line);
            let after = b.state();
            prop_assert_eq!(after.proximal, line);
            if before.proximal.abs_diff(line) > threshold {
                prop_assert_eq!(after.distal, before.proximal);
            } else {
                prop_assert_eq!(after.distal, before.distal);
            }
        }

        let state = b.state();
        prop_assert_eq!(b.toggle(), state.distal);
        prop_assert_eq!(b.distal(), state.proximal);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 8. TOC lookup
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nearest_at_or_above_matches_scan(
        lines in prop::collection::vec(1usize..1_000, 0..20),
        query in 0usize..1_100,
    ) {
        let index = TocIndex::build(
            lines.iter().enumerate().map(|(i, l)| TocEntryInput::new(format!("h{i}"), *l)).collect(),
        );
        let got = index.nearest_at_or_above(query);
        let expected_line = lines
            .iter()
            .copied()
            .filter(|l| *l <= query)
            .max()
            .or_else(|| lines.iter().copied().min());
        match (got, expected_line) {
            (TocSlot::Top, None) => {}
            (TocSlot::Entry(_), Some(line)) => {
                let entry = index.entry_for_slot(got).expect("slot resolves to entry");
                prop_assert_eq!(entry.target_line, line);
            }
            other => prop_assert!(false, "mismatch: {:?}", other),
        }
    }

    #[test]
    fn nearest_within_prefers_visible_heading(
        lines in prop::collection::vec(1usize..1_000, 1..20),
        first in 1usize..1_000,
        span in 0usize..80,
    ) {
        let limit = first + span;
        let index = TocIndex::build(
            lines.iter().enumerate().map(|(i, l)| TocEntryInput::new(format!("h{i}"), *l)).collect(),
        );
        let got = index.nearest_at_or_below_within(first, limit);
        let entry = index.entry_for_slot(got).expect("non-empty index yields an entry");
        let visible = lines.iter().copied().filter(|l| *l >= first && *l <= limit).min();
        match visible {
            Some(line) => prop_assert_eq!(entry.target_line, line),
            None => {
                let fallback = lines
                    .iter()
                    .copied()
                    .filter(|l| *l <= limit)
                    .max()
                    .or_else(|| lines.iter().copied().min());
                prop_assert_eq!(Some(entry.target_line), fallback);
            }
        }
    }
}
