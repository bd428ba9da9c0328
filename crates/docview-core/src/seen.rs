#![forbid(unsafe_code)]

//! Memo of lines already submitted for annotation.
//!
//! Lines are stored as disjoint, non-adjacent inclusive intervals keyed by
//! their start line, so erratic scrolling (jump to the end, then back to the
//! middle) is represented exactly instead of assuming a contiguous prefix.
//!
//! [`SeenLineCache::filter_unseen`] trims a range from both ends while its
//! edge lines are seen, the same way whitespace is trimmed from a string.
//! Both walks are interval lookups, so trimming costs O(log n) regardless of
//! how many lines are skipped.

use std::collections::BTreeMap;

use tracing::trace;

use crate::range::LineRange;

/// Set of seen line numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenLineCache {
    /// start -> end (inclusive). Intervals never overlap or touch.
    intervals: BTreeMap<usize, usize>,
    lines: usize,
}

impl SeenLineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval containing `line`, if any.
    fn interval_of(&self, line: usize) -> Option<(usize, usize)> {
        let (&start, &end) = self.intervals.range(..=line).next_back()?;
        (line <= end).then_some((start, end))
    }

    #[must_use]
    pub fn is_seen(&self, line: usize) -> bool {
        self.interval_of(line).is_some()
    }

    /// Trim seen lines off both ends of `range`.
    ///
    /// Returns the remaining sub-range, whose first and last lines are both
    /// unseen, or `None` when every line in `range` is already seen.
    #[must_use]
    pub fn filter_unseen(&self, range: LineRange) -> Option<LineRange> {
        let first = match self.interval_of(range.first()) {
            Some((_, end)) => end.checked_add(1)?,
            None => range.first(),
        };
        let last = match self.interval_of(range.last()) {
            Some((start, _)) => start.checked_sub(1)?,
            None => range.last(),
        };
        if first > range.last() || last < range.first() {
            return None;
        }
        let trimmed = LineRange::new(first, last)?;
        if trimmed != range {
            trace!(
                target: "docview_core::seen",
                requested = %range,
                trimmed = %trimmed,
                "trimmed seen lines"
            );
        }
        Some(trimmed)
    }

    /// Record every line of `range` as seen.
    pub fn mark_seen(&mut self, range: LineRange) {
        let mut start = range.first();
        let mut end = range.last();

        // Absorb an interval that starts before and overlaps or touches us.
        if let Some((&prev_start, &prev_end)) = self.intervals.range(..=start).next_back()
            && prev_end.saturating_add(1) >= start
        {
            start = prev_start;
            end = end.max(prev_end);
        }

        // Absorb every interval starting inside or right after us.
        let absorbed: Vec<(usize, usize)> = self
            .intervals
            .range(start..=end.saturating_add(1))
            .map(|(&s, &e)| (s, e))
            .collect();
        for (s, e) in absorbed {
            self.intervals.remove(&s);
            self.lines -= e - s + 1;
            end = end.max(e);
        }

        self.intervals.insert(start, end);
        self.lines += end - start + 1;
    }

    /// Forget everything (document text replaced or edited).
    pub fn clear(&mut self) {
        self.intervals.clear();
        self.lines = 0;
    }

    /// Total number of seen lines.
    #[must_use]
    pub fn seen_line_count(&self) -> usize {
        self.lines
    }

    /// Number of disjoint seen intervals.
    #[must_use]
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Seen intervals in ascending order.
    pub fn intervals(&self) -> impl Iterator<Item = LineRange> + '_ {
        self.intervals
            .iter()
            .filter_map(|(&s, &e)| LineRange::new(s, e))
    }

    /// Maximal unseen runs inside `range`, in ascending order.
    #[must_use]
    pub fn unseen_runs(&self, range: LineRange) -> Vec<LineRange> {
        let mut runs = Vec::new();
        let mut cursor = range.first();
        let lookup_from = self
            .interval_of(range.first())
            .map_or(range.first(), |(s, _)| s);
        for (&s, &e) in self.intervals.range(lookup_from..=range.last()) {
            if s > cursor
                && let Some(run) = LineRange::new(cursor, (s - 1).min(range.last()))
            {
                runs.push(run);
            }
            cursor = cursor.max(e.saturating_add(1));
            if cursor > range.last() {
                return runs;
            }
        }
        if let Some(run) = LineRange::new(cursor, range.last()) {
            runs.push(run);
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(a: usize, b: usize) -> LineRange {
        LineRange::new(a, b).expect("valid range")
    }

    #[test]
    fn empty_cache_returns_whole_range() {
        let cache = SeenLineCache::new();
        assert_eq!(cache.filter_unseen(r(1, 40)), Some(r(1, 40)));
    }

    #[test]
    fn trims_seen_prefix() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(1, 40));
        assert_eq!(cache.seen_line_count(), 40);
        assert_eq!(cache.filter_unseen(r(30, 70)), Some(r(41, 70)));
    }

    #[test]
    fn trims_seen_suffix() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(60, 100));
        assert_eq!(cache.filter_unseen(r(30, 70)), Some(r(30, 59)));
    }

    #[test]
    fn fully_seen_range_is_none() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(1, 40));
        assert_eq!(cache.filter_unseen(r(5, 35)), None);
        assert_eq!(cache.filter_unseen(r(1, 40)), None);
    }

    #[test]
    fn both_ends_seen_with_unseen_middle() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(1, 10));
        cache.mark_seen(r(21, 30));
        assert_eq!(cache.filter_unseen(r(5, 25)), Some(r(11, 20)));
    }

    #[test]
    fn interior_seen_lines_are_kept() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(15, 16));
        assert_eq!(cache.filter_unseen(r(10, 20)), Some(r(10, 20)));
        assert_eq!(cache.unseen_runs(r(10, 20)), vec![r(10, 14), r(17, 20)]);
    }

    #[test]
    fn adjacent_ranges_merge() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(1, 10));
        cache.mark_seen(r(11, 20));
        assert_eq!(cache.interval_count(), 1);
        assert_eq!(cache.seen_line_count(), 20);

        cache.mark_seen(r(30, 40));
        cache.mark_seen(r(5, 35));
        assert_eq!(cache.intervals().collect::<Vec<_>>(), vec![r(1, 40)]);
        assert_eq!(cache.seen_line_count(), 40);
    }

    #[test]
    fn re_marking_is_idempotent() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(5, 9));
        cache.mark_seen(r(5, 9));
        cache.mark_seen(r(6, 7));
        assert_eq!(cache.seen_line_count(), 5);
        assert_eq!(cache.interval_count(), 1);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(1, 100));
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.is_seen(50));
        assert_eq!(cache.filter_unseen(r(1, 40)), Some(r(1, 40)));
    }

    #[test]
    fn unseen_runs_of_fully_seen_range_is_empty() {
        let mut cache = SeenLineCache::new();
        cache.mark_seen(r(1, 50));
        assert!(cache.unseen_runs(r(10, 20)).is_empty());
        assert_eq!(cache.unseen_runs(r(45, 60)), vec![r(51, 60)]);
    }
}
