//! Benchmark: hot paths run on every settled scroll.
//!
//! Run with: `cargo bench -p docview-core --bench engine_bench`
//!
//! Covers seen-cache trimming against a fragmented cache, TOC lookups over a
//! large heading list, heading-mention scanning of a long line, and response
//! decoding.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use docview_core::annotation::decode_classify_response;
use docview_core::overlap::{MentionIndex, OverlapResolver, SourceDialect};
use docview_core::range::LineRange;
use docview_core::seen::SeenLineCache;
use docview_core::toc::{HeadingNames, TocEntryInput, TocIndex};

fn fragmented_cache(intervals: usize) -> SeenLineCache {
    let mut cache = SeenLineCache::new();
    for i in 0..intervals {
        let start = i * 50 + 1;
        if let Some(r) = LineRange::new(start, start + 39) {
            cache.mark_seen(r);
        }
    }
    cache
}

fn bench_filter_unseen(c: &mut Criterion) {
    let mut group = c.benchmark_group("seen_filter_unseen");
    for intervals in [10usize, 1_000, 100_000] {
        let cache = fragmented_cache(intervals);
        let query = LineRange::new(intervals * 25, intervals * 25 + 60).unwrap_or(LineRange::single(1));
        group.bench_with_input(BenchmarkId::from_parameter(intervals), &query, |b, q| {
            b.iter(|| black_box(cache.filter_unseen(black_box(*q))));
        });
    }
    group.finish();
}

fn bench_mark_seen(c: &mut Criterion) {
    c.bench_function("seen_mark_seen_sequential_4k", |b| {
        b.iter(|| {
            let mut cache = SeenLineCache::new();
            for i in 0..100usize {
                if let Some(r) = LineRange::new(i * 40 + 1, i * 40 + 40) {
                    cache.mark_seen(r);
                }
            }
            black_box(cache.interval_count())
        });
    });
}

fn large_toc(n: usize) -> TocIndex {
    TocIndex::build(
        (0..n)
            .map(|i| TocEntryInput::new(format!("section_{i}"), i * 17 + 3))
            .collect(),
    )
}

fn bench_toc_lookup(c: &mut Criterion) {
    let index = large_toc(10_000);
    c.bench_function("toc_nearest_at_or_above_10k", |b| {
        b.iter(|| black_box(index.nearest_at_or_above(black_box(84_321))));
    });
    c.bench_function("toc_nearest_at_or_below_within_10k", |b| {
        b.iter(|| black_box(index.nearest_at_or_below_within(black_box(84_321), 84_380)));
    });
}

fn bench_mentions(c: &mut Criterion) {
    let index = large_toc(2_000);
    let names = HeadingNames::build(&index, |s| SourceDialect::Standard.is_token(s));
    let line: String = (0..200).map(|i| format!("section_{} word ", i * 7)).collect();
    let resolver = OverlapResolver::new(SourceDialect::Standard);
    c.bench_function("overlap_resolve_long_line", |b| {
        b.iter(|| {
            let mut mentions = MentionIndex::default();
            black_box(resolver.resolve_line(999_999, &line, &[], &names, &mut mentions))
        });
    });
}

fn bench_decode(c: &mut Criterion) {
    let body = format!(
        "[{}]",
        (0..500)
            .map(|i| format!(
                r#"{{"lineNumInText":{i},"columnInText":4,"length":12,"linkPath":"<a href='/f/{i}'>f</a>","linkType":"file"}}"#
            ))
            .collect::<Vec<_>>()
            .join(",")
    );
    c.bench_function("decode_classify_response_500", |b| {
        b.iter(|| black_box(decode_classify_response(black_box(&body))));
    });
}

criterion_group!(
    benches,
    bench_filter_unseen,
    bench_mark_seen,
    bench_toc_lookup,
    bench_mentions,
    bench_decode
);
criterion_main!(benches);
