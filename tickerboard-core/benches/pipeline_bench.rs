//! Criterion benchmarks for the pipeline stages.
//!
//! Benchmarks:
//! 1. Loader normalisation through the in-memory provider
//! 2. Wide → long reshape
//! 3. Per-symbol summary

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tickerboard_core::data::{load, InMemoryProvider, WideTable};
use tickerboard_core::domain::{DateRange, Symbol};
use tickerboard_core::{summarize, to_long};

// ── Helpers ──────────────────────────────────────────────────────────

const SYMBOLS: [&str; 6] = ["AAPL", "MSFT", "NVDA", "META", "TSLA", "GOOGL"];

fn base_date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
}

fn make_provider(days: usize) -> InMemoryProvider {
    SYMBOLS.iter().enumerate().fold(InMemoryProvider::new(), |p, (k, s)| {
        let rows = (0..days).map(move |i| {
            let close = 100.0 + k as f64 * 10.0 + (i as f64 * 0.1).sin() * 10.0;
            let volume = 1_000_000.0 + (i % 500) as f64 * 1_000.0;
            (base_date() + chrono::Duration::days(i as i64), Some(close), Some(volume))
        });
        p.with_series(Symbol::new(s).unwrap(), rows)
    })
}

fn symbols() -> Vec<Symbol> {
    SYMBOLS.iter().map(|s| Symbol::new(s).unwrap()).collect()
}

fn range(days: usize) -> DateRange {
    DateRange::new(base_date(), base_date() + chrono::Duration::days(days as i64 + 1)).unwrap()
}

fn make_table(days: usize) -> WideTable {
    load(&make_provider(days), &symbols(), range(days)).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    for &days in &[30, 365, 1825] {
        let provider = make_provider(days);
        let symbols = symbols();
        group.bench_with_input(BenchmarkId::new("six_symbols", days), &days, |b, &days| {
            b.iter(|| load(black_box(&provider), black_box(&symbols), range(days)))
        });
    }
    group.finish();
}

fn bench_reshape(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_long");
    for &days in &[30, 365, 1825] {
        let table = make_table(days);
        group.bench_with_input(BenchmarkId::new("six_symbols", days), &table, |b, table| {
            b.iter(|| to_long(black_box(table)))
        });
    }
    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    for &days in &[30, 365, 1825] {
        let rows = to_long(&make_table(days));
        group.bench_with_input(BenchmarkId::new("six_symbols", days), &rows, |b, rows| {
            b.iter(|| summarize(black_box(rows)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_load, bench_reshape, bench_summarize);
criterion_main!(benches);
