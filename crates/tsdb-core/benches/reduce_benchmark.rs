//! Benchmark suite for `Table::reduce`.
//!
//! Run with: `cargo bench -p tsdb-core --bench reduce_benchmark`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tsdb_core::{FmvOptions, Table};

fn opts() -> FmvOptions {
    FmvOptions {
        reservation_bytes: 1 << 33,
        initial_elements: 1024,
        growth_factor: 2,
        file_mode: 0o644,
    }
}

fn populated_table(dir: &tempfile::TempDir, rows: u64) -> Table<f64> {
    let mut table = Table::<f64>::open(dir.path().join("bench"), opts());
    for i in 0..rows {
        table.append(i, i as f64);
    }
    table
}

fn bench_reduce_full_range_light_thinning(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let rows = 1_000_000u64;
    let table = populated_table(&dir, rows);

    c.bench_function("reduce_1m_rows_dt_10", |b| {
        b.iter(|| black_box(table.reduce(black_box(0), black_box(rows - 1), black_box(10))));
    });
}

fn bench_reduce_full_range_heavy_thinning(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let rows = 1_000_000u64;
    let table = populated_table(&dir, rows);

    c.bench_function("reduce_1m_rows_dt_10000", |b| {
        b.iter(|| black_box(table.reduce(black_box(0), black_box(rows - 1), black_box(10_000))));
    });
}

criterion_group!(
    benches,
    bench_reduce_full_range_light_thinning,
    bench_reduce_full_range_heavy_thinning
);
criterion_main!(benches);
