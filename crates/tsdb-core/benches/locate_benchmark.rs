//! Benchmark suite for `Table::locate`.
//!
//! Run with: `cargo bench -p tsdb-core --bench locate_benchmark`

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
        table.append(i * 3, i as f64);
    }
    table
}

fn bench_locate_in_middle(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let rows = 1_000_000u64;
    let table = populated_table(&dir, rows);
    let query = (rows / 2) * 3;

    c.bench_function("locate_1m_rows_midpoint", |b| {
        b.iter(|| black_box(table.locate(black_box(query))));
    });
}

fn bench_locate_at_clamped_ends(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let rows = 1_000_000u64;
    let table = populated_table(&dir, rows);

    c.bench_function("locate_1m_rows_below_first", |b| {
        b.iter(|| black_box(table.locate(black_box(0))));
    });

    c.bench_function("locate_1m_rows_above_last", |b| {
        b.iter(|| black_box(table.locate(black_box(u64::MAX))));
    });
}

criterion_group!(benches, bench_locate_in_middle, bench_locate_at_clamped_ends);
criterion_main!(benches);
