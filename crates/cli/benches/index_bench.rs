use config::SegmentConfig;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use index::{Index, Selector, ENTRY_WIDTH};
use tempfile::tempdir;

const N_ENTRIES: u64 = 10_000;

fn bench_config() -> SegmentConfig {
    SegmentConfig {
        max_index_bytes: N_ENTRIES * ENTRY_WIDTH,
        sync_writes: false,
    }
}

fn filled_index(path: &std::path::Path) -> Index {
    let mut idx = Index::open(path, &bench_config()).unwrap();
    for i in 0..N_ENTRIES {
        idx.write(i as u32, i * 100).unwrap();
    }
    idx
}

fn index_write_benchmark(c: &mut Criterion) {
    c.bench_function("index_write_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let idx = Index::open(dir.path().join("bench.index"), &bench_config()).unwrap();
                (dir, idx)
            },
            |(_dir, mut idx)| {
                for i in 0..N_ENTRIES {
                    idx.write(i as u32, i * 100).unwrap();
                }
                idx
            },
            BatchSize::SmallInput,
        );
    });
}

fn index_read_benchmark(c: &mut Criterion) {
    c.bench_function("index_read_nth_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let idx = filled_index(&dir.path().join("bench.index"));
                (dir, idx)
            },
            |(_dir, idx)| {
                for i in 0..N_ENTRIES {
                    let e = idx.read(Selector::Nth(i)).unwrap();
                    assert_eq!(e.position, i * 100);
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn index_read_last_benchmark(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let idx = filled_index(&dir.path().join("bench.index"));

    c.bench_function("index_read_last", |b| {
        b.iter(|| idx.read(Selector::Last).unwrap());
    });
}

fn index_close_benchmark(c: &mut Criterion) {
    c.bench_function("index_close_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let idx = filled_index(&dir.path().join("bench.index"));
                (dir, idx)
            },
            |(_dir, idx)| idx.close().unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    index_write_benchmark,
    index_read_benchmark,
    index_read_last_benchmark,
    index_close_benchmark
);
criterion_main!(benches);
