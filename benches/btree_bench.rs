use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;

use brambledb::{AccessMode, BTreeError, BTreeIndex, IndexCursor, Rid};

// Create a temporary index file for benchmarking
fn create_bench_index() -> BTreeIndex {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap().to_string();

    // Keep the temp file alive for the whole run
    std::mem::forget(temp_file);

    BTreeIndex::open(path, AccessMode::Write).unwrap()
}

fn btree_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("BTreeIndex");

    for size in [1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("insert", size), size, |b, &size| {
            let mut index = create_bench_index();

            let mut rng = rand::thread_rng();
            let keys: Vec<i32> = (0..size).map(|_| rng.gen_range(1..i32::MAX)).collect();
            let mut idx = 0;

            b.iter(|| {
                let key = keys[idx % keys.len()];
                index.insert(key, Rid::new(key, 0)).unwrap();
                idx += 1;
            });
        });

        group.bench_with_input(BenchmarkId::new("locate", size), size, |b, &size| {
            let mut index = create_bench_index();
            for key in 1..=size {
                index.insert(key, Rid::new(key, 0)).unwrap();
            }

            let mut rng = rand::thread_rng();
            b.iter(|| {
                let key = rng.gen_range(1..=size);
                let mut cursor = IndexCursor::default();
                index.locate(key, &mut cursor).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("scan", size), size, |b, &size| {
            let mut index = create_bench_index();
            for key in 1..=size {
                index.insert(key, Rid::new(key, 0)).unwrap();
            }

            b.iter(|| {
                let mut cursor = IndexCursor::default();
                let _ = index.locate(1, &mut cursor);
                let mut count = 0;
                loop {
                    match index.read_forward(&mut cursor) {
                        Ok(_) => count += 1,
                        Err(BTreeError::EndOfTree) => break,
                        Err(e) => panic!("scan failed: {e}"),
                    }
                }
                assert_eq!(count, size);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, btree_benchmark);
criterion_main!(benches);
