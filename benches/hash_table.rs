use criterion::{criterion_group, criterion_main, Bencher, BenchmarkId, Criterion, Throughput};
use itertools::Itertools;
use once_cell::sync::Lazy;
use rand::Rng;

use elastic_hash_table::{ElasticHashParams, ElasticHashTable};

const MAX_LOADS: [f64; 3] = [0.5, 0.75, 0.90];
const CAPACITIES: [usize; 3] = [512, 4_096, 65_536];
const TOTAL_KEYS: u32 = 10_000;
const TOTAL_OPERATIONS: usize = 1_000;

static RANDOM_KEYS: Lazy<Vec<[u8; 4]>> = Lazy::new(|| {
    let mut rng = rand::thread_rng();
    (0..TOTAL_OPERATIONS)
        .map(|_| rng.gen_range(0, TOTAL_KEYS).to_le_bytes())
        .collect()
});

fn populated_table(capacity: usize, max_load: f64) -> ElasticHashTable {
    let params = ElasticHashParams {
        max_load,
        ..ElasticHashParams::default()
    };
    let mut table = ElasticHashTable::with_params(capacity, params).unwrap();
    for i in 0..TOTAL_KEYS {
        table.insert(&i.to_le_bytes(), b"benchmark-value").unwrap();
    }
    table
}

fn insert(b: &mut Bencher, capacity: usize, max_load: f64) {
    let params = ElasticHashParams {
        max_load,
        ..ElasticHashParams::default()
    };
    b.iter_batched(
        || ElasticHashTable::with_params(capacity, params).unwrap(),
        |mut table| {
            for key in RANDOM_KEYS.iter() {
                table.insert(key, b"v").unwrap();
            }
        },
        criterion::BatchSize::LargeInput,
    );
}

fn random_get(b: &mut Bencher, capacity: usize, max_load: f64) {
    let table = populated_table(capacity, max_load);
    b.iter(|| {
        for key in RANDOM_KEYS.iter() {
            assert!(table.get(key).is_some());
        }
    });
}

fn random_delete_reinsert(b: &mut Bencher, capacity: usize, max_load: f64) {
    b.iter_batched(
        || populated_table(capacity, max_load),
        |mut table| {
            for key in RANDOM_KEYS.iter() {
                table.remove(key);
                table.insert(key, b"v").unwrap();
            }
        },
        criterion::BatchSize::LargeInput,
    );
}

fn rebuild_by_doubling(b: &mut Bencher) {
    b.iter_batched(
        || {
            let mut table = ElasticHashTable::new(64).unwrap();
            for i in 0..63u32 {
                table.insert(&i.to_le_bytes(), b"v").unwrap();
            }
            table
        },
        |mut table| {
            // Crosses the default 0.90 load threshold and forces a
            // doubling rebuild.
            table.insert(b"trigger-growth", b"v").unwrap();
        },
        criterion::BatchSize::SmallInput,
    );
}

fn hash_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("elastic_hash_table");
    group.throughput(Throughput::Elements(TOTAL_OPERATIONS as u64));

    for (capacity, max_load) in CAPACITIES.iter().cartesian_product(MAX_LOADS.iter()) {
        let description = format!("capacity={capacity}, max_load={max_load}");

        group.bench_with_input(
            BenchmarkId::new("insert", description.clone()),
            &(*capacity, *max_load),
            |b, &(capacity, max_load)| insert(b, capacity, max_load),
        );
        group.bench_with_input(
            BenchmarkId::new("random_get", description.clone()),
            &(*capacity, *max_load),
            |b, &(capacity, max_load)| random_get(b, capacity, max_load),
        );
        group.bench_with_input(
            BenchmarkId::new("random_delete_reinsert", description.clone()),
            &(*capacity, *max_load),
            |b, &(capacity, max_load)| random_delete_reinsert(b, capacity, max_load),
        );
    }

    group.bench_function("rebuild_by_doubling", rebuild_by_doubling);
    group.finish();
}

criterion_group!(benches, hash_table);
criterion_main!(benches);
