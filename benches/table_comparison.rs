use core::hash::Hash;
use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use hashbrown::HashMap as HashbrownMap;
use opal_hash::FrozenTable;
use opal_hash::HashTable;
use opal_hash::Key;
use opal_hash::LinkedHashTable;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

trait BenchKey: Key + Hash + Eq + Copy {
    fn from_u64(key: u64) -> Self;
}

impl BenchKey for u64 {
    fn from_u64(key: u64) -> Self {
        key
    }
}

impl BenchKey for u32 {
    fn from_u64(key: u64) -> Self {
        key as u32
    }
}

impl BenchKey for i64 {
    fn from_u64(key: u64) -> Self {
        key as i64
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
    (1 << 20),
];

fn random_keys<K: BenchKey>(count: usize) -> Vec<K> {
    let mut rng = OsRng;
    let mut seen = HashbrownMap::with_capacity(count);
    let mut keys = Vec::with_capacity(count);
    while keys.len() < count {
        let key = K::from_u64(rng.try_next_u64().unwrap_or(keys.len() as u64));
        if seen.insert(key, ()).is_none() {
            keys.push(key);
        }
    }
    keys
}

fn bench_insert_random<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("insert_random_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_function(format!("opal_hash/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut table = HashTable::<K, u64>::with_capacity(0);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, i as u64));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("opal_hash_linked/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut table = LinkedHashTable::<K, u64>::with_capacity(0);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, i as u64));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut table = HashbrownMap::<K, u64>::with_capacity(0);
                    for (i, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, i as u64));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit_miss<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_hit_miss_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size * 2);
        let (present, absent) = keys.split_at(*size);
        let mut probes: Vec<K> = present.iter().chain(absent.iter()).copied().collect();
        probes.shuffle(&mut SmallRng::seed_from_u64(*size as u64));

        let opal: HashTable<K, u64> = present.iter().map(|k| (*k, 1)).collect();
        let frozen: FrozenTable<K, u64> = present.iter().map(|k| (*k, 1)).collect();
        let hashbrown: HashbrownMap<K, u64> = present.iter().map(|k| (*k, 1)).collect();

        group.throughput(Throughput::Elements(probes.len() as u64));
        group.bench_function(format!("opal_hash/{size}"), |b| {
            b.iter(|| {
                let mut hits = 0u64;
                for key in &probes {
                    hits += opal.get(key).copied().unwrap_or(0);
                }
                black_box(hits)
            })
        });

        group.bench_function(format!("opal_hash_frozen/{size}"), |b| {
            b.iter(|| {
                let mut hits = 0u64;
                for key in &probes {
                    hits += frozen.get(key).copied().unwrap_or(0);
                }
                black_box(hits)
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                let mut hits = 0u64;
                for key in &probes {
                    hits += hashbrown.get(key).copied().unwrap_or(0);
                }
                black_box(hits)
            })
        });
    }

    group.finish();
}

fn bench_remove<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("remove_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);
        let mut order = keys.clone();
        order.shuffle(&mut SmallRng::seed_from_u64(*size as u64));

        let opal: HashTable<K, u64> = keys.iter().map(|k| (*k, 1)).collect();
        let linked: LinkedHashTable<K, u64> = keys.iter().map(|k| (*k, 1)).collect();
        let hashbrown: HashbrownMap<K, u64> = keys.iter().map(|k| (*k, 1)).collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("opal_hash/{size}"), |b| {
            b.iter_batched(
                || opal.clone(),
                |mut table| {
                    for key in &order {
                        black_box(table.remove(key));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("opal_hash_linked/{size}"), |b| {
            b.iter_batched(
                || linked.clone(),
                |mut table| {
                    for key in &order {
                        black_box(table.remove(key));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || hashbrown.clone(),
                |mut table| {
                    for key in &order {
                        black_box(table.remove(key));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_iteration<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("iteration_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(*size);
        let opal: HashTable<K, u64> = keys.iter().map(|k| (*k, 1)).collect();
        let linked: LinkedHashTable<K, u64> = keys.iter().map(|k| (*k, 1)).collect();
        let hashbrown: HashbrownMap<K, u64> = keys.iter().map(|k| (*k, 1)).collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("opal_hash/{size}"), |b| {
            b.iter(|| black_box(opal.values().sum::<u64>()))
        });
        group.bench_function(format!("opal_hash_linked/{size}"), |b| {
            b.iter(|| black_box(linked.values().sum::<u64>()))
        });
        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| black_box(hashbrown.values().sum::<u64>()))
        });
    }

    group.finish();
}

fn bench_churn<K: BenchKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("churn_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES[..=MAX_SIZE].iter() {
        let pool = random_keys::<K>(*size * 2);
        let mut rng = SmallRng::seed_from_u64(*size as u64);
        let operations: Vec<(bool, K)> = (0..*size * 4)
            .map(|_| (rng.random_bool(0.5), pool[rng.random_range(0..pool.len())]))
            .collect();

        group.throughput(Throughput::Elements(operations.len() as u64));
        group.bench_function(format!("opal_hash/{size}"), |b| {
            b.iter(|| {
                let mut table = HashTable::<K, u64>::with_capacity(*size);
                for (insert, key) in &operations {
                    if *insert {
                        black_box(table.insert(*key, 1));
                    } else {
                        black_box(table.remove(key));
                    }
                }
                black_box(table)
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                let mut table = HashbrownMap::<K, u64>::with_capacity(*size);
                for (insert, key) in &operations {
                    if *insert {
                        black_box(table.insert(*key, 1));
                    } else {
                        black_box(table.remove(key));
                    }
                }
                black_box(table)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<u64, 5>,
    bench_insert_random::<u32, 5>,
    bench_insert_random::<i64, 3>,
    bench_find_hit_miss::<u64, 5>,
    bench_find_hit_miss::<u32, 5>,
    bench_find_hit_miss::<i64, 3>,
    bench_remove::<u64, 5>,
    bench_remove::<u32, 5>,
    bench_iteration::<u64, 5>,
    bench_iteration::<u32, 5>,
    bench_churn::<u64, 5>,
    bench_churn::<u32, 5>,
);

criterion_main!(benches);
