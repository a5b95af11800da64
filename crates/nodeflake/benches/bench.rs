use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use nodeflake::{GeneratorConfig, IdGenerator, NodeIdentity, SystemClock, TimeSource};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

struct FixedMockTime {
    millis: i64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> i64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

fn generator<T: TimeSource>(time: T) -> IdGenerator<T> {
    IdGenerator::new(GeneratorConfig::default(), NodeIdentity::fixed(1, 1), time)
        .expect("valid generator")
}

/// Hot path: one sequence's worth of IDs within a single fixed millisecond,
/// so the generator never spins.
fn bench_fixed_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock/fixed");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for i in 0..iters {
                // A fresh millisecond per iteration keeps the sequence from
                // wrapping.
                let generator = generator(FixedMockTime {
                    millis: 1_700_000_000_000 + i as i64,
                });
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id().expect("id"));
                }
            }
            start.elapsed()
        });
    });

    group.finish();
}

/// Realistic wall clock, including spins on sequence exhaustion.
fn bench_system_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock/system");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let generator = generator(SystemClock);
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(generator.next_id().expect("id"));
            }
        });
    });

    group.finish();
}

/// All cores contending for the one lock.
fn bench_contended(c: &mut Criterion) {
    let threads = num_cpus::get();
    let mut group = c.benchmark_group(format!("lock/contended/threads/{threads}"));
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    let generator = Arc::new(generator(SystemClock));
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let barrier = Arc::new(Barrier::new(threads + 1));
            let start = scope(|s| {
                for _ in 0..threads {
                    let generator = Arc::clone(&generator);
                    let barrier = Arc::clone(&barrier);
                    s.spawn(move || {
                        barrier.wait();
                        for _ in 0..iters {
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.next_id().expect("id"));
                            }
                        }
                    });
                }
                barrier.wait();
                Instant::now()
            });
            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_fixed_clock, bench_system_clock, bench_contended);
criterion_main!(benches);
