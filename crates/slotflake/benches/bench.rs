use core::hint::black_box;
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use slotflake::{
    AtomicSlotflakeGenerator, CoordinationStore, CoordinatorConfig, IdGenStatus, KeySpace,
    LockSlotflakeGenerator, MemoryStore, Slot, SlotCoordinator, SlotflakeGenerator, SystemClock,
    TimeSource, UNIX_EPOCH,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::{Duration, Instant},
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

const SLOT: Slot = Slot::new(1, 1);

fn mock_lock() -> LockSlotflakeGenerator<FixedMockTime> {
    LockSlotflakeGenerator::with_epoch(SLOT, UNIX_EPOCH, FixedMockTime { millis: 1 }).unwrap()
}

fn mock_atomic() -> AtomicSlotflakeGenerator<FixedMockTime> {
    AtomicSlotflakeGenerator::with_epoch(SLOT, UNIX_EPOCH, FixedMockTime { millis: 1 }).unwrap()
}

/// Benchmarks a hot-path generator where IDs are always `Ready`.
fn bench_generator<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: SlotflakeGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    match generator.try_poll_id() {
                        Ok(IdGenStatus::Ready { id }) => {
                            black_box(id);
                        }
                        _ => unreachable!(),
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks a generator on the wall clock, spinning through sequence
/// exhaustion.
fn bench_generator_spin<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: SlotflakeGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks a generator shared across threads, spinning on `Pending`.
fn bench_generator_contended<G>(c: &mut Criterion, group_name: &str, generator_fn: impl Fn() -> G)
where
    G: SlotflakeGenerator + Send + Sync,
{
    let mut group = c.benchmark_group(group_name);

    for thread_count in [1, 2, 4, 8, 16] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(
            format!("elems/{}/threads/{}", TOTAL_IDS, thread_count),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let generator = Arc::new(generator_fn());
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let generator = Arc::clone(&generator);
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        loop {
                                            match generator.try_poll_id() {
                                                Ok(IdGenStatus::Ready { id }) => {
                                                    black_box(id);
                                                    break;
                                                }
                                                Ok(IdGenStatus::Pending { .. }) => {
                                                    core::hint::spin_loop()
                                                }
                                                Err(e) => panic!("{e}"),
                                            }
                                        }
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

// --- MOCK CLOCK (fixed, non-advancing time) ---

fn benchmark_mock_sequential_lock(c: &mut Criterion) {
    bench_generator(c, "mock/sequential/lock", mock_lock);
}

fn benchmark_mock_sequential_atomic(c: &mut Criterion) {
    bench_generator(c, "mock/sequential/atomic", mock_atomic);
}

/// Multithreaded benchmark with a fixed clock; measures raw contention.
fn benchmark_mock_contended_lock(c: &mut Criterion) {
    bench_generator_contended(c, "mock/contended/lock", mock_lock);
}

/// Threads may spin due to CAS contention.
fn benchmark_mock_contended_atomic(c: &mut Criterion) {
    bench_generator_contended(c, "mock/contended/atomic", mock_atomic);
}

// --- SYSTEM CLOCK (realistic time with potential spinning) ---

fn benchmark_system_sequential_lock(c: &mut Criterion) {
    bench_generator_spin(c, "system/sequential/lock", || {
        LockSlotflakeGenerator::new(SLOT, SystemClock).unwrap()
    });
}

fn benchmark_system_sequential_atomic(c: &mut Criterion) {
    bench_generator_spin(c, "system/sequential/atomic", || {
        AtomicSlotflakeGenerator::new(SLOT, SystemClock).unwrap()
    });
}

fn benchmark_system_contended_lock(c: &mut Criterion) {
    bench_generator_contended(c, "system/contended/lock", || {
        LockSlotflakeGenerator::new(SLOT, SystemClock).unwrap()
    });
}

fn benchmark_system_contended_atomic(c: &mut Criterion) {
    bench_generator_contended(c, "system/contended/atomic", || {
        AtomicSlotflakeGenerator::new(SLOT, SystemClock).unwrap()
    });
}

// --- COORDINATOR ---

/// `next_id` through a bound coordinator, including the lease check.
fn benchmark_coordinator_next_id(c: &mut Criterion) {
    let coordinator = SlotCoordinator::new(
        Arc::new(MemoryStore::new()),
        CoordinatorConfig::default(),
        SystemClock,
    )
    .unwrap();
    coordinator.acquire_slot().unwrap();

    let mut group = c.benchmark_group("coordinator/next_id");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));
    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(coordinator.next_id().unwrap());
            }
        });
    });
    group.finish();
}

/// Slot acquisition against stores holding an increasing number of leases.
fn benchmark_coordinator_acquire(c: &mut Criterion) {
    let keys = KeySpace::default();
    let mut group = c.benchmark_group("coordinator/acquire");

    for leased in [0_u64, 31, 500, 1000] {
        group.bench_function(format!("leased/{leased}"), |b| {
            b.iter_batched(
                || {
                    let store = Arc::new(MemoryStore::new());
                    for n in 0..leased {
                        let slot = Slot::new(n / 32, n % 32);
                        store
                            .set_with_expiry(
                                &keys.lease_key(slot),
                                "[0,0]",
                                Duration::from_secs(3600),
                            )
                            .unwrap();
                    }
                    SlotCoordinator::new(store, CoordinatorConfig::default(), SystemClock)
                        .unwrap()
                },
                |coordinator| black_box(coordinator.acquire_slot().unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    // Mock clock
    benchmark_mock_sequential_lock,
    benchmark_mock_sequential_atomic,
    benchmark_mock_contended_lock,
    benchmark_mock_contended_atomic,
    // System clock (spinning)
    benchmark_system_sequential_lock,
    benchmark_system_sequential_atomic,
    benchmark_system_contended_lock,
    benchmark_system_contended_atomic,
    // Coordinator
    benchmark_coordinator_next_id,
    benchmark_coordinator_acquire,
);
criterion_main!(benches);
