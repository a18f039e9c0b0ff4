// SPDX-License-Identifier: MPL-2.0
//! Benchmarks for store operations.
//!
//! Measures the performance of:
//! - Pushing into a capped position (admission + queueing)
//! - Draining a queue through destroy-driven promotion
//! - Ticking a store with many running countdowns

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use std::time::{Duration, Instant};
use toast_scheduler::config::Config;
use toast_scheduler::notifications::{
    Content, IncomingRequest, Lifetime, NotificationId, NotificationType, Position, Store,
};

const ITEMS: usize = 500;

fn request(index: usize) -> IncomingRequest {
    IncomingRequest {
        id: NotificationId::new(),
        kind: NotificationType::Info,
        content: Content {
            message: format!("notification {index}"),
            ..Content::default()
        },
        duration: Lifetime::from_millis(1000 + (index as u64 % 50) * 10),
        position: Position::ALL[index % Position::ALL.len()],
        skip_queue: false,
    }
}

fn store(limit: Option<usize>) -> Store {
    let mut config = Config::default();
    config.layout.max_visible = limit;
    config.animations.leave = String::new();
    Store::new(config).unwrap()
}

fn filled(limit: Option<usize>, now: Instant) -> (Store, Vec<NotificationId>) {
    let mut store = store(limit);
    let ids = (0..ITEMS)
        .filter_map(|i| store.set_incoming(request(i), now))
        .collect();
    (store, ids)
}

/// Benchmark admission with most pushes landing in the queue.
fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    let now = Instant::now();

    group.bench_function("push_capped", |b| {
        b.iter_batched(
            || (store(Some(3)), (0..ITEMS).map(request).collect::<Vec<_>>()),
            |(mut store, requests)| {
                for request in requests {
                    black_box(store.set_incoming(request, now));
                }
                store
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Benchmark promotion of queued items as visible ones are destroyed.
fn bench_drain_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    let now = Instant::now();

    group.bench_function("drain_queue", |b| {
        b.iter_batched(
            || filled(Some(3), now),
            |(mut store, ids)| {
                for id in ids {
                    store.destroy(id, now);
                }
                black_box(store.is_empty())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Benchmark expiry of every countdown in one tick.
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    let now = Instant::now();

    group.bench_function("tick_all_expired", |b| {
        b.iter_batched(
            || filled(None, now).0,
            |mut store| black_box(store.tick(now + Duration::from_secs(10))),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("next_deadline", |b| {
        let (store, _) = filled(None, now);
        b.iter(|| black_box(store.next_deadline()));
    });

    group.finish();
}

criterion_group!(benches, bench_push, bench_drain_queue, bench_tick);
criterion_main!(benches);
