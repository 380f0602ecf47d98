//! Ring hot-path microbenchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use orderflux::models::{Order, Side};
use orderflux::ring::OrderRing;

fn bench_push_pop(c: &mut Criterion) {
    let ring = OrderRing::with_capacity(1024).unwrap();
    let order = Order::new(1, "AAPL", Side::Buy, 150.0, 100);

    c.bench_function("ring_push_pop", |b| {
        b.iter(|| {
            ring.try_push(black_box(order));
            black_box(ring.try_pop())
        })
    });
}

fn bench_burst_drain(c: &mut Criterion) {
    let ring = OrderRing::with_capacity(1024).unwrap();

    c.bench_function("ring_burst_512_drain", |b| {
        b.iter(|| {
            for id in 1..=512u64 {
                ring.try_push(Order::new(id, "MSFT", Side::Sell, 120.0, 10));
            }
            while let Some(order) = ring.try_pop() {
                black_box(order);
            }
        })
    });
}

criterion_group!(benches, bench_push_pop, bench_burst_drain);
criterion_main!(benches);
