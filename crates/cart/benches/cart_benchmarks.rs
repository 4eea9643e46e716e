use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use storefront_catalog::{Money, Product, ProductId};
use storefront_cart::{Cart, CartEvent};
use storefront_core::SessionId;

fn products(n: usize) -> Vec<Product> {
    (0..n)
        .map(|i| {
            Product::new(
                ProductId::generate(),
                format!("Product {i}"),
                "bench",
                Money::from_minor(100 + i as u64),
                10,
            )
            .unwrap()
        })
        .collect()
}

/// Fill a cart with `n` distinct lines, then merge one more unit into each.
fn bench_add_and_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart_add_and_merge");

    for size in [10usize, 100, 500] {
        let catalog = products(size);
        group.throughput(Throughput::Elements((size * 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &catalog, |b, catalog| {
            b.iter(|| {
                let mut cart = Cart::empty(SessionId::new());
                for p in catalog {
                    cart.add_one(p.clone());
                }
                for p in catalog {
                    cart.add_one(p.clone());
                }
                black_box(cart.item_count())
            });
        });
    }

    group.finish();
}

/// Derived reads recompute on every call.
fn bench_subtotal(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart_subtotal");

    for size in [10usize, 100, 500] {
        let mut cart = Cart::empty(SessionId::new());
        for p in products(size) {
            cart.add_item(p, 3);
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), &cart, |b, cart| {
            b.iter(|| black_box(cart.subtotal()));
        });
    }

    group.finish();
}

/// Rebuilding from recorded events.
fn bench_replay(c: &mut Criterion) {
    let mut cart = Cart::empty(SessionId::new());
    let mut history: Vec<CartEvent> = Vec::new();
    for p in products(200) {
        history.extend(cart.add_item(p.clone(), 2));
        history.extend(cart.update_quantity(p.id_typed(), 5));
    }
    let id = cart.id_typed();

    c.bench_function("cart_replay_400_events", |b| {
        b.iter(|| black_box(Cart::replay(id, &history)));
    });
}

criterion_group!(benches, bench_add_and_merge, bench_subtotal, bench_replay);
criterion_main!(benches);
