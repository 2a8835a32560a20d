//! # ECS Performance Benchmark
//!
//! Entity churn and query throughput at the default entity ceiling.
//!
//! Run with: `cargo bench --package glint_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glint_core::{component_set, BoxedStorage, DenseStorage, EcsManager, EntityId, MAX_NUM_ENTITIES};

trait Behaviour {
    fn step(&mut self, value: &mut f32);
}

struct Damp(f32);

impl Behaviour for Damp {
    fn step(&mut self, value: &mut f32) {
        *value *= self.0;
    }
}

#[derive(Clone, Copy)]
struct Velocity([f32; 3]);

component_set! {
    struct Bench {
        positions: [f32; 3] => DenseStorage<[f32; 3]>,
        velocities: Velocity => DenseStorage<Velocity>,
        weights: f32 => DenseStorage<f32>,
        behaviours: dyn Behaviour => BoxedStorage<dyn Behaviour>,
    }
}

type Ecs = EcsManager<Bench>;

/// Full manager with every entity holding position and velocity, and every
/// fourth entity holding a weight and behaviour.
fn populated() -> Ecs {
    let mut ecs = Ecs::new();
    for i in 0..MAX_NUM_ENTITIES {
        let Some(id) = ecs.new_entity() else { break };
        let f = i as f32;
        let _ = ecs.new_component::<[f32; 3]>(id, [f, f, f]);
        let _ = ecs.new_component::<Velocity>(id, Velocity([0.1, 0.2, 0.3]));
        if i % 4 == 0 {
            let _ = ecs.new_component::<f32>(id, 1.0);
            let _ = ecs.new_component::<dyn Behaviour>(id, Box::new(Damp(0.99)));
        }
    }
    ecs
}

/// Benchmark: Integrate every position.
fn bench_integrate(c: &mut Criterion) {
    let mut ecs = populated();
    c.bench_function("integrate_positions", |b| {
        b.iter(|| {
            for (_, position, velocity) in ecs.get_all_mut::<(&mut [f32; 3], &Velocity)>() {
                for (p, v) in position.iter_mut().zip(velocity.0) {
                    *p += v;
                }
            }
        });
    });
}

/// Benchmark: Create entities up to the ceiling.
fn bench_new_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("new_entities");

    for count in [1_000, MAX_NUM_ENTITIES] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut ecs = Ecs::new();
                for _ in 0..count {
                    black_box(ecs.new_entity());
                }
                ecs.live_entities()
            });
        });
    }

    group.finish();
}

/// Benchmark: Delete every other entity and refill the freed slots.
fn bench_entity_churn(c: &mut Criterion) {
    c.bench_function("entity_churn_half", |b| {
        b.iter_batched(
            populated,
            |mut ecs| {
                let ids: Vec<EntityId> = ecs.entities().step_by(2).collect();
                for id in ids {
                    let _ = ecs.delete_entity(id);
                }
                while ecs.new_entity().is_some() {}
                ecs.live_entities()
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: Shared two-term query over every entity.
fn bench_get_all(c: &mut Criterion) {
    let ecs = populated();
    c.bench_function("get_all_position_weight", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for (_, position, weight) in ecs.get_all::<(&[f32; 3], &f32)>() {
                sum += position[0] * weight;
            }
            black_box(sum)
        });
    });
}

/// Benchmark: Exclusive query mixing flat and boxed storages.
fn bench_get_all_mut(c: &mut Criterion) {
    let mut ecs = populated();
    c.bench_function("get_all_mut_behaviour", |b| {
        b.iter(|| {
            for (_, behaviour, weight) in ecs.get_all_mut::<(&mut dyn Behaviour, &mut f32)>() {
                behaviour.step(weight);
            }
        });
    });
}

/// Benchmark: Random-access component lookup.
fn bench_get_component(c: &mut Criterion) {
    let ecs = populated();
    let ids: Vec<EntityId> = ecs.entities().collect();
    c.bench_function("get_component_all", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for &id in &ids {
                if ecs.get_component::<f32>(id).is_ok() {
                    hits += 1;
                }
            }
            black_box(hits)
        });
    });
}

criterion_group!(
    benches,
    bench_new_entities,
    bench_entity_churn,
    bench_integrate,
    bench_get_all,
    bench_get_all_mut,
    bench_get_component,
);

criterion_main!(benches);
