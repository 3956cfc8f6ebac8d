use criterion::*;
use nalgebra_glm::{Mat4, Vec3};
use turbo_world::prelude::*;

const COUNT: usize = 10000;

#[derive(Default, Component)]
struct Transform(Mat4);

#[derive(Default, Component)]
#[component(compact)]
struct Body {
    translation: Vec3,
    rotation: Vec3,
    velocity: Vec3,
}

fn populated_world() -> (World, Vec<ComponentHandle>) {
    let mut world = World::default();
    let handles = (0..COUNT)
        .map(|i| {
            let (handle, body) = world.create_component::<Body>().unwrap();
            body.velocity = Vec3::new(i as f32, 1.0, 0.0);
            handle
        })
        .collect();
    (world, handles)
}

fn create_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("Create components");
    group.bench_function("Sparse", |b| {
        b.iter_batched(
            World::default,
            |mut world| {
                for _ in 0..COUNT {
                    world.create_component::<Transform>().unwrap();
                }
                world
            },
            BatchSize::PerIteration,
        );
    });

    group.bench_function("Compact", |b| {
        b.iter_batched(
            World::default,
            |mut world| {
                for _ in 0..COUNT {
                    world.create_component::<Body>().unwrap();
                }
                world
            },
            BatchSize::PerIteration,
        );
    });
}

fn delete_components(c: &mut Criterion) {
    c.bench_function("Delete and flush components", |b| {
        b.iter_batched(
            populated_world,
            |(mut world, handles)| {
                for handle in handles.iter().step_by(2) {
                    world.delete_component(*handle).unwrap();
                }
                world.flush_dead_components();
                world
            },
            BatchSize::PerIteration,
        );
    });
}

fn update_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("Update components");
    group.bench_function("Synchronous", |b| {
        let (mut world, _) = populated_world();
        let desc = UpdateFunctionDesc::new::<Body, _>("integrate", |manager: &mut ComponentManager<Body>, _| {
            for body in manager.components_mut() {
                body.translation += body.velocity;
                body.rotation += Vec3::new(0.0, 0.01, 0.0);
            }
        });
        world.register_update_function(desc).unwrap();

        b.iter(|| world.update().unwrap());
    });

    group.bench_function("Batched", |b| {
        let (mut world, _) = populated_world();
        let desc = UpdateFunctionDesc::batched::<Body, _>("integrate", |mut batch| {
            for body in batch.iter_mut() {
                body.translation += body.velocity;
                body.rotation += Vec3::new(0.0, 0.01, 0.0);
            }
        })
        .with_granularity(512);
        world.register_update_function(desc).unwrap();

        b.iter(|| world.update().unwrap());
    });
}

criterion_group!(benches, create_components, delete_components, update_components);
criterion_main!(benches);
