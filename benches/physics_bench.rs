use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use psx2d::*;
use std::hint::black_box;

const DT: f32 = psx2d::config::DEFAULT_TIME_STEP;

/// A grid of mixed boxes and circles dropped onto a static floor.
fn prepare_world(body_count: usize, parallel: bool) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(WorldConfig {
        parallel,
        ..WorldConfig::default()
    })
    .unwrap();

    let floor = world.create_body(BodyDesc::fixed(Vec2::new(0.0, 600.0))).unwrap();
    world
        .add_collider(
            ColliderBuilder::new()
                .rect(Vec2::new(4000.0, 40.0))
                .attached_to(floor)
                .build()
                .unwrap(),
        )
        .unwrap();

    let columns = (body_count as f32).sqrt().ceil() as usize;
    for i in 0..body_count {
        let position = Vec2::new((i % columns) as f32 * 12.0 - 600.0, (i / columns) as f32 * 12.0);
        let body = world
            .create_body(BodyDesc {
                flags: BodyFlags::RIGID,
                ..BodyDesc::dynamic(position)
            })
            .unwrap();
        let builder = if i % 2 == 0 {
            ColliderBuilder::new().rect(Vec2::splat(10.0))
        } else {
            ColliderBuilder::new().circle(5.0)
        };
        world.add_collider(builder.attached_to(body).build().unwrap()).unwrap();
    }
    world
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");
    for &count in &[128usize, 512, 2048] {
        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            let mut world = prepare_world(count, false);
            b.iter(|| world.step(black_box(DT)).unwrap())
        });
        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", count), &count, |b, &count| {
            let mut world = prepare_world(count, true);
            b.iter(|| world.step(black_box(DT)).unwrap())
        });
    }
    group.finish();
}

fn bench_bvh(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh");
    for &count in &[256usize, 4096] {
        let boxes: Vec<Aabb> = (0..count)
            .map(|i| {
                let min = Vec2::new((i * 37 % 1000) as f32, (i * 91 % 1000) as f32);
                Aabb::new(min, min + Vec2::splat(8.0))
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("build_and_pairs", count), &boxes, |b, boxes| {
            let mut bvh = Bvh::with_capacity(boxes.len());
            let mut ids: Vec<EntityId> = (0..boxes.len() as u32).map(EntityId::from_index).collect();
            b.iter(|| {
                bvh.build(&mut ids, |id| boxes[id.index()]);
                let mut pairs = 0usize;
                bvh.for_each_overlapping_pair(|_, _| pairs += 1);
                black_box(pairs)
            })
        });
    }
    group.finish();
}

fn bench_raycast(c: &mut Criterion) {
    let mut world = prepare_world(2048, false);
    world.update_broadphase();
    c.bench_function("cast_ray_2048", |b| {
        b.iter(|| {
            let query = RaycastQuery::new(Vec2::new(-700.0, 100.0), Vec2::new(1.0, 0.3), 2000.0);
            black_box(world.cast_ray(black_box(&query)))
        })
    });
}

criterion_group!(benches, bench_world_step, bench_bvh, bench_raycast);
criterion_main!(benches);
