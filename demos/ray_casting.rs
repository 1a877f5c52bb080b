use psx2d::*;

fn main() -> psx2d::Result<()> {
    env_logger::init();

    let mut world = PhysicsWorld::new(WorldConfig::weightless())?;

    let wall = world.create_body(BodyDesc {
        group: 0b01,
        ..BodyDesc::fixed(Vec2::new(0.0, 200.0))
    })?;
    world.add_collider(
        ColliderBuilder::new()
            .rect(Vec2::new(400.0, 20.0))
            .attached_to(wall)
            .build()?,
    )?;

    for (i, x) in [-120.0f32, 0.0, 120.0].into_iter().enumerate() {
        let body = world.create_body(BodyDesc {
            group: 0b10,
            ..BodyDesc::fixed(Vec2::new(x, 80.0))
        })?;
        world.add_collider(
            ColliderBuilder::new()
                .circle(10.0 + 5.0 * i as f32)
                .attached_to(body)
                .build()?,
        )?;
    }

    world.update_broadphase();

    let origin = Vec2::new(0.0, -50.0);
    for angle_deg in (-60..=60).step_by(20) {
        let direction = Vec2::from_angle((90.0 + angle_deg as f32).to_radians());
        let query = RaycastQuery::new(origin, direction, 500.0);
        report("any", angle_deg, world.cast_ray(&query));
        report("walls", angle_deg, world.cast_ray(&query.with_group(0b01)));
    }
    Ok(())
}

fn report(filter: &str, angle_deg: i32, hit: RaycastHit) {
    if hit.touched {
        println!(
            "{filter:>5} {angle_deg:4}°: collider {} at {:6.2} ({:7.2}, {:7.2}) normal ({:5.2}, {:5.2})",
            hit.collider.index, hit.distance, hit.point.x, hit.point.y, hit.normal.x, hit.normal.y
        );
    } else {
        println!("{filter:>5} {angle_deg:4}°: miss");
    }
}
