use psx2d::*;
use std::time::Duration;

fn main() -> psx2d::Result<()> {
    env_logger::init();

    let mut engine = PhysicsEngine::new(WorldConfig::default(), config::DEFAULT_TIME_STEP)?;

    let ground = engine.add_body(BodyDesc::fixed(Vec2::new(0.0, 400.0)))?;
    engine.add_collider(
        ColliderBuilder::new()
            .rect(Vec2::new(800.0, 40.0))
            .attached_to(ground)
            .build()?,
    )?;

    let crate_material = engine
        .world_mut()
        .create_material(Material::new(0.6, 0.1))?;

    let mut boxes = Vec::new();
    for i in 0..5 {
        let body = engine.add_body(BodyDesc {
            flags: BodyFlags::RIGID,
            angle: 0.1 * i as f32,
            ..BodyDesc::dynamic(Vec2::new(-100.0 + i as f32 * 50.0, 100.0 - i as f32 * 40.0))
        })?;
        engine.add_collider(
            ColliderBuilder::new()
                .rect(Vec2::splat(30.0))
                .material(crate_material)
                .attached_to(body)
                .build()?,
        )?;
        boxes.push(body);
    }

    // two seconds of 60 Hz frames
    for frame in 0..120 {
        engine.advance(Duration::from_micros(16_667))?;
        if frame % 30 == 0 {
            for &body in &boxes {
                let position = engine.interpolated_position(body)?;
                println!(
                    "frame {frame:3} body {}: ({:7.2}, {:7.2}) angle {:5.2}",
                    body.index,
                    position.x,
                    position.y,
                    engine.world().body_angle(body)?
                );
            }
        }
    }

    let world = engine.world();
    println!(
        "{} bodies, {} colliders, last step solved {} contacts",
        world.body_count(),
        world.collider_count(),
        world.last_metrics().manifolds_solved
    );
    Ok(())
}
