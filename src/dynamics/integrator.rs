use glam::Vec2;

use crate::{config::WorldConfig, core::rigidbody::RigidBody, utils::allocator::Arena};

/// Semi-implicit Euler integrator with exponential drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    pub gravity: Vec2,
    pub linear_drag: f32,
    pub angular_drag: f32,
}

impl Integrator {
    pub fn new(gravity: Vec2, linear_drag: f32, angular_drag: f32) -> Self {
        Self {
            gravity,
            linear_drag,
            angular_drag,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(
            Vec2::from_array(config.gravity),
            config.linear_drag,
            config.angular_drag,
        )
    }

    /// Applies accumulated force, gravity and drag to the velocity, then clears
    /// the accumulators. Bodies with zero inverse mass only get cleared.
    pub fn integrate_velocity(&self, body: &mut RigidBody, dt: f32) {
        if body.is_static() {
            return;
        }

        if body.inverse_mass == 0.0 {
            body.force = Vec2::ZERO;
            body.torque = 0.0;
            return;
        }

        let gravity = if body.flags.no_gravity {
            Vec2::ZERO
        } else {
            self.gravity
        };

        let acceleration = body.force * body.inverse_mass + gravity;
        body.velocity += acceleration * dt;
        body.velocity *= (-self.linear_drag * dt).exp();

        body.angular_velocity += body.torque * dt;
        body.angular_velocity *= (-self.angular_drag * dt).exp();

        body.force = Vec2::ZERO;
        body.torque = 0.0;
    }

    /// Snapshots the previous pose and advances position and angle.
    pub fn integrate_position(&self, body: &mut RigidBody, dt: f32) {
        if body.is_static() || body.inverse_mass == 0.0 {
            return;
        }

        body.previous_position = body.position;
        body.previous_angle = body.angle;

        body.position += body.velocity * dt;
        body.angle += body.angular_velocity * dt;
    }

    pub fn integrate_velocities(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_velocity(body, dt);
        }
    }

    pub fn integrate_positions(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_position(body, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rigidbody::{BodyDesc, BodyFlags};
    use approx::assert_relative_eq;

    fn integrator() -> Integrator {
        Integrator::new(Vec2::new(0.0, 1000.0), 2.0, 2.0)
    }

    #[test]
    fn gravity_and_drag_update_velocity() {
        let dt = 1.0 / 60.0;
        let mut body = RigidBody::new(BodyDesc::default());
        integrator().integrate_velocity(&mut body, dt);
        assert_relative_eq!(body.velocity.y, 1000.0 * dt * (-2.0 * dt).exp(), epsilon = 1e-4);
    }

    #[test]
    fn no_gravity_flag_skips_gravity() {
        let mut body = RigidBody::new(BodyDesc {
            flags: BodyFlags {
                no_gravity: true,
                ..BodyFlags::default()
            },
            ..BodyDesc::default()
        });
        integrator().integrate_velocity(&mut body, 0.1);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn force_is_consumed() {
        let mut body = RigidBody::new(BodyDesc {
            mass: 2.0,
            force: Vec2::new(10.0, 0.0),
            torque: 3.0,
            ..BodyDesc::default()
        });
        let integrator = Integrator::new(Vec2::ZERO, 0.0, 0.0);
        integrator.integrate_velocity(&mut body, 0.5);
        assert_relative_eq!(body.velocity.x, 2.5);
        assert_relative_eq!(body.angular_velocity, 1.5);
        assert_eq!(body.force, Vec2::ZERO);
        assert_eq!(body.torque, 0.0);
    }

    #[test]
    fn position_step_snapshots_previous_pose() {
        let mut body = RigidBody::new(BodyDesc {
            position: Vec2::new(1.0, 1.0),
            velocity: Vec2::new(10.0, 0.0),
            angular_velocity: 2.0,
            ..BodyDesc::default()
        });
        integrator().integrate_position(&mut body, 0.5);
        assert_eq!(body.previous_position, Vec2::new(1.0, 1.0));
        assert_eq!(body.position, Vec2::new(6.0, 1.0));
        assert_relative_eq!(body.angle, 1.0);
        assert_eq!(body.previous_angle, 0.0);
    }

    #[test]
    fn static_body_never_moves() {
        let mut body = RigidBody::new(BodyDesc {
            velocity: Vec2::new(5.0, 5.0),
            ..BodyDesc::fixed(Vec2::ZERO)
        });
        let integrator = integrator();
        integrator.integrate_velocity(&mut body, 1.0);
        integrator.integrate_position(&mut body, 1.0);
        assert_eq!(body.position, Vec2::ZERO);
    }
}
