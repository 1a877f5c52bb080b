use crate::{
    collision::contact::ContactManifold,
    config::{WorldConfig, MIN_EFFECTIVE_MASS, MIN_TANGENT_SPEED},
    core::{
        collider::Collider,
        material::MaterialStore,
        rigidbody::RigidBody,
        types::MaterialPairProperties,
    },
    error::Result,
    utils::{
        allocator::Arena,
        math::{clamp, cross},
    },
};

/// Impulse magnitudes applied for one manifold.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ContactImpulse {
    pub normal: f32,
    pub tangent: f32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SolverStepMetrics {
    pub manifolds_solved: usize,
    pub normal_impulse_sum: f32,
    pub tangent_impulse_sum: f32,
}

impl SolverStepMetrics {
    pub fn record(&mut self, impulse: ContactImpulse) {
        self.manifolds_solved += 1;
        self.normal_impulse_sum += impulse.normal.abs();
        self.tangent_impulse_sum += impulse.tangent.abs();
    }
}

/// Single-pass sequential impulse solver with positional correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSolver {
    /// Penetration left uncorrected.
    pub slop: f32,
    /// Fraction of the penetration beyond `slop` removed per step.
    pub correction_percent: f32,
}

impl ContactSolver {
    pub fn new(slop: f32, correction_percent: f32) -> Self {
        Self {
            slop,
            correction_percent,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.slop, config.correction_percent)
    }

    /// Looks up both bodies and materials of a manifold and resolves it.
    ///
    /// Manifolds whose colliders or bodies have gone away are skipped.
    /// Material lookups propagate errors.
    pub fn solve_manifold(
        &self,
        manifold: &ContactManifold,
        bodies: &mut Arena<RigidBody>,
        colliders: &Arena<Collider>,
        materials: &MaterialStore,
    ) -> Result<Option<ContactImpulse>> {
        if !manifold.colliding {
            return Ok(None);
        }

        let (Some(collider_a), Some(collider_b)) = (
            colliders.try_get(manifold.collider_a),
            colliders.try_get(manifold.collider_b),
        )
        else {
            return Ok(None);
        };
        if collider_a.body == collider_b.body {
            return Ok(None);
        }

        let pair = materials
            .resolve(collider_a.material)?
            .combine_with(&materials.resolve(collider_b.material)?);

        let Ok((body_a, body_b)) = bodies.get2_mut(collider_a.body, collider_b.body) else {
            return Ok(None);
        };

        Ok(Some(self.resolve(body_a, body_b, manifold, pair)))
    }

    /// Positional correction followed by the normal and friction impulses.
    pub fn resolve(
        &self,
        a: &mut RigidBody,
        b: &mut RigidBody,
        manifold: &ContactManifold,
        pair: MaterialPairProperties,
    ) -> ContactImpulse {
        let mut applied = ContactImpulse::default();

        let (a_static, b_static) = (a.is_static(), b.is_static());
        if a_static && b_static {
            return applied;
        }

        let inv_mass_a = if a_static { 0.0 } else { a.inverse_mass };
        let inv_mass_b = if b_static { 0.0 } else { b.inverse_mass };
        let inv_inertia_a = if a_static { 0.0 } else { a.inverse_inertia };
        let inv_inertia_b = if b_static { 0.0 } else { b.inverse_inertia };

        let inv_mass_sum = inv_mass_a + inv_mass_b;
        if inv_mass_sum <= 0.0 {
            return applied;
        }

        let normal = manifold.normal;
        let contact = manifold.contact;

        let depth = (manifold.depth - self.slop).max(0.0);
        let correction = normal * (depth * self.correction_percent / inv_mass_sum);
        if !a_static {
            a.position -= correction * inv_mass_a;
        }
        if !b_static {
            b.position += correction * inv_mass_b;
        }

        let ra = contact - a.position;
        let rb = contact - b.position;
        let relative = b.point_velocity(contact) - a.point_velocity(contact);

        // friction is bounded by the normal impulse of this step, zero when skipped
        let mut max_friction = 0.0;

        let normal_speed = relative.dot(normal);
        if normal_speed <= 0.0 {
            let rn_a = cross(ra, normal);
            let rn_b = cross(rb, normal);
            let effective =
                inv_mass_sum + rn_a * rn_a * inv_inertia_a + rn_b * rn_b * inv_inertia_b;

            if effective >= MIN_EFFECTIVE_MASS {
                let j = -(1.0 + pair.restitution) * normal_speed / effective;
                max_friction = j * pair.friction;
                let impulse = normal * j;
                a.apply_impulse_at(-impulse, contact);
                b.apply_impulse_at(impulse, contact);
                applied.normal = j;
            }
        }

        let tangent = relative - normal * relative.dot(normal);
        let tangent_length = tangent.length();
        if tangent_length < MIN_TANGENT_SPEED {
            return applied;
        }
        let tangent = tangent / tangent_length;

        let rt_a = cross(ra, tangent);
        let rt_b = cross(rb, tangent);
        let effective = inv_mass_sum + rt_a * rt_a * inv_inertia_a + rt_b * rt_b * inv_inertia_b;
        if effective < MIN_EFFECTIVE_MASS {
            return applied;
        }

        let jt = clamp(-relative.dot(tangent) / effective, -max_friction, max_friction);
        let impulse = tangent * jt;
        a.apply_impulse_at(-impulse, contact);
        b.apply_impulse_at(impulse, contact);
        applied.tangent = jt;

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rigidbody::{BodyDesc, BodyFlags};
    use crate::utils::allocator::EntityId;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn solver() -> ContactSolver {
        ContactSolver::new(0.02, 0.2)
    }

    fn manifold(normal: Vec2, contact: Vec2, depth: f32) -> ContactManifold {
        ContactManifold::new(EntityId::from_index(0), EntityId::from_index(1), normal, contact, depth)
    }

    fn pair(friction: f32, restitution: f32) -> MaterialPairProperties {
        MaterialPairProperties {
            friction,
            restitution,
        }
    }

    #[test]
    fn correction_is_split_by_inverse_mass() {
        let mut a = RigidBody::new(BodyDesc::dynamic(Vec2::ZERO));
        let mut b = RigidBody::new(BodyDesc::dynamic(Vec2::new(9.0, 0.0)));
        solver().resolve(&mut a, &mut b, &manifold(Vec2::X, Vec2::new(5.0, 0.0), 1.0), pair(0.0, 0.0));
        let pushed = (1.0 - 0.02) * 0.2 * 0.5;
        assert_relative_eq!(a.position.x, -pushed, epsilon = 1e-6);
        assert_relative_eq!(b.position.x, 9.0 + pushed, epsilon = 1e-6);
    }

    #[test]
    fn static_body_takes_no_correction() {
        let mut ground = RigidBody::new(BodyDesc::fixed(Vec2::ZERO));
        let mut ball = RigidBody::new(BodyDesc {
            velocity: Vec2::new(0.0, -10.0),
            ..BodyDesc::dynamic(Vec2::new(0.0, 5.0))
        });
        let impulse = solver().resolve(
            &mut ground,
            &mut ball,
            &manifold(Vec2::Y, Vec2::new(0.0, 4.0), 1.0),
            pair(0.0, 1.0),
        );
        assert_eq!(ground.position, Vec2::ZERO);
        assert!(ball.position.y > 5.0);
        // perfectly elastic bounce off an immovable body
        assert_relative_eq!(impulse.normal, 20.0, epsilon = 1e-4);
        assert_relative_eq!(ball.velocity.y, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn separating_bodies_get_no_normal_impulse() {
        let mut a = RigidBody::new(BodyDesc {
            velocity: Vec2::new(-1.0, 0.0),
            ..BodyDesc::dynamic(Vec2::ZERO)
        });
        let mut b = RigidBody::new(BodyDesc {
            velocity: Vec2::new(1.0, 0.0),
            ..BodyDesc::dynamic(Vec2::new(9.0, 0.0))
        });
        let impulse = solver().resolve(&mut a, &mut b, &manifold(Vec2::X, Vec2::new(5.0, 0.0), 1.0), pair(1.0, 0.0));
        assert_eq!(impulse.normal, 0.0);
        assert_relative_eq!(a.velocity.x, -1.0);
    }

    #[test]
    fn friction_is_clamped_by_normal_impulse() {
        let mut ground = RigidBody::new(BodyDesc::fixed(Vec2::ZERO));
        let mut slider = RigidBody::new(BodyDesc {
            velocity: Vec2::new(100.0, -1.0),
            ..BodyDesc::dynamic(Vec2::new(0.0, 5.0))
        });
        let impulse = solver().resolve(
            &mut ground,
            &mut slider,
            &manifold(Vec2::Y, Vec2::new(0.0, 4.0), 0.0),
            pair(0.5, 0.0),
        );
        assert_relative_eq!(impulse.normal, 1.0, epsilon = 1e-5);
        assert_relative_eq!(impulse.tangent.abs(), 0.5, epsilon = 1e-5);
        assert_relative_eq!(slider.velocity.x, 99.5, epsilon = 1e-4);
    }

    #[test]
    fn rigid_body_spins_from_off_centre_contact() {
        let mut ground = RigidBody::new(BodyDesc::fixed(Vec2::ZERO));
        let mut falling = RigidBody::new(BodyDesc {
            velocity: Vec2::new(0.0, -10.0),
            flags: BodyFlags::RIGID,
            ..BodyDesc::dynamic(Vec2::new(0.0, 5.0))
        });
        solver().resolve(
            &mut ground,
            &mut falling,
            &manifold(Vec2::Y, Vec2::new(2.0, 4.0), 0.0),
            pair(0.0, 0.0),
        );
        assert!(falling.angular_velocity != 0.0);
    }
}
