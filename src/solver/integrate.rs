//! Position update, random activation and particle-particle collisions.

use rand::Rng;

use crate::config::FluidParams;
use crate::core::{NeighborIndex, Particle, pair_mut};
use crate::math::{Real, Vector};

/// Semi-implicit Euler step: `x += v · dt`, with `v` already updated this tick.
#[inline]
pub fn integrate_position(particle: &mut Particle, dt: Real) {
    particle.position += particle.velocity * dt;
}

/// Give an inactive particle its chance to start falling.
///
/// On activation the vertical velocity is replaced by a random downward speed
/// in `[0, activation_speed)`. Returns whether the particle was activated.
pub fn try_activate<R: Rng + ?Sized>(particle: &mut Particle, params: &FluidParams, rng: &mut R) -> bool {
    if particle.is_active || rng.random::<Real>() >= params.activation_probability {
        return false;
    }
    particle.is_active = true;
    particle.velocity.y = -rng.random::<Real>() * params.activation_speed;
    true
}

/// Impulse exchanged by two colliding particles along `normal` (pointing from
/// `b` to `a`), or `None` when they are separating.
#[inline]
pub fn collision_impulse(a: &Particle, b: &Particle, normal: Vector, restitution: Real) -> Option<Real> {
    let velocity_along_normal = (a.velocity - b.velocity).dot(normal);
    if velocity_along_normal > 0.0 {
        return None;
    }
    Some(-(1.0 + restitution) * velocity_along_normal / (a.inv_mass() + b.inv_mass()))
}

/// Resolve every unordered pair closer than the contact distance.
///
/// Velocities only; there is no positional de-penetration. Pairs are visited
/// in index order and see the impulses of earlier pairs. Returns the number
/// of approaching pairs that received an impulse.
pub fn resolve_collisions(particles: &mut [Particle], index: &NeighborIndex, params: &FluidParams) -> usize {
    let threshold = params.contact_distance();
    let mut candidates = Vec::new();
    let mut collisions = 0;

    for i in 0..particles.len() {
        index.candidates(particles[i].position, &mut candidates);
        for &j in candidates.iter().filter(|&&j| j > i) {
            let (a, b) = pair_mut(particles, i, j);
            let separation = a.position - b.position;
            let distance = separation.length();
            if !(distance > 0.0 && distance < threshold) {
                continue;
            }

            let normal = separation / distance;
            let Some(magnitude) = collision_impulse(a, b, normal, params.restitution) else {
                continue;
            };
            let impulse = normal * magnitude;
            a.velocity += impulse * a.inv_mass();
            b.velocity -= impulse * b.inv_mass();
            if magnitude != 0.0 {
                collisions += 1;
            }
        }
    }

    collisions
}
