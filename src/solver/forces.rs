//! Force model
//!
//! Every pass adds a velocity delta; positions are left untouched so one
//! neighbor index serves all passes of a tick. Passes update velocities in
//! place and in index order, so later particles see the deltas already given
//! to earlier ones.

use bevy::log::trace;

use crate::config::FluidParams;
use crate::core::{NeighborIndex, Particle, pair_mut, poly6, pressure_gradient_coefficient};
use crate::math::{Real, Vector, normalize_or_zero, zero_vector};

/// Counters gathered while applying forces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForceReport {
    /// Neighbor contributions skipped because the neighbor's density was zero.
    pub degenerate_neighbors: usize,
}

/// Run every enabled pass: pairwise viscosity, gravity, cohesion, repulsion,
/// surface tension, then density/pressure and the pressure force.
pub fn apply_forces(
    particles: &mut [Particle],
    index: &NeighborIndex,
    params: &FluidParams,
    dt: Real,
) -> ForceReport {
    let toggles = params.forces;
    let mut report = ForceReport::default();

    if toggles.pairwise_viscosity {
        apply_pairwise_viscosity(particles, index, params);
    }
    if toggles.gravity {
        apply_gravity(particles, params.gravity, dt);
    }
    if toggles.cohesion {
        apply_cohesion(particles, index, params);
    }
    if toggles.repulsion {
        apply_repulsion(particles, index, params);
    }
    if toggles.surface_tension {
        apply_surface_tension(particles, index, params, dt);
    }
    if toggles.pressure {
        compute_density_and_pressure(particles, index, params);
        report.degenerate_neighbors = apply_pressure_forces(particles, index, params, dt);
    }

    trace!(
        "forces applied to {} particles ({} degenerate neighbors)",
        particles.len(),
        report.degenerate_neighbors
    );
    report
}

/// `v += g · dt / m`, independent of neighbors.
pub fn apply_gravity(particles: &mut [Particle], gravity: Vector, dt: Real) {
    for particle in particles.iter_mut() {
        particle.velocity += gravity * (dt / particle.mass());
    }
}

/// Damping viscosity over unordered pairs closer than the contact distance.
///
/// The impulse along the contact normal is `((v_i − v_j)·n̂) · μ / |d|`, taken
/// from `i` and given to `j`, each scaled by inverse mass. With
/// `cap_pairwise_viscosity` it is limited to the impulse that equalizes the
/// pair's normal velocities. Coincident pairs have no direction and are skipped.
pub fn apply_pairwise_viscosity(particles: &mut [Particle], index: &NeighborIndex, params: &FluidParams) {
    let threshold = params.contact_distance();
    let mut candidates = Vec::new();

    for i in 0..particles.len() {
        index.candidates(particles[i].position, &mut candidates);
        for &j in candidates.iter().filter(|&&j| j > i) {
            let (a, b) = pair_mut(particles, i, j);
            let separation = b.position - a.position;
            let distance = separation.length();
            if !(distance > 0.0 && distance < threshold) {
                continue;
            }

            let normal = separation / distance;
            let normal_velocity = (a.velocity - b.velocity).dot(normal);
            let inv_mass_sum = a.inv_mass() + b.inv_mass();
            let mut coefficient = params.pairwise_viscosity / distance;
            if params.cap_pairwise_viscosity {
                coefficient = coefficient.min(1.0 / inv_mass_sum);
            }
            let impulse = normal * (normal_velocity * coefficient);

            a.velocity -= impulse * a.inv_mass();
            b.velocity += impulse * b.inv_mass();
        }
    }
}

/// Steer each particle toward the mean position of its close neighbors.
///
/// The averaged direction is normalized and scaled by the cohesion strength,
/// then added to velocity directly (no mass or time scaling).
pub fn apply_cohesion(particles: &mut [Particle], index: &NeighborIndex, params: &FluidParams) {
    let range = params.cohesion_range();
    let mut candidates = Vec::new();

    for i in 0..particles.len() {
        let origin = particles[i].position;
        index.candidates(origin, &mut candidates);

        let mut sum = zero_vector();
        let mut neighbor_count = 0usize;
        for &j in candidates.iter().filter(|&&j| j != i) {
            let other = particles[j].position;
            if other.distance(origin) < range {
                sum += other - origin;
                neighbor_count += 1;
            }
        }

        if neighbor_count > 0 {
            let direction = normalize_or_zero(sum / neighbor_count as Real);
            particles[i].velocity += direction * params.cohesion_strength;
        }
    }
}

/// Push apart particles closer than the ideal distance, proportionally to the overlap.
pub fn apply_repulsion(particles: &mut [Particle], index: &NeighborIndex, params: &FluidParams) {
    let ideal = params.ideal_distance();
    let mut candidates = Vec::new();

    for i in 0..particles.len() {
        let origin = particles[i].position;
        index.candidates(origin, &mut candidates);

        let mut push = zero_vector();
        for &j in candidates.iter().filter(|&&j| j != i) {
            let away = origin - particles[j].position;
            let distance = away.length();
            if distance < ideal && distance > 0.0 {
                push += normalize_or_zero(away) * (params.repulsion_strength * (ideal - distance));
            }
        }

        particles[i].velocity += push;
    }
}

/// Unit push away from every neighbor within the contact distance, scaled by
/// the surface tension coefficient and `dt / m`.
pub fn apply_surface_tension(
    particles: &mut [Particle],
    index: &NeighborIndex,
    params: &FluidParams,
    dt: Real,
) {
    let threshold = params.contact_distance();
    let mut candidates = Vec::new();

    for i in 0..particles.len() {
        let origin = particles[i].position;
        index.candidates(origin, &mut candidates);

        let mut tension = zero_vector();
        for &j in candidates.iter().filter(|&&j| j != i) {
            let other = particles[j].position;
            if origin.distance(other) < threshold {
                tension += normalize_or_zero(origin - other) * params.surface_tension;
            }
        }

        let inv_mass = particles[i].inv_mass();
        particles[i].velocity += tension * (dt * inv_mass);
    }
}

/// Kernel density estimate (self included) and linear equation of state.
///
/// Pressure is `stiffness · (ρ − ρ₀)` and goes negative below rest density.
pub fn compute_density_and_pressure(particles: &mut [Particle], index: &NeighborIndex, params: &FluidParams) {
    let h = params.kernel_radius;
    let mut candidates = Vec::new();

    for i in 0..particles.len() {
        let origin = particles[i].position;
        index.candidates(origin, &mut candidates);

        let mut density = 0.0;
        for &j in &candidates {
            let neighbor = &particles[j];
            let r = origin.distance(neighbor.position);
            if r < h {
                density += neighbor.mass() * poly6(r, h);
            }
        }

        let particle = &mut particles[i];
        particle.density = density;
        particle.pressure = params.stiffness * (density - params.rest_density);
    }
}

/// Pressure gradient and kernel viscosity, plus gravity when `double_gravity`
/// is set, applied as `v += F · dt / m`. Returns the number of skipped
/// zero-density neighbor contributions.
pub fn apply_pressure_forces(
    particles: &mut [Particle],
    index: &NeighborIndex,
    params: &FluidParams,
    dt: Real,
) -> usize {
    let h = params.kernel_radius;
    let extra_gravity = if params.double_gravity {
        params.gravity
    } else {
        zero_vector()
    };
    let mut candidates = Vec::new();
    let mut degenerate = 0;

    for i in 0..particles.len() {
        let (origin, velocity, pressure) = {
            let p = &particles[i];
            (p.position, p.velocity, p.pressure)
        };
        index.candidates(origin, &mut candidates);

        let mut pressure_force = zero_vector();
        let mut viscosity_force = zero_vector();
        for &j in &candidates {
            let neighbor = &particles[j];
            let r = origin.distance(neighbor.position);
            if !(r < h && r > 0.0) {
                continue;
            }
            if neighbor.density == 0.0 {
                degenerate += 1;
                continue;
            }

            let grad = normalize_or_zero(origin - neighbor.position) * pressure_gradient_coefficient(r, h);
            pressure_force += grad
                * (-neighbor.mass() * (pressure + neighbor.pressure) / (2.0 * neighbor.density));
            viscosity_force +=
                (neighbor.velocity - velocity) * (params.viscosity * neighbor.mass() / neighbor.density);
        }

        let particle = &mut particles[i];
        let total = pressure_force + viscosity_force + extra_gravity;
        particle.velocity += total * (dt / particle.mass());
    }

    degenerate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceToggles;
    use crate::core::NeighborSearch;
    use bevy::math::Vec3;

    fn particle(position: Vec3) -> Particle {
        Particle::new(position, 1.0).expect("valid mass")
    }

    fn index_for(particles: &[Particle], params: &FluidParams) -> NeighborIndex {
        NeighborIndex::build(params.neighbor_search, particles, params.max_interaction_radius())
    }

    #[test]
    fn gravity_scales_with_inverse_mass() {
        let mut particles = vec![
            particle(Vec3::ZERO),
            Particle::new(Vec3::ZERO, 2.0).expect("valid mass"),
        ];
        apply_gravity(&mut particles, Vec3::new(0.0, -10.0, 0.0), 0.5);
        assert_eq!(particles[0].velocity, Vec3::new(0.0, -5.0, 0.0));
        assert_eq!(particles[1].velocity, Vec3::new(0.0, -2.5, 0.0));
    }

    #[test]
    fn coincident_pair_density_includes_self() {
        let params = FluidParams::water();
        let mut particles = vec![particle(Vec3::ONE), particle(Vec3::ONE)];
        let index = index_for(&particles, &params);

        compute_density_and_pressure(&mut particles, &index, &params);

        let self_density = poly6(0.0, params.kernel_radius);
        for p in &particles {
            assert!(p.density >= self_density, "density {} below self contribution", p.density);
            assert!((p.density - 2.0 * self_density).abs() <= 1e-9);
        }
    }

    #[test]
    fn pressure_goes_negative_below_rest_density() {
        let params = FluidParams {
            rest_density: 1.0,
            stiffness: 2.0,
            ..FluidParams::water()
        };
        let mut particles = vec![particle(Vec3::ZERO)];
        let index = index_for(&particles, &params);
        compute_density_and_pressure(&mut particles, &index, &params);
        assert!(particles[0].pressure < 0.0);
        assert_eq!(
            particles[0].pressure,
            2.0 * (particles[0].density - 1.0)
        );
    }

    #[test]
    fn zero_density_neighbors_are_skipped() {
        let params = FluidParams {
            double_gravity: false,
            ..FluidParams::water()
        };
        let mut particles = vec![particle(Vec3::ZERO), particle(Vec3::new(1.0, 0.0, 0.0))];
        // Densities are left at zero: every neighbor contribution is degenerate.
        let index = index_for(&particles, &params);
        let skipped = apply_pressure_forces(&mut particles, &index, &params, 0.1);
        assert_eq!(skipped, 2);
        for p in &particles {
            assert!(p.velocity.is_finite());
            assert_eq!(p.velocity, Vec3::ZERO);
        }
    }

    #[test]
    fn double_gravity_adds_gravity_in_pressure_pass() {
        let mut params = FluidParams::water();
        params.gravity = Vec3::new(0.0, -6.0, 0.0);
        let mut particles = vec![particle(Vec3::ZERO)];
        let index = index_for(&particles, &params);

        apply_pressure_forces(&mut particles, &index, &params, 0.5);
        assert_eq!(particles[0].velocity, Vec3::new(0.0, -3.0, 0.0));

        params.double_gravity = false;
        particles[0].velocity = Vec3::ZERO;
        apply_pressure_forces(&mut particles, &index, &params, 0.5);
        assert_eq!(particles[0].velocity, Vec3::ZERO);
    }

    #[test]
    fn pressure_pushes_compressed_pair_apart() {
        let params = FluidParams {
            rest_density: 0.0,
            stiffness: 1.0e6,
            viscosity: 0.0,
            double_gravity: false,
            ..FluidParams::water()
        };
        let mut particles = vec![particle(Vec3::ZERO), particle(Vec3::new(2.0, 0.0, 0.0))];
        let index = index_for(&particles, &params);
        compute_density_and_pressure(&mut particles, &index, &params);
        apply_pressure_forces(&mut particles, &index, &params, 1.0 / 60.0);
        assert!(particles[0].velocity.x < 0.0, "left particle should move left");
        assert!(particles[1].velocity.x > 0.0, "right particle should move right");
    }

    #[test]
    fn cohesion_pulls_toward_neighbors_with_fixed_strength() {
        let params = FluidParams::water();
        let mut particles = vec![particle(Vec3::ZERO), particle(Vec3::new(3.0, 0.0, 0.0))];
        let index = index_for(&particles, &params);
        apply_cohesion(&mut particles, &index, &params);
        assert_eq!(particles[0].velocity, Vec3::new(params.cohesion_strength, 0.0, 0.0));
        assert_eq!(particles[1].velocity, Vec3::new(-params.cohesion_strength, 0.0, 0.0));
    }

    #[test]
    fn cohesion_ignores_particles_out_of_range() {
        let params = FluidParams::water();
        let range = params.cohesion_range();
        let mut particles = vec![particle(Vec3::ZERO), particle(Vec3::new(range, 0.0, 0.0))];
        let index = index_for(&particles, &params);
        apply_cohesion(&mut particles, &index, &params);
        assert_eq!(particles[0].velocity, Vec3::ZERO);
    }

    #[test]
    fn repulsion_grows_with_overlap() {
        let params = FluidParams::water();
        let ideal = params.ideal_distance();
        let mut near = vec![particle(Vec3::ZERO), particle(Vec3::new(ideal * 0.25, 0.0, 0.0))];
        let mut far = vec![particle(Vec3::ZERO), particle(Vec3::new(ideal * 0.75, 0.0, 0.0))];
        let index_near = index_for(&near, &params);
        let index_far = index_for(&far, &params);
        apply_repulsion(&mut near, &index_near, &params);
        apply_repulsion(&mut far, &index_far, &params);

        assert!(near[0].velocity.x < far[0].velocity.x);
        assert!(far[0].velocity.x < 0.0);
        let expected = params.repulsion_strength * (ideal - ideal * 0.25);
        assert!((near[1].velocity.x - expected).abs() < 1e-6);
    }

    #[test]
    fn repulsion_skips_coincident_particles() {
        let params = FluidParams::water();
        let mut particles = vec![particle(Vec3::ONE), particle(Vec3::ONE)];
        let index = index_for(&particles, &params);
        apply_repulsion(&mut particles, &index, &params);
        assert_eq!(particles[0].velocity, Vec3::ZERO);
    }

    #[test]
    fn surface_tension_is_dt_and_mass_scaled() {
        let params = FluidParams::water();
        let mut particles = vec![particle(Vec3::ZERO), particle(Vec3::new(1.0, 0.0, 0.0))];
        let index = index_for(&particles, &params);
        apply_surface_tension(&mut particles, &index, &params, 0.5);
        assert!((particles[0].velocity.x + params.surface_tension * 0.5).abs() < 1e-7);
        assert!((particles[1].velocity.x - params.surface_tension * 0.5).abs() < 1e-7);
    }

    #[test]
    fn pairwise_viscosity_is_equal_and_opposite() {
        let params = FluidParams::water();
        let mut particles = vec![
            particle(Vec3::ZERO).with_velocity(Vec3::new(1.0, 0.5, 0.0)),
            Particle::new(Vec3::new(2.0, 0.0, 0.0), 3.0)
                .expect("valid mass")
                .with_velocity(Vec3::new(-1.0, 0.0, 0.0)),
        ];
        let momentum_before: Vec3 = particles.iter().map(|p| p.velocity * p.mass()).sum();
        let index = index_for(&particles, &params);
        apply_pairwise_viscosity(&mut particles, &index, &params);
        let momentum_after: Vec3 = particles.iter().map(|p| p.velocity * p.mass()).sum();

        assert!((momentum_after - momentum_before).length() < 1e-5);
        // Only the normal component is affected.
        assert_eq!(particles[0].velocity.y, 0.5);
        assert_ne!(particles[0].velocity.x, 1.0);
    }

    #[test]
    fn pairwise_viscosity_damps_without_overshoot() {
        let params = FluidParams::water();
        for gap in [0.1, 1.0, 4.0, 9.0] {
            let mut particles = vec![
                particle(Vec3::ZERO).with_velocity(Vec3::new(2.0, 0.0, 0.0)),
                particle(Vec3::new(gap, 0.0, 0.0)).with_velocity(Vec3::new(-2.0, 0.0, 0.0)),
            ];
            let index = index_for(&particles, &params);
            apply_pairwise_viscosity(&mut particles, &index, &params);

            let relative = particles[0].velocity.x - particles[1].velocity.x;
            assert!(relative >= -1e-6 && relative < 4.0, "gap {}: relative {}", gap, relative);
        }
    }

    #[test]
    fn uncapped_pairwise_viscosity_applies_full_coefficient() {
        let params = FluidParams {
            cap_pairwise_viscosity: false,
            ..FluidParams::water()
        };
        let mut particles = vec![
            particle(Vec3::ZERO).with_velocity(Vec3::new(2.0, 0.0, 0.0)),
            particle(Vec3::new(0.25, 0.0, 0.0)).with_velocity(Vec3::new(-2.0, 0.0, 0.0)),
        ];
        let index = index_for(&particles, &params);
        apply_pairwise_viscosity(&mut particles, &index, &params);

        // Impulse 4 · 0.5 / 0.25 = 8 on each unit mass.
        assert_eq!(particles[0].velocity.x, -6.0);
        assert_eq!(particles[1].velocity.x, 6.0);
    }

    #[test]
    fn disabled_passes_leave_velocity_untouched() {
        let params = FluidParams::water().with_forces(ForceToggles::none());
        let mut particles = vec![particle(Vec3::ZERO), particle(Vec3::new(1.0, 0.0, 0.0))];
        let index = index_for(&particles, &params);
        apply_forces(&mut particles, &index, &params, 1.0 / 60.0);
        assert!(particles.iter().all(|p| p.velocity == Vec3::ZERO));
    }

    #[test]
    fn grid_and_brute_force_give_identical_velocities() {
        let brute = FluidParams::water();
        let grid = FluidParams::water().with_neighbor_search(NeighborSearch::Grid);
        let mut a: Vec<Particle> = (0..60)
            .map(|i| {
                let t = i as f32;
                particle(Vec3::new((t * 1.7).sin() * 20.0, t * 0.9, (t * 0.3).cos() * 20.0))
            })
            .collect();
        let mut b = a.clone();

        let index_a = index_for(&a, &brute);
        let index_b = index_for(&b, &grid);
        apply_forces(&mut a, &index_a, &brute, 1.0 / 60.0);
        apply_forces(&mut b, &index_b, &grid, 1.0 / 60.0);

        assert_eq!(a, b);
    }
}
