use bevy::math::Vec3;
use fluid_sim::core::{NeighborIndex, poly6};
use fluid_sim::solver::{compute_density_and_pressure, resolve_collisions};
use fluid_sim::{Domain, FluidParams, FluidSimulation, ForceToggles, NeighborSearch, Particle};

const DT: f32 = 1.0 / 60.0;

fn still_water() -> FluidParams {
    FluidParams {
        gravity: Vec3::ZERO,
        activation_probability: 0.0,
        ..FluidParams::water()
    }
    .with_forces(ForceToggles::none())
    .with_particle_count(1)
    .with_seed(11)
}

#[test]
fn particle_above_ceiling_is_clamped_and_bounced() {
    let params = still_water();
    let particle = Particle::new(Vec3::new(0.0, 2000.0, 0.0), 1.0)
        .expect("valid mass")
        .with_velocity(Vec3::new(0.0, -4.0, 0.0))
        .activated();
    let mut sim = FluidSimulation::with_particles(params, vec![particle]).expect("valid params");

    sim.step(DT);

    let p = &sim.particle_set().particles()[0];
    assert_eq!(p.position.y, 1500.0 - 5.0);
    assert_eq!(p.velocity.y, 2.0);
}

#[test]
fn coincident_particles_have_at_least_self_density() {
    let params = FluidParams::water();
    let mut particles = vec![
        Particle::new(Vec3::new(3.0, 7.0, 1.0), 2.0).expect("valid mass"),
        Particle::new(Vec3::new(3.0, 7.0, 1.0), 2.0).expect("valid mass"),
    ];
    let index = NeighborIndex::build(params.neighbor_search, &particles, params.max_interaction_radius());

    compute_density_and_pressure(&mut particles, &index, &params);

    let self_density = 2.0 * poly6(0.0, params.kernel_radius);
    assert!(self_density > 0.0);
    for p in &particles {
        assert!(p.density >= self_density);
    }
}

#[test]
fn head_on_collision_scales_relative_velocity_by_restitution() {
    for restitution in [0.05, 0.5, 1.0] {
        let params = FluidParams {
            restitution,
            ..FluidParams::water()
        };
        let speed = 3.0;
        let mut particles = vec![
            Particle::new(Vec3::ZERO, 1.0)
                .expect("valid mass")
                .with_velocity(Vec3::new(speed, 0.0, 0.0)),
            Particle::new(Vec3::new(6.0, 0.0, 0.0), 1.0)
                .expect("valid mass")
                .with_velocity(Vec3::new(-speed, 0.0, 0.0)),
        ];
        let index = NeighborIndex::build(params.neighbor_search, &particles, params.max_interaction_radius());

        resolve_collisions(&mut particles, &index, &params);

        let relative = particles[0].velocity.x - particles[1].velocity.x;
        assert!((relative + restitution * 2.0 * speed).abs() < 1e-5);
        // Momentum along the normal is unchanged.
        assert!((particles[0].velocity.x + particles[1].velocity.x).abs() < 1e-5);
    }
}

#[test]
fn active_particles_stay_inside_the_cone() {
    let params = FluidParams {
        activation_probability: 0.05,
        ..FluidParams::water()
    }
    .with_seed(5);
    let domain = params.domain;
    let size = params.particle_size;
    let mut sim = FluidSimulation::new(params).expect("valid params");

    for _ in 0..400 {
        sim.step(DT);
        for p in sim.particle_set().iter().filter(|p| p.is_active) {
            assert!(p.position.is_finite());
            assert!(domain.contains(p, size, 1e-3), "escaped cone: {:?}", p.position);
        }
    }
}

#[test]
fn full_water_preset_stays_finite_and_fills_up() {
    let params = FluidParams::water().with_seed(7);
    let target = params.particle_count;
    let mut sim = FluidSimulation::new(params).expect("valid params");

    let mut peak = sim.particle_count();
    for tick in 0..600 {
        let stats = sim.step_with_stats(DT);
        assert_eq!(stats.failed, 0, "particles blew up at tick {}", tick);
        assert!(sim.particle_set().iter().all(|p| p.velocity.is_finite()));
        assert!(sim.particle_count() <= target);
        peak = peak.max(sim.particle_count());
    }
    assert_eq!(peak, target);
}

#[test]
fn box_particles_stay_inside_the_box() {
    let params = FluidParams::simple().with_seed(8);
    let Domain::Box { half_extent } = params.domain else {
        panic!("simple preset uses a box");
    };
    let mut sim = FluidSimulation::new(params).expect("valid params");

    for _ in 0..400 {
        sim.step(DT);
        for p in sim.particle_set().iter() {
            assert!(p.position.x.abs() <= half_extent);
            assert!(p.position.z.abs() <= half_extent);
            assert!((0.0..=half_extent).contains(&p.position.y));
        }
    }
}

#[test]
fn lifetime_runs_out_and_particles_are_replaced() {
    let params = FluidParams {
        lifetime: Some(1.0),
        spawn_delay: 0.0,
        ..still_water()
    }
    .with_particle_count(10);
    let mut sim = FluidSimulation::new(params).expect("valid params");
    assert_eq!(sim.particle_count(), 10);

    for expected in [0.75, 0.5, 0.25] {
        sim.step(0.25);
        assert!(sim.particle_set().iter().all(|p| p.lifetime == expected));
    }

    let stats = sim.step_with_stats(0.25);
    assert_eq!(stats.removed, 10);
    assert_eq!(stats.spawned, 10);
    assert!(sim.particle_set().iter().all(|p| p.lifetime == 1.0));
}

#[test]
fn staggered_population_grows_to_target_and_never_exceeds_it() {
    let params = FluidParams::water()
        .with_forces(ForceToggles::gravity_only())
        .with_particle_count(30)
        .with_seed(21);
    let mut sim = FluidSimulation::new(params).expect("valid params");

    let mut previous = sim.particle_count();
    assert_eq!(previous, 1);
    for _ in 0..120 {
        sim.step(DT);
        let count = sim.particle_count();
        assert!(count >= previous, "population shrank before any lifetime ran out");
        assert!(count <= 30);
        previous = count;
    }
    assert_eq!(previous, 30);
}

#[test]
fn grid_search_matches_brute_force_over_many_ticks() {
    let brute = FluidParams::water().with_seed(99).with_particle_count(60);
    let grid = brute.clone().with_neighbor_search(NeighborSearch::Grid);
    let mut a = FluidSimulation::new(brute).expect("valid params");
    let mut b = FluidSimulation::new(grid).expect("valid params");

    for _ in 0..240 {
        let stats_a = a.step_with_stats(DT);
        let stats_b = b.step_with_stats(DT);
        assert_eq!(stats_a, stats_b);
    }
    assert_eq!(a.particle_set().particles(), b.particle_set().particles());
}

#[test]
fn reconfiguring_keeps_existing_particles() {
    let mut sim = FluidSimulation::new(FluidParams::simple().with_seed(2)).expect("valid params");
    let before = sim.particle_set().particles().to_vec();

    let heavier = FluidParams {
        mass: 10.0,
        ..FluidParams::simple().with_seed(2)
    };
    sim.configure(heavier).expect("valid params");

    assert_eq!(sim.particle_set().particles(), before.as_slice());
    assert!(sim.particle_set().iter().all(|p| p.mass() == 1.0));
    assert_eq!(sim.params().mass, 10.0);
}
