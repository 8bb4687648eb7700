//! Aggregate simulation state and the per-tick driver.

use bevy::log::{debug, info, trace, warn};
use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::FluidParams;
use crate::core::{NeighborIndex, Particle, ParticleSet, ParticleView};
use crate::error::FluidResult;
use crate::math::Real;
use crate::solver::{Spawner, apply_forces, resolve_collisions, update_lifecycle};

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub removed: usize,
    /// Subset of `removed` dropped for non-finite state.
    pub failed: usize,
    pub spawned: usize,
    pub activated: usize,
    pub collisions: usize,
    pub degenerate_neighbors: usize,
}

/// Particle store, parameters and spawner of one fluid simulation.
///
/// The simulation is single threaded and only advances when `step` is called.
#[derive(Resource)]
pub struct FluidSimulation {
    params: FluidParams,
    particle_set: ParticleSet,
    spawner: Spawner,
    rng: StdRng,
    elapsed: Real,
    tick: u64,
    last_stats: StepStats,
}

impl FluidSimulation {
    /// Validate `params` and spawn the initial population.
    pub fn new(params: FluidParams) -> FluidResult<Self> {
        let mut simulation = Self::empty(params)?;
        let spawned = simulation.spawner.prime(
            &mut simulation.particle_set,
            &simulation.params,
            &mut simulation.rng,
        )?;
        info!(
            "fluid simulation created: {} particles spawned, target {}",
            spawned, simulation.params.particle_count
        );
        Ok(simulation)
    }

    /// A simulation with an empty store; particles arrive through `add_particle`
    /// or the spawner on later ticks.
    pub fn empty(params: FluidParams) -> FluidResult<Self> {
        params.validate()?;
        let rng = seeded_rng(params.seed);
        Ok(Self {
            particle_set: ParticleSet::with_capacity(params.particle_count),
            params,
            spawner: Spawner::new(),
            rng,
            elapsed: 0.0,
            tick: 0,
            last_stats: StepStats::default(),
        })
    }

    /// A simulation holding exactly `particles`, without the initial spawn.
    pub fn with_particles(params: FluidParams, particles: Vec<Particle>) -> FluidResult<Self> {
        let mut simulation = Self::empty(params)?;
        simulation.particle_set.insert_batch(particles);
        Ok(simulation)
    }

    pub fn params(&self) -> &FluidParams {
        &self.params
    }

    /// Replace the parameters.
    ///
    /// Takes effect on the next tick. Existing particles keep their mass, size
    /// and remaining lifetime; a lowered target never culls, the surplus
    /// retires through expiry. The RNG is reseeded only if the seed changed.
    pub fn configure(&mut self, params: FluidParams) -> FluidResult<()> {
        params.validate()?;
        if params.seed != self.params.seed {
            self.rng = seeded_rng(params.seed);
        }
        debug!(
            "fluid simulation reconfigured at tick {}: target {} -> {}",
            self.tick, self.params.particle_count, params.particle_count
        );
        self.params = params;
        Ok(())
    }

    pub fn particle_set(&self) -> &ParticleSet {
        &self.particle_set
    }

    pub fn particle_set_mut(&mut self) -> &mut ParticleSet {
        &mut self.particle_set
    }

    pub fn particle_count(&self) -> usize {
        self.particle_set.len()
    }

    pub fn add_particle(&mut self, particle: Particle) -> usize {
        self.particle_set.push(particle)
    }

    /// Snapshot for the renderer.
    pub fn particles(&self) -> Vec<ParticleView> {
        self.particle_set.views()
    }

    pub fn elapsed(&self) -> Real {
        self.elapsed
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: Real) {
        self.step_with_stats(dt);
    }

    /// Advance the simulation by `dt` seconds and report what happened.
    ///
    /// Order: forces, lifecycle (expiry, activation, position update and
    /// boundaries), spawning, collisions.
    pub fn step_with_stats(&mut self, dt: Real) -> StepStats {
        if !(dt.is_finite() && dt >= 0.0) {
            warn!("ignoring step with invalid dt {}", dt);
            return StepStats::default();
        }

        let params = &self.params;
        let radius = params.max_interaction_radius();
        let mut stats = StepStats::default();

        let index = NeighborIndex::build(params.neighbor_search, self.particle_set.particles(), radius);
        trace!("{:?} neighbor index over {} cells", index.mode(), index.cell_count());
        let forces = apply_forces(self.particle_set.particles_mut(), &index, params, dt);
        stats.degenerate_neighbors = forces.degenerate_neighbors;

        let lifecycle = update_lifecycle(&mut self.particle_set, params, dt, &mut self.rng);
        stats.removed = lifecycle.removed;
        stats.failed = lifecycle.failed;
        stats.activated = lifecycle.activated;

        stats.spawned = match self
            .spawner
            .update(&mut self.particle_set, params, dt, &mut self.rng)
        {
            Ok(spawned) => spawned,
            Err(err) => {
                warn!("spawning skipped: {}", err);
                0
            }
        };

        let index = NeighborIndex::build(params.neighbor_search, self.particle_set.particles(), radius);
        stats.collisions = resolve_collisions(self.particle_set.particles_mut(), &index, params);

        if stats.degenerate_neighbors > 0 {
            debug!(
                "tick {}: skipped {} zero-density neighbor contributions",
                self.tick, stats.degenerate_neighbors
            );
        }

        self.elapsed += dt;
        self.tick += 1;
        self.last_stats = stats;
        stats
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
