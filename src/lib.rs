use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod math;
pub mod simulation;
pub mod solver;

// Public re-exports for clean API
pub use crate::config::{FluidParams, ForceToggles, SpawnRegion};
pub use crate::core::{ColorMode, NeighborSearch, Particle, ParticleColor, ParticleSet, ParticleView};
pub use crate::error::{FluidError, FluidResult};
pub use crate::simulation::{FluidSimulation, StepStats};
pub use crate::solver::Domain;

/// Inserts a [`FluidSimulation`] resource and steps it once per `Update`.
pub struct FluidPlugin {
    pub params: FluidParams,
}

impl FluidPlugin {
    pub fn new(params: FluidParams) -> Self {
        Self { params }
    }
}

impl Default for FluidPlugin {
    fn default() -> Self {
        Self::new(FluidParams::water())
    }
}

impl Plugin for FluidPlugin {
    fn build(&self, app: &mut App) {
        match FluidSimulation::new(self.params.clone()) {
            Ok(simulation) => {
                app.insert_resource(simulation)
                    .add_systems(Update, step_fluid_simulation);
            }
            Err(err) => error!("fluid simulation not started: {}", err),
        }
    }
}

/// Advance the simulation by the configured tick, or by the frame delta when
/// `use_frame_delta` is set and a `Time` resource exists.
pub fn step_fluid_simulation(time: Option<Res<Time>>, mut simulation: ResMut<FluidSimulation>) {
    let dt = match time {
        Some(time) if simulation.params().use_frame_delta => time.delta_secs(),
        _ => simulation.params().delta_time,
    };
    simulation.step(dt);
}
