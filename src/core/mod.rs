pub mod kernel;
pub mod neighbors;
pub mod particle;
pub mod particle_set;

pub use kernel::{poly6, pressure_gradient_coefficient};
pub use neighbors::{NeighborIndex, NeighborSearch, cell_from_position};
pub use particle::{ColorMode, Particle, ParticleColor, ParticleView};
pub use particle_set::{ParticleSet, pair_mut};
