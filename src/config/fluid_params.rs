use std::path::Path;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::core::{ColorMode, NeighborSearch, ParticleColor};
use crate::error::{FluidError, FluidResult};
use crate::math::{Real, Vector};
use crate::solver::Domain;

/// Enables individual force passes. Disabled passes leave velocities untouched.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceToggles {
    pub pairwise_viscosity: bool,
    pub gravity: bool,
    pub cohesion: bool,
    pub repulsion: bool,
    pub surface_tension: bool,
    /// Density/pressure estimate and the combined pressure + viscosity + gravity force.
    pub pressure: bool,
}

impl Default for ForceToggles {
    fn default() -> Self {
        Self {
            pairwise_viscosity: true,
            gravity: true,
            cohesion: true,
            repulsion: true,
            surface_tension: true,
            pressure: true,
        }
    }
}

impl ForceToggles {
    pub fn none() -> Self {
        Self {
            pairwise_viscosity: false,
            gravity: false,
            cohesion: false,
            repulsion: false,
            surface_tension: false,
            pressure: false,
        }
    }

    pub fn gravity_only() -> Self {
        Self {
            gravity: true,
            ..Self::none()
        }
    }
}

/// Where freshly spawned particles are placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpawnRegion {
    /// Square footprint of side `width` centred on the vertical axis, at a fixed height.
    /// Particles are inset by their own diameter.
    Footprint { width: Real, height: Real },
    /// Uniform sampling of an axis-aligned box.
    Box {
        min: Vector,
        max: Vector,
    },
}

/// Parameters controlling the fluid simulation.
///
/// `water()` reproduces the funnelled water effect; `simple()` the bouncing
/// particles in a box. Everything can be overridden field by field or loaded
/// from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidParams {
    /// Mass given to every spawned particle.
    pub mass: Real,
    /// Smoothing kernel radius (h) for density and pressure.
    pub kernel_radius: Real,
    pub rest_density: Real,
    /// Pressure = stiffness * (density - rest_density).
    pub stiffness: Real,
    /// Kernel-based viscosity coefficient.
    ///
    /// Integrated explicitly: each neighbor pulls velocities together by
    /// `viscosity · dt / ρ_j`, which has to stay well below 1 or velocity
    /// differences grow every tick. Densities sit near `rest_density`.
    pub viscosity: Real,
    pub cohesion_strength: Real,
    /// Cohesion range as a multiple of particle size.
    pub cohesion_distance: Real,
    pub repulsion_strength: Real,
    /// Repulsion ideal distance as a multiple of particle size.
    pub ideal_distance_factor: Real,
    pub surface_tension: Real,
    /// Coefficient of the pairwise damping viscosity pass.
    pub pairwise_viscosity: Real,
    /// Limit each pairwise viscosity impulse to the one that equalizes the
    /// pair's normal velocities. Off applies `μ / |d|` unclamped.
    pub cap_pairwise_viscosity: bool,
    /// Coefficient of restitution for particle-particle collisions.
    pub restitution: Real,
    pub gravity: Vector,
    pub domain: Domain,

    /// Target population.
    pub particle_count: usize,
    /// Nominal particle size; every neighbor threshold is a multiple of it.
    pub particle_size: Real,
    /// Seconds a particle lives. `None` keeps particles forever.
    pub lifetime: Option<Real>,
    /// Seconds between staggered spawns. Zero spawns up to the target at once.
    pub spawn_delay: Real,
    pub spawn_region: SpawnRegion,
    pub spawn_velocity: Vector,
    /// Draw each particle's size from `[0.5, 1.5)` times `particle_size`.
    pub randomize_size: bool,
    pub spawn_active: bool,
    pub color_mode: ColorMode,

    /// Fixed tick length used by the plugin unless `use_frame_delta` is set.
    pub delta_time: Real,
    pub use_frame_delta: bool,
    pub activation_probability: Real,
    pub activation_speed: Real,

    /// Apply gravity a second time inside the pressure force.
    pub double_gravity: bool,
    pub forces: ForceToggles,
    pub neighbor_search: NeighborSearch,
    /// Seed for spawn and activation randomness. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self::water()
    }
}

impl FluidParams {
    /// Water funnelled through a cone with full force model and staggered spawning.
    pub fn water() -> Self {
        let particle_size = 5.0;
        Self {
            mass: 1.0,
            kernel_radius: particle_size * 3.0,
            rest_density: 5.0e-4,
            stiffness: 50.0,
            viscosity: 0.001,
            cohesion_strength: COHESION_STRENGTH,
            cohesion_distance: COHESION_DISTANCE,
            repulsion_strength: REPULSION_STRENGTH,
            ideal_distance_factor: IDEAL_DISTANCE_FACTOR,
            surface_tension: SURFACE_TENSION_COEFFICIENT,
            pairwise_viscosity: PAIRWISE_VISCOSITY,
            cap_pairwise_viscosity: true,
            restitution: RESTITUTION,
            gravity: GRAVITY,
            domain: Domain::Cone {
                base_radius: CONE_BASE_RADIUS,
                apex_y: CONE_APEX_Y,
                cone_height: CONE_HEIGHT,
                height_bounds: HEIGHT_BOUNDS,
            },
            particle_count: 100,
            particle_size,
            lifetime: Some(PARTICLE_LIFETIME),
            spawn_delay: SPAWN_DELAY,
            spawn_region: SpawnRegion::Footprint {
                width: CONE_BASE_RADIUS,
                height: 0.0,
            },
            spawn_velocity: SPAWN_VELOCITY,
            randomize_size: true,
            spawn_active: false,
            color_mode: ColorMode::WarmHsl,
            delta_time: DELTA_TIME,
            use_frame_delta: false,
            activation_probability: ACTIVATION_PROBABILITY,
            activation_speed: ACTIVATION_SPEED,
            double_gravity: true,
            forces: ForceToggles::default(),
            neighbor_search: NeighborSearch::BruteForce,
            seed: None,
        }
    }

    /// Immortal particles bouncing in a box under gravity.
    pub fn simple() -> Self {
        Self {
            gravity: SIMPLE_GRAVITY,
            restitution: SIMPLE_RESTITUTION,
            domain: Domain::Box {
                half_extent: SIMPLE_BOUNDS,
            },
            lifetime: None,
            spawn_delay: 0.0,
            spawn_region: SpawnRegion::Box {
                min: Vec3::new(-50.0, 100.0, -50.0),
                max: Vec3::new(100.0, 250.0, 100.0),
            },
            spawn_velocity: Vec3::ZERO,
            randomize_size: false,
            spawn_active: true,
            color_mode: ColorMode::Fixed(ParticleColor::new(0.0, 1.0, 0.0)),
            double_gravity: false,
            forces: ForceToggles::gravity_only(),
            ..Self::water()
        }
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_forces(mut self, forces: ForceToggles) -> Self {
        self.forces = forces;
        self
    }

    pub fn with_neighbor_search(mut self, search: NeighborSearch) -> Self {
        self.neighbor_search = search;
        self
    }

    /// Distance under which particles collide, feel surface tension and pairwise viscosity.
    #[inline]
    pub fn contact_distance(&self) -> Real {
        self.particle_size * CONTACT_DISTANCE_FACTOR
    }

    #[inline]
    pub fn cohesion_range(&self) -> Real {
        self.particle_size * self.cohesion_distance
    }

    #[inline]
    pub fn ideal_distance(&self) -> Real {
        self.particle_size * self.ideal_distance_factor
    }

    /// Largest neighbor threshold used by any pass; sizes the neighbor grid.
    pub fn max_interaction_radius(&self) -> Real {
        self.kernel_radius
            .max(self.contact_distance())
            .max(self.cohesion_range())
            .max(self.ideal_distance())
    }

    pub fn validate(&self) -> FluidResult<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(FluidError::InvalidMass(self.mass));
        }
        check_positive("kernel_radius", self.kernel_radius)?;
        check_positive("particle_size", self.particle_size)?;
        check_positive("delta_time", self.delta_time)?;
        check_non_negative("spawn_delay", self.spawn_delay)?;
        check_non_negative("cohesion_distance", self.cohesion_distance)?;
        check_non_negative("ideal_distance_factor", self.ideal_distance_factor)?;
        check_non_negative("restitution", self.restitution)?;
        check_non_negative("activation_speed", self.activation_speed)?;
        check_finite("rest_density", self.rest_density)?;
        check_finite("stiffness", self.stiffness)?;
        check_finite("viscosity", self.viscosity)?;
        check_finite("cohesion_strength", self.cohesion_strength)?;
        check_finite("repulsion_strength", self.repulsion_strength)?;
        check_finite("surface_tension", self.surface_tension)?;
        check_finite("pairwise_viscosity", self.pairwise_viscosity)?;
        if !self.gravity.is_finite() {
            return Err(FluidError::InvalidParameter {
                name: "gravity",
                value: Real::NAN,
            });
        }
        if !(0.0..=1.0).contains(&self.activation_probability) {
            return Err(FluidError::InvalidParameter {
                name: "activation_probability",
                value: self.activation_probability,
            });
        }
        if let Some(lifetime) = self.lifetime {
            check_positive("lifetime", lifetime)?;
        }
        if let SpawnRegion::Box { min, max } = &self.spawn_region {
            if !(min.is_finite() && max.is_finite()) || min.cmpgt(*max).any() {
                return Err(FluidError::InvalidParameter {
                    name: "spawn_region",
                    value: Real::NAN,
                });
            }
        }
        self.domain.validate()?;
        if self.domain.ceiling(self.particle_size) < self.domain.floor() {
            return Err(FluidError::InvalidParameter {
                name: "particle_size",
                value: self.particle_size,
            });
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> FluidResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file. Missing fields take their `water()` values.
    pub fn load_json(path: &Path) -> FluidResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save_json(&self, path: &Path) -> FluidResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

pub(crate) fn check_positive(name: &'static str, value: Real) -> FluidResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FluidError::InvalidParameter { name, value })
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: Real) -> FluidResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FluidError::InvalidParameter { name, value })
    }
}

fn check_finite(name: &'static str, value: Real) -> FluidResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FluidError::InvalidParameter { name, value })
    }
}
