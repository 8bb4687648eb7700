// Fixed coefficients of the water simulation passes
use bevy::math::Vec3;

use crate::math::Real;

// Global physics
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);
pub const SIMPLE_GRAVITY: Vec3 = Vec3::new(0.0, -1.0, 0.0);
pub const DELTA_TIME: Real = 1.0 / 60.0;

// Pairwise passes
pub const SURFACE_TENSION_COEFFICIENT: Real = 0.2;
pub const PAIRWISE_VISCOSITY: Real = 0.5;
pub const COHESION_STRENGTH: Real = 0.05;
pub const COHESION_DISTANCE: Real = 1.1;
pub const REPULSION_STRENGTH: Real = 0.05;
/// Ideal separation as a multiple of particle size.
pub const IDEAL_DISTANCE_FACTOR: Real = 3.0;
/// Contact range of collisions, surface tension and pairwise viscosity, in particle sizes.
pub const CONTACT_DISTANCE_FACTOR: Real = 2.0;

// Collisions and boundaries
pub const RESTITUTION: Real = 0.05;
pub const SIMPLE_RESTITUTION: Real = 3.0;
pub const BOUNDARY_REFLECTION: Real = -0.5;

// Cone frustum
pub const CONE_APEX_Y: Real = -300.0;
pub const CONE_HEIGHT: Real = 1000.0;
pub const CONE_BASE_RADIUS: Real = 50.0;
pub const HEIGHT_BOUNDS: Real = 1500.0;
pub const SIMPLE_BOUNDS: Real = 300.0;

// Lifecycle
pub const ACTIVATION_PROBABILITY: Real = 0.01;
pub const ACTIVATION_SPEED: Real = 5.0;
pub const PARTICLE_LIFETIME: Real = 5.0;
pub const SPAWN_DELAY: Real = 0.05;
pub const SPAWN_VELOCITY: Vec3 = Vec3::new(0.0, -0.01, 0.0);
