//! Domain boundaries.
//!
//! Positions are clamped back inside the domain; the clamped axis has its
//! velocity reflected and halved. The cone's radial constraint only moves
//! particles back onto the surface and leaves velocity alone.

use serde::{Deserialize, Serialize};

use crate::config::BOUNDARY_REFLECTION;
use crate::config::fluid_params::{check_non_negative, check_positive};
use crate::core::Particle;
use crate::error::{FluidError, FluidResult};
use crate::math::{DIM, Real, horizontal_length};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Domain {
    /// Axis-aligned box: x and z in `[-half_extent, half_extent]`, y in `[0, half_extent]`.
    Box { half_extent: Real },
    /// Funnel whose radius grows linearly with height.
    ///
    /// The radius at height `y` is `(cone_height + y - apex_y) / cone_height * base_radius`;
    /// heights are kept in `[apex_y, height_bounds - particle_size]`.
    Cone {
        base_radius: Real,
        apex_y: Real,
        cone_height: Real,
        height_bounds: Real,
    },
}

impl Domain {
    pub fn validate(&self) -> FluidResult<()> {
        match *self {
            Self::Box { half_extent } => check_positive("half_extent", half_extent),
            Self::Cone {
                base_radius,
                apex_y,
                cone_height,
                height_bounds,
            } => {
                check_non_negative("base_radius", base_radius)?;
                check_positive("cone_height", cone_height)?;
                if !(apex_y.is_finite() && height_bounds.is_finite() && height_bounds > apex_y) {
                    return Err(FluidError::InvalidParameter {
                        name: "height_bounds",
                        value: height_bounds,
                    });
                }
                Ok(())
            }
        }
    }

    /// Lowest height a particle may occupy.
    pub fn floor(&self) -> Real {
        match *self {
            Self::Box { .. } => 0.0,
            Self::Cone { apex_y, .. } => apex_y,
        }
    }

    /// Highest height a particle of the given nominal size may occupy.
    pub fn ceiling(&self, particle_size: Real) -> Real {
        match *self {
            Self::Box { half_extent } => half_extent,
            Self::Cone { height_bounds, .. } => height_bounds - particle_size,
        }
    }

    /// Allowed horizontal distance from the vertical axis at height `y`,
    /// for the cone. Never negative.
    pub fn radius_at(&self, y: Real) -> Option<Real> {
        match *self {
            Self::Box { .. } => None,
            Self::Cone {
                base_radius,
                apex_y,
                cone_height,
                ..
            } => Some(((cone_height + y - apex_y) / cone_height * base_radius).max(0.0)),
        }
    }

    /// Bring a particle back inside the domain. Returns whether anything was clamped.
    pub fn enforce(&self, particle: &mut Particle, particle_size: Real) -> bool {
        match *self {
            Self::Box { half_extent } => enforce_box(particle, half_extent),
            Self::Cone { .. } => {
                let clamped = self.enforce_height(particle, particle_size);
                let rescaled = self.enforce_radius(particle);
                clamped || rescaled
            }
        }
    }

    /// Whether a position satisfies the domain, up to `tolerance`.
    pub fn contains(&self, particle: &Particle, particle_size: Real, tolerance: Real) -> bool {
        let p = particle.position;
        let vertical = p.y >= self.floor() - tolerance && p.y <= self.ceiling(particle_size) + tolerance;
        let lateral = match (self, self.radius_at(p.y)) {
            (Self::Box { half_extent }, _) => {
                p.x.abs() <= half_extent + tolerance && p.z.abs() <= half_extent + tolerance
            }
            (_, Some(radius)) => horizontal_length(p) <= radius + tolerance,
            _ => true,
        };
        vertical && lateral
    }

    fn enforce_height(&self, particle: &mut Particle, particle_size: Real) -> bool {
        let ceiling = self.ceiling(particle_size);
        let floor = self.floor();
        if particle.position.y > ceiling {
            particle.position.y = ceiling;
        } else if particle.position.y < floor {
            particle.position.y = floor;
        } else {
            return false;
        }
        particle.velocity.y *= BOUNDARY_REFLECTION;
        true
    }

    fn enforce_radius(&self, particle: &mut Particle) -> bool {
        let Some(max_radius) = self.radius_at(particle.position.y) else {
            return false;
        };
        let distance_from_axis = horizontal_length(particle.position);
        if distance_from_axis <= max_radius {
            return false;
        }
        let scale = max_radius / distance_from_axis;
        particle.position.x *= scale;
        particle.position.z *= scale;
        true
    }
}

fn enforce_box(particle: &mut Particle, half_extent: Real) -> bool {
    let mut clamped = false;
    for axis in 0..DIM {
        let floor = if axis == 1 { 0.0 } else { -half_extent };
        let value = particle.position[axis];
        let target = if value > half_extent {
            half_extent
        } else if value < floor {
            floor
        } else {
            continue;
        };
        particle.position[axis] = target;
        particle.velocity[axis] *= BOUNDARY_REFLECTION;
        clamped = true;
    }
    clamped
}
