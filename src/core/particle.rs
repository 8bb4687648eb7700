//! Fluid particles
//!
//! Particles carry position, velocity, mass, per-tick density/pressure scratch
//! and their lifecycle state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FluidError, FluidResult};
use crate::math::{Real, Vector, zero_vector};

/// Linear RGB colour handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleColor {
    pub r: Real,
    pub g: Real,
    pub b: Real,
}

impl Default for ParticleColor {
    fn default() -> Self {
        Self::new(0.2, 0.5, 0.9)
    }
}

impl ParticleColor {
    pub const fn new(r: Real, g: Real, b: Real) -> Self {
        Self { r, g, b }
    }

    /// Hue in degrees, saturation and lightness in `[0, 1]`.
    pub fn from_hsl(hue: Real, saturation: Real, lightness: Real) -> Self {
        let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let sector = hue.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = lightness - chroma / 2.0;
        Self::new(r + m, g + m, b + m)
    }
}

/// How spawned particles are coloured.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColorMode {
    Fixed(ParticleColor),
    /// Random reds and oranges: hue 0-40°, saturation 50-100%, lightness 30-70%.
    WarmHsl,
}

impl ColorMode {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParticleColor {
        match self {
            Self::Fixed(color) => *color,
            Self::WarmHsl => {
                let hue = rng.random::<Real>() * 40.0;
                let saturation = 0.5 + rng.random::<Real>() * 0.5;
                let lightness = 0.3 + rng.random::<Real>() * 0.4;
                ParticleColor::from_hsl(hue, saturation, lightness)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vector,
    pub velocity: Vector,
    mass: Real,
    /// Rendered radius. Force thresholds use the nominal size from the params.
    pub size: Real,
    pub color: ParticleColor,

    // Recomputed every tick from neighbor positions
    pub density: Real,
    pub pressure: Real,

    pub is_active: bool,
    /// Seconds left before removal.
    pub lifetime: Real,
    /// Set once the particle's state stops being finite; removed with the expired ones.
    pub failed: bool,
}

impl Particle {
    /// Create an inactive, immortal particle at rest.
    pub fn new(position: Vector, mass: Real) -> FluidResult<Self> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(FluidError::InvalidMass(mass));
        }
        Ok(Self {
            position,
            velocity: zero_vector(),
            mass,
            size: 1.0,
            color: ParticleColor::default(),
            density: 0.0,
            pressure: 0.0,
            is_active: false,
            lifetime: Real::INFINITY,
            failed: false,
        })
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_size(mut self, size: Real) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: ParticleColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_lifetime(mut self, lifetime: Real) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn activated(mut self) -> Self {
        self.is_active = true;
        self
    }

    /// Always positive: checked when the particle is built and never mutated.
    #[inline(always)]
    pub fn mass(&self) -> Real {
        self.mass
    }

    #[inline(always)]
    pub fn inv_mass(&self) -> Real {
        1.0 / self.mass
    }

    #[inline(always)]
    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    /// Whether the particle leaves the store at the end of the lifecycle pass.
    #[inline(always)]
    pub fn is_dead(&self) -> bool {
        self.failed || self.is_expired()
    }

    pub fn update_health(&mut self) {
        if !self.position.is_finite() || !self.velocity.is_finite() {
            self.failed = true;
        }
    }

    pub fn view(&self) -> ParticleView {
        ParticleView {
            position: self.position,
            size: self.size,
            color: self.color,
            is_active: self.is_active,
        }
    }
}

/// What a renderer needs to draw one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleView {
    pub position: Vector,
    pub size: Real,
    pub color: ParticleColor,
    pub is_active: bool,
}
