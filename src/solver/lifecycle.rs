//! Particle lifecycle: lifetime countdown, activation, expiry and staggered respawn.

use bevy::log::{debug, warn};
use bevy::math::Vec3;
use rand::Rng;

use crate::config::{FluidParams, SpawnRegion};
use crate::core::{Particle, ParticleSet};
use crate::error::FluidResult;
use crate::math::Real;
use crate::solver::integrate::{integrate_position, try_activate};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    /// Particles removed this tick, expired and failed alike.
    pub removed: usize,
    /// Particles dropped because their position or velocity stopped being finite.
    pub failed: usize,
    pub activated: usize,
}

/// Count lifetimes down, activate and move live particles, then drop expired
/// and failed ones.
///
/// Particles are visited back to front. Dead particles are only marked during
/// the sweep and compacted afterwards, so no index is skipped or visited twice.
pub fn update_lifecycle<R: Rng + ?Sized>(
    set: &mut ParticleSet,
    params: &FluidParams,
    dt: Real,
    rng: &mut R,
) -> LifecycleReport {
    let mut report = LifecycleReport::default();

    for particle in set.particles_mut().iter_mut().rev() {
        particle.lifetime -= dt;
        particle.update_health();
        if particle.is_dead() {
            report.failed += usize::from(particle.failed);
            continue;
        }

        if try_activate(particle, params, rng) {
            report.activated += 1;
        }

        if particle.is_active {
            integrate_position(particle, dt);
            params.domain.enforce(particle, params.particle_size);
            particle.update_health();
            report.failed += usize::from(particle.failed);
        }
    }

    if report.failed > 0 {
        warn!("dropping {} particles with non-finite state", report.failed);
    }
    report.removed = set
        .remove_dead()
        .iter()
        .filter(|slot| slot.is_none())
        .count();
    report
}

/// Build one particle according to the spawn parameters.
pub fn spawn_particle<R: Rng + ?Sized>(params: &FluidParams, rng: &mut R) -> FluidResult<Particle> {
    let size = if params.randomize_size {
        params.particle_size * (0.5 + rng.random::<Real>())
    } else {
        params.particle_size
    };

    let position = match &params.spawn_region {
        SpawnRegion::Footprint { width, height } => {
            let span = width - size * 2.0;
            Vec3::new(
                (rng.random::<Real>() - 0.5) * span,
                *height,
                (rng.random::<Real>() - 0.5) * span,
            )
        }
        SpawnRegion::Box { min, max } => {
            let t = Vec3::new(rng.random(), rng.random(), rng.random());
            *min + (*max - *min) * t
        }
    };

    let mut particle = Particle::new(position, params.mass)?
        .with_velocity(params.spawn_velocity)
        .with_size(size)
        .with_color(params.color_mode.sample(rng))
        .with_lifetime(params.lifetime.unwrap_or(Real::INFINITY));
    particle.is_active = params.spawn_active;
    Ok(particle)
}

/// Tops the store up to the target count, one particle per `spawn_delay`
/// seconds of simulated time.
#[derive(Clone, Debug, Default)]
pub struct Spawner {
    /// Simulated time banked toward the next spawn.
    credit: Real,
    spawned_total: usize,
    ramping: bool,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned_total(&self) -> usize {
        self.spawned_total
    }

    /// Initial fill at construction: the whole target when spawning is
    /// synchronous, otherwise the first particle of the ramp.
    pub fn prime<R: Rng + ?Sized>(
        &mut self,
        set: &mut ParticleSet,
        params: &FluidParams,
        rng: &mut R,
    ) -> FluidResult<usize> {
        let deficit = params.particle_count.saturating_sub(set.len());
        let count = if params.spawn_delay == 0.0 {
            deficit
        } else {
            deficit.min(1)
        };
        self.credit = 0.0;
        self.spawn(set, params, rng, count)
    }

    /// Advance the stagger clock by `dt` and spawn whatever is due. Never
    /// pushes the store past `particle_count`.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        set: &mut ParticleSet,
        params: &FluidParams,
        dt: Real,
        rng: &mut R,
    ) -> FluidResult<usize> {
        let deficit = params.particle_count.saturating_sub(set.len());
        if deficit == 0 {
            if self.ramping {
                debug!("population reached target of {}", params.particle_count);
                self.ramping = false;
            }
            self.credit = 0.0;
            return Ok(0);
        }
        self.ramping = true;

        if params.spawn_delay == 0.0 {
            return self.spawn(set, params, rng, deficit);
        }

        self.credit += dt;
        let due = (self.credit / params.spawn_delay).floor();
        self.credit -= due * params.spawn_delay;
        self.spawn(set, params, rng, (due as usize).min(deficit))
    }

    fn spawn<R: Rng + ?Sized>(
        &mut self,
        set: &mut ParticleSet,
        params: &FluidParams,
        rng: &mut R,
        count: usize,
    ) -> FluidResult<usize> {
        for _ in 0..count {
            set.push(spawn_particle(params, rng)?);
        }
        self.spawned_total += count;
        Ok(count)
    }
}
