use crate::core::particle::{Particle, ParticleView};

/// Owns the particle array. Particles have no stable identity: indices are
/// only meaningful between two structural changes (push / removal).
#[derive(Clone, Debug, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    pub fn push(&mut self, particle: Particle) -> usize {
        let index = self.particles.len();
        self.particles.push(particle);
        index
    }

    pub fn insert_batch(&mut self, mut batch: Vec<Particle>) {
        self.particles.append(&mut batch);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    /// Renderer snapshot in store order.
    pub fn views(&self) -> Vec<ParticleView> {
        self.particles.iter().map(Particle::view).collect()
    }

    /// Drop every particle whose lifetime ran out or whose state failed.
    ///
    /// Survivors keep their relative order. Returns the old-to-new index
    /// mapping (`None` for removed particles), or an empty vec when nothing
    /// was removed.
    pub fn remove_dead(&mut self) -> Vec<Option<usize>> {
        if !self.particles.iter().any(Particle::is_dead) {
            return Vec::new();
        }

        let old_len = self.particles.len();
        let mut mapping = vec![None; old_len];
        let mut survivors = Vec::with_capacity(old_len);

        for (old_idx, particle) in self.particles.drain(..).enumerate() {
            if !particle.is_dead() {
                mapping[old_idx] = Some(survivors.len());
                survivors.push(particle);
            }
        }

        self.particles = survivors;
        mapping
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

/// Mutable access to two distinct particles, `i < j`.
#[inline]
pub fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert!(i < j);
    let (head, tail) = particles.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
