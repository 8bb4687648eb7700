//! Neighbor candidate search.
//!
//! Every force pass applies its own exact distance threshold; this module only
//! narrows the set of indices it has to test. Candidates always come back in
//! ascending index order, so accumulation order (and the floating point result)
//! is the same for both strategies.

use bevy::math::IVec3;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::particle::Particle;
use crate::math::{Real, Vector};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighborSearch {
    /// Test every particle against every other one.
    #[default]
    BruteForce,
    /// Uniform grid with cells as wide as the largest interaction radius.
    Grid,
}

const CELL_OFFSETS: [IVec3; 27] = {
    let mut offsets = [IVec3::ZERO; 27];
    let mut i = 0;
    while i < 27 {
        offsets[i] = IVec3::new((i / 9) as i32 - 1, ((i / 3) % 3) as i32 - 1, (i % 3) as i32 - 1);
        i += 1;
    }
    offsets
};

#[derive(Clone, Debug)]
pub struct NeighborIndex {
    mode: NeighborSearch,
    particle_count: usize,
    cell_size: Real,
    cells: IndexMap<IVec3, Vec<usize>>,
}

impl NeighborIndex {
    /// Index the current positions. `cell_size` must be at least the largest
    /// radius later passed to queries.
    pub fn build(mode: NeighborSearch, particles: &[Particle], cell_size: Real) -> Self {
        let mut cells: IndexMap<IVec3, Vec<usize>> = IndexMap::new();
        if mode == NeighborSearch::Grid {
            for (idx, particle) in particles.iter().enumerate() {
                cells
                    .entry(cell_from_position(particle.position, cell_size))
                    .or_default()
                    .push(idx);
            }
        }
        Self {
            mode,
            particle_count: particles.len(),
            cell_size,
            cells,
        }
    }

    pub fn mode(&self) -> NeighborSearch {
        self.mode
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Fill `out` with every index that may lie within `cell_size` of
    /// `position`, sorted ascending and without duplicates.
    pub fn candidates(&self, position: Vector, out: &mut Vec<usize>) {
        out.clear();
        match self.mode {
            NeighborSearch::BruteForce => out.extend(0..self.particle_count),
            NeighborSearch::Grid => {
                let center = cell_from_position(position, self.cell_size);
                for offset in CELL_OFFSETS {
                    if let Some(bucket) = self.cells.get(&center.saturating_add(offset)) {
                        out.extend_from_slice(bucket);
                    }
                }
                out.sort_unstable();
                // Saturated coordinates can alias the same cell.
                out.dedup();
            }
        }
    }
}

#[inline]
pub fn cell_from_position(position: Vector, cell_size: Real) -> IVec3 {
    (position / cell_size).floor().as_ivec3()
}
