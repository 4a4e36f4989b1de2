//! Particle state: two parallel arrays of positions and velocities

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Bounds;

/// CPU-side particle state in the exact layout uploaded to the GPU
/// (`array<vec2<f32>>` for both arrays).
///
/// The particle count is fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleState {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
}

impl ParticleState {
    /// Scatter `count` particles uniformly inside `bounds` (each axis sampled
    /// independently), all at rest.
    pub fn initialize<R: Rng>(count: usize, bounds: &Bounds, rng: &mut R) -> Self {
        let (min, max) = (bounds.min(), bounds.max());
        let positions = (0..count)
            .map(|_| {
                Vec2::new(
                    rng.random_range(min.x..=max.x),
                    rng.random_range(min.y..=max.y),
                )
            })
            .collect();

        log::debug!("Initialized {} particles in [{}, {}]", count, min, max);

        Self {
            positions,
            velocities: vec![Vec2::ZERO; count],
        }
    }

    /// Seeded when `seed` is set, otherwise drawn from the thread RNG.
    pub fn initialize_seeded(count: usize, bounds: &Bounds, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::initialize(count, bounds, &mut StdRng::seed_from_u64(seed)),
            None => Self::initialize(count, bounds, &mut rand::rng()),
        }
    }

    /// Particles at given positions, all at rest.
    pub fn at_rest(positions: Vec<Vec2>) -> Self {
        let velocities = vec![Vec2::ZERO; positions.len()];
        Self {
            positions,
            velocities,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_initialization_is_reproducible() {
        let bounds = Bounds::default();
        let a = ParticleState::initialize_seeded(1000, &bounds, Some(42));
        let b = ParticleState::initialize_seeded(1000, &bounds, Some(42));
        let c = ParticleState::initialize_seeded(1000, &bounds, Some(43));
        assert_eq!(a, b);
        assert_ne!(a.positions, c.positions);
    }

    #[test]
    fn arrays_have_equal_length() {
        let state = ParticleState::initialize_seeded(37, &Bounds::default(), Some(1));
        assert_eq!(state.positions.len(), 37);
        assert_eq!(state.velocities.len(), 37);
    }
}
