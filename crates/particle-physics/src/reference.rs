//! CPU reference pipeline
//!
//! Runs the same clear → build → simulate stages as the GPU kernels, one element
//! at a time. Used as the oracle for GPU tests and as executable documentation of
//! what each kernel computes.

use glam::Vec2;

use crate::forces::{drag_force, integrate, pointer_force, repulsion_force};
use crate::{ConfigError, FrameInput, GridLayout, ParticleState, SwarmConfig};

/// Counting-sort grid.
///
/// After [`build`](Self::build), cell `c` owns
/// `sorted_indices[cell_starts[c]..cell_starts[c + 1]]`, in ascending particle index.
#[derive(Clone, Debug)]
pub struct CountingSortGrid {
    layout: GridLayout,
    /// `(cell_hash, particle_index)` per particle, in particle order
    pub entries: Vec<(u32, u32)>,
    pub cell_counts: Vec<u32>,
    /// Exclusive prefix sum of `cell_counts`, with the particle count appended
    pub cell_starts: Vec<u32>,
    pub sorted_indices: Vec<u32>,
    /// Positions in `sorted_indices` order, captured at build time
    pub sorted_positions: Vec<Vec2>,
}

impl CountingSortGrid {
    pub fn new(layout: GridLayout) -> Self {
        let cells = layout.cell_count() as usize;
        Self {
            layout,
            entries: Vec::new(),
            cell_counts: vec![0; cells],
            cell_starts: vec![0; cells + 1],
            sorted_indices: Vec::new(),
            sorted_positions: Vec::new(),
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn clear(&mut self) {
        self.cell_counts.fill(0);
        self.cell_starts.fill(0);
    }

    /// Count, prefix-sum, scatter, then order each cell by particle index.
    pub fn build(&mut self, positions: &[Vec2]) {
        let n = positions.len();

        // Count
        self.entries.clear();
        for (i, &p) in positions.iter().enumerate() {
            let hash = self.layout.cell_hash(p);
            self.entries.push((hash, i as u32));
            self.cell_counts[hash as usize] += 1;
        }

        // Prefix sum
        let mut running = 0u32;
        for (start, &count) in self.cell_starts.iter_mut().zip(&self.cell_counts) {
            *start = running;
            running += count;
        }
        self.cell_starts[self.cell_counts.len()] = running;

        // Scatter. Ranks are handed out from the top of each cell's range down,
        // mirroring the GPU's atomicSub, and leave every count at zero.
        self.sorted_indices.clear();
        self.sorted_indices.resize(n, 0);
        for &(hash, i) in &self.entries {
            let cell = hash as usize;
            self.cell_counts[cell] -= 1;
            let slot = self.cell_starts[cell] + self.cell_counts[cell];
            self.sorted_indices[slot as usize] = i;
        }

        // Order
        for cell in 0..self.cell_counts.len() {
            let range = self.cell_range(cell as u32);
            self.sorted_indices[range].sort_unstable();
        }
        self.sorted_positions.clear();
        self.sorted_positions
            .extend(self.sorted_indices.iter().map(|&i| positions[i as usize]));
    }

    pub fn cell_range(&self, cell: u32) -> std::ops::Range<usize> {
        let c = cell as usize;
        self.cell_starts[c] as usize..self.cell_starts[c + 1] as usize
    }

    /// Particle indices recorded for `cell`.
    pub fn cell_particles(&self, cell: u32) -> &[u32] {
        &self.sorted_indices[self.cell_range(cell)]
    }

    /// Every candidate in the 3x3 block around `position`, as
    /// `(particle_index, position_at_build_time)`. The caller applies the distance cutoff.
    pub fn for_each_candidate<F>(&self, position: Vec2, mut f: F)
    where
        F: FnMut(u32, Vec2),
    {
        let coords = self.layout.cell_coords(position);
        for cell in self.layout.neighborhood(coords) {
            for slot in self.cell_range(cell) {
                f(self.sorted_indices[slot], self.sorted_positions[slot]);
            }
        }
    }
}

/// Single-threaded twin of the GPU simulation.
#[derive(Clone, Debug)]
pub struct ReferenceSimulation {
    config: SwarmConfig,
    state: ParticleState,
    grid: CountingSortGrid,
}

impl ReferenceSimulation {
    pub fn new(config: SwarmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = ParticleState::initialize_seeded(
            config.particle_count as usize,
            &config.bounds,
            config.seed,
        );
        Self::with_state(config, state)
    }

    /// Start from explicit particle state. `config.particle_count` is ignored.
    pub fn with_state(mut config: SwarmConfig, state: ParticleState) -> Result<Self, ConfigError> {
        if state.is_empty() {
            return Err(ConfigError::EmptySwarm);
        }
        config.particle_count = state.len() as u32;
        config.validate()?;
        let grid = CountingSortGrid::new(config.grid()?);
        Ok(Self {
            config,
            state,
            grid,
        })
    }

    pub fn state(&self) -> &ParticleState {
        &self.state
    }

    pub fn grid(&self) -> &CountingSortGrid {
        &self.grid
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn clear(&mut self) {
        self.grid.clear();
    }

    pub fn build(&mut self) {
        self.grid.build(&self.state.positions);
    }

    /// Accumulate forces against the grid snapshot and integrate every particle.
    pub fn simulate(&mut self, frame: &FrameInput) {
        let dt = frame.sanitized_delta_time();
        let cfg = &self.config;
        let grid = &self.grid;

        let forces: Vec<Vec2> = (0..self.state.len())
            .map(|i| {
                let position = self.state.positions[i];
                let velocity = self.state.velocities[i];

                let mut force = cfg.gravity + drag_force(velocity, cfg.drag);
                if let Some(pointer) = &frame.pointer {
                    force += pointer_force(
                        position,
                        pointer,
                        cfg.interaction_radius,
                        cfg.interaction_strength,
                    );
                }
                grid.for_each_candidate(position, |j, neighbor| {
                    if j != i as u32 {
                        force += repulsion_force(
                            i as u32,
                            position,
                            j,
                            neighbor,
                            cfg.repulsion_radius,
                            cfg.repulsion_strength,
                        );
                    }
                });
                force
            })
            .collect();

        for ((position, velocity), force) in self
            .state
            .positions
            .iter_mut()
            .zip(self.state.velocities.iter_mut())
            .zip(forces)
        {
            (*position, *velocity) = integrate(*position, *velocity, force, dt);
        }
    }

    /// One full frame: clear → build → simulate.
    pub fn step(&mut self, frame: &FrameInput) {
        self.clear();
        self.build();
        self.simulate(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;

    fn layout() -> GridLayout {
        GridLayout::new(&Bounds::new(Vec2::ZERO, Vec2::new(4.0, 4.0)), 1.0).unwrap()
    }

    #[test]
    fn cells_are_contiguous_and_index_ordered() {
        let mut grid = CountingSortGrid::new(layout());
        let positions = vec![
            Vec2::new(0.5, 0.5),
            Vec2::new(-1.5, -1.5),
            Vec2::new(0.6, 0.6),
            Vec2::new(-1.4, -1.4),
            Vec2::new(0.7, 0.7),
        ];
        grid.build(&positions);

        let cell_a = layout().cell_hash(positions[0]);
        let cell_b = layout().cell_hash(positions[1]);
        assert_eq!(grid.cell_particles(cell_a), &[0, 2, 4]);
        assert_eq!(grid.cell_particles(cell_b), &[1, 3]);
        assert_eq!(*grid.cell_starts.last().unwrap(), 5);
        assert!(grid.cell_counts.iter().all(|&c| c == 0));
    }

    #[test]
    fn rebuild_after_clear_matches_fresh_build() {
        let positions: Vec<Vec2> = (0..50)
            .map(|i| Vec2::new((i % 7) as f32 * 0.5 - 1.9, (i % 5) as f32 * 0.7 - 1.9))
            .collect();
        let mut reused = CountingSortGrid::new(layout());
        reused.build(&positions);
        reused.clear();
        reused.build(&positions);

        let mut fresh = CountingSortGrid::new(layout());
        fresh.build(&positions);

        assert_eq!(reused.cell_starts, fresh.cell_starts);
        assert_eq!(reused.sorted_indices, fresh.sorted_indices);
    }

    #[test]
    fn with_state_overrides_particle_count() {
        let state = ParticleState::at_rest(vec![Vec2::ZERO; 3]);
        let sim = ReferenceSimulation::with_state(SwarmConfig::default(), state).unwrap();
        assert_eq!(sim.config().particle_count, 3);
    }

    #[test]
    fn empty_state_is_rejected() {
        let state = ParticleState::at_rest(Vec::new());
        assert!(matches!(
            ReferenceSimulation::with_state(SwarmConfig::default(), state),
            Err(ConfigError::EmptySwarm)
        ));
    }
}
