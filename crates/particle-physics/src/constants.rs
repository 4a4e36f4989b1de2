//! Default tuning values and shared numeric constants
//!
//! The force defaults are tuned for a 16x9 world viewed whole on screen, not for
//! physical realism.

/// Threads per workgroup for every compute stage
pub const WORKGROUP_SIZE: u32 = 256;

/// Distances below this are treated as coincident when normalizing directions.
/// Must match `EPSILON` in the WGSL kernels.
pub const DISTANCE_EPSILON: f32 = 1.0e-5;

pub const DEFAULT_PARTICLE_COUNT: u32 = 100_000;

/// Visual size of a particle in world units
pub const DEFAULT_PARTICLE_SIZE: f32 = 0.05;

pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -0.5];

/// Linear damping coefficient (a little friction)
pub const DEFAULT_DRAG: f32 = 0.1;

pub const DEFAULT_BOUNDS_SIZE: [f32; 2] = [16.0, 9.0];

/// Pointer influence radius
pub const DEFAULT_INTERACTION_RADIUS: f32 = 2.0;

/// Pointer pull at zero distance
pub const DEFAULT_INTERACTION_STRENGTH: f32 = 20.0;

/// Interaction cutoff between particles; also the grid cell size
pub const DEFAULT_REPULSION_RADIUS: f32 = 0.1;

pub const DEFAULT_REPULSION_STRENGTH: f32 = 5.0;

/// Frame delta-time ceiling, so a stalled window does not explode the swarm
pub const DEFAULT_MAX_DELTA_TIME: f32 = 1.0 / 30.0;
