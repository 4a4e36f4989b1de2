//! # Particle Simulation Engine
//!
//! GPU particle swarm built on wgpu compute shaders: a counting-sort uniform
//! grid for neighbor search, short-range repulsion, gravity, drag and a
//! pointer force, integrated with semi-implicit Euler.

pub mod buffers;
pub mod device;
pub mod error;
pub mod params;
pub mod readback;
pub mod simulation;
pub mod stage;

pub use device::*;
pub use error::*;
pub use params::*;
pub use readback::GridSnapshot;
pub use simulation::*;
pub use stage::*;
