//! # Particle Physics
//!
//! Domain types for the particle swarm: configuration, bounds, the uniform grid
//! layout, particle state and the force terms. The `reference` module holds a
//! CPU pipeline that mirrors the GPU kernels stage for stage.

pub mod bounds;
pub mod config;
pub mod constants;
pub mod error;
pub mod forces;
pub mod frame;
pub mod grid;
pub mod particle;
pub mod reference;

pub use bounds::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use grid::*;
pub use particle::*;
