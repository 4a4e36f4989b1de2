//! # Particle Renderer
//!
//! Draws the swarm from the simulation's GPU positions buffer.

pub mod camera;
pub mod renderer;

pub use camera::*;
pub use renderer::*;
