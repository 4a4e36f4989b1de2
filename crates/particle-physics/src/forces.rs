//! Force terms acting on a particle
//!
//! NOTE: These are reference implementations for documentation and testing.
//! The actual simulation runs `shaders/simulate.wgsl`, which implements the same
//! formulas term by term.

use glam::Vec2;

use crate::constants::DISTANCE_EPSILON;
use crate::Pointer;

/// Linear damping: `-velocity * drag`.
pub fn drag_force(velocity: Vec2, drag: f32) -> Vec2 {
    -velocity * drag
}

/// Pull toward (or push away from) the pointer, falling off linearly to zero at
/// `radius`. Zero outside the radius and finite at the pointer itself.
pub fn pointer_force(position: Vec2, pointer: &Pointer, radius: f32, strength: f32) -> Vec2 {
    let d = pointer.position - position;
    let dist = d.length();
    if dist >= radius {
        return Vec2::ZERO;
    }
    let falloff = 1.0 - dist / radius;
    d / dist.max(DISTANCE_EPSILON) * (strength * falloff * pointer.mode.sign())
}

/// Push on particle `i` away from neighbor `j`, falling off linearly to zero at
/// `radius`.
///
/// Coincident particles have no direction between them, so they are split along
/// the x axis by index order, which keeps the pair symmetric.
pub fn repulsion_force(
    i: u32,
    position_i: Vec2,
    j: u32,
    position_j: Vec2,
    radius: f32,
    strength: f32,
) -> Vec2 {
    let offset = position_i - position_j;
    let dist = offset.length();
    if dist >= radius {
        return Vec2::ZERO;
    }
    let dir = if dist < DISTANCE_EPSILON {
        if i > j {
            Vec2::X
        } else {
            Vec2::NEG_X
        }
    } else {
        offset / dist
    };
    dir * (strength * (1.0 - dist / radius))
}

/// Semi-implicit Euler: velocity first, then position with the new velocity.
pub fn integrate(position: Vec2, velocity: Vec2, force: Vec2, dt: f32) -> (Vec2, Vec2) {
    let velocity = velocity + force * dt;
    (position + velocity * dt, velocity)
}
