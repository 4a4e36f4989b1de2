//! Simulation uniform, rewritten every frame

use bytemuck::{Pod, Zeroable};
use particle_physics::{FrameInput, GridLayout, SwarmConfig};

/// Matches `struct SimParams` in `shaders/common.wgsl`. 80 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    pub gravity: [f32; 2],
    pub pointer: [f32; 2],
    pub grid_origin: [f32; 2],
    pub bounds_max: [f32; 2],

    pub delta_time: f32,
    pub drag: f32,
    pub interaction_radius: f32,
    /// Already multiplied by the pointer mode sign
    pub interaction_strength: f32,

    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub cell_size: f32,
    /// 0 when there is no pointer this frame
    pub pointer_active: u32,

    pub grid_width: u32,
    pub grid_height: u32,
    pub particle_count: u32,
    pub cell_count: u32,
}

impl SimParams {
    pub fn new(
        config: &SwarmConfig,
        grid: &GridLayout,
        particle_count: u32,
        frame: &FrameInput,
    ) -> Self {
        let (pointer, pointer_active, sign) = match frame.pointer {
            Some(p) => (p.position.to_array(), 1, p.mode.sign()),
            None => ([0.0; 2], 0, 0.0),
        };

        Self {
            gravity: config.gravity.to_array(),
            pointer,
            grid_origin: grid.origin.to_array(),
            bounds_max: config.bounds.max().to_array(),
            delta_time: frame.sanitized_delta_time(),
            drag: config.drag,
            interaction_radius: config.interaction_radius,
            interaction_strength: config.interaction_strength * sign,
            repulsion_radius: config.repulsion_radius,
            repulsion_strength: config.repulsion_strength,
            cell_size: grid.cell_size,
            pointer_active,
            grid_width: grid.width,
            grid_height: grid.height,
            particle_count,
            cell_count: grid.cell_count(),
        }
    }
}
