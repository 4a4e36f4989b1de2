//! Orthographic camera for the 2D swarm

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};
use particle_physics::Bounds;

/// Camera uniform for GPU. Matches `struct Camera` in `shaders/particle.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Linear RGBA particle color
    pub color: [f32; 4],
    /// Quad edge length in world units
    pub particle_size: f32,
    pub _padding: [f32; 3],
}

/// Fraction of the bounds added on every side when fitting.
const FIT_MARGIN: f32 = 0.05;

/// Axis-aligned orthographic view onto the simulation plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera2D {
    pub center: Vec2,
    /// World units from the center to the top edge of the viewport
    pub half_height: f32,
    pub viewport: Vec2,
}

impl Camera2D {
    /// Camera showing all of `bounds` in a `width` x `height` pixel viewport.
    pub fn fit(bounds: &Bounds, width: u32, height: u32) -> Self {
        let mut camera = Self {
            center: bounds.center,
            half_height: 1.0,
            viewport: Vec2::new(width.max(1) as f32, height.max(1) as f32),
        };
        camera.fit_bounds(bounds);
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.x / self.viewport.y
    }

    pub fn fit_bounds(&mut self, bounds: &Bounds) {
        let half = bounds.size * (0.5 + FIT_MARGIN);
        self.center = bounds.center;
        self.half_height = half.y.max(half.x / self.aspect());
    }

    pub fn resize(&mut self, width: u32, height: u32, bounds: &Bounds) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        self.fit_bounds(bounds);
    }

    pub fn half_extent(&self) -> Vec2 {
        Vec2::new(self.half_height * self.aspect(), self.half_height)
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let min = self.center - self.half_extent();
        let max = self.center + self.half_extent();
        Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -1.0, 1.0)
    }

    /// Window pixel coordinates (origin top-left, y down) to world space.
    pub fn screen_to_world(&self, cursor: Vec2) -> Vec2 {
        let ndc = Vec2::new(
            cursor.x / self.viewport.x * 2.0 - 1.0,
            1.0 - cursor.y / self.viewport.y * 2.0,
        );
        self.center + ndc * self.half_extent()
    }

    pub fn to_uniform(&self, particle_size: f32, color: [f32; 4]) -> CameraUniform {
        CameraUniform {
            view_proj: self.build_view_projection_matrix().to_cols_array_2d(),
            color,
            particle_size,
            _padding: [0.0; 3],
        }
    }
}
