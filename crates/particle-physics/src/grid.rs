//! Uniform grid layout shared by the CPU reference and the GPU kernels
//!
//! The cell size equals the repulsion radius, so every neighbor within range of a
//! particle lives in the 3x3 block of cells around the particle's own cell.

use glam::{UVec2, Vec2};

use crate::{Bounds, ConfigError};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    /// World position of the lower-left corner of cell (0, 0)
    pub origin: Vec2,
    pub cell_size: f32,
    pub width: u32,
    pub height: u32,
}

impl GridLayout {
    pub fn new(bounds: &Bounds, cell_size: f32) -> Result<Self, ConfigError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::InvalidRepulsionRadius(cell_size));
        }
        bounds.validate()?;

        let cells = (bounds.size / cell_size).ceil().max(Vec2::ONE);
        let (width, height) = (cells.x as u64, cells.y as u64);
        // One extra slot is needed for the closing prefix-sum entry.
        if cells.x >= u32::MAX as f32
            || cells.y >= u32::MAX as f32
            || width * height >= u32::MAX as u64
        {
            return Err(ConfigError::GridTooLarge { width, height });
        }

        Ok(Self {
            origin: bounds.min(),
            cell_size,
            width: width as u32,
            height: height as u32,
        })
    }

    pub fn cell_count(&self) -> u32 {
        self.width * self.height
    }

    /// Cell coordinates for a position, clamped into the grid.
    ///
    /// NaN positions land in cell (0, 0).
    pub fn cell_coords(&self, position: Vec2) -> UVec2 {
        let cell = ((position - self.origin) / self.cell_size).floor();
        let max = Vec2::new((self.width - 1) as f32, (self.height - 1) as f32);
        // `max`/`min` on f32 discard NaN operands, so NaN clamps to zero.
        let x = cell.x.max(0.0).min(max.x);
        let y = cell.y.max(0.0).min(max.y);
        UVec2::new(x as u32, y as u32)
    }

    pub fn linear_index(&self, coords: UVec2) -> u32 {
        coords.y * self.width + coords.x
    }

    pub fn cell_hash(&self, position: Vec2) -> u32 {
        self.linear_index(self.cell_coords(position))
    }

    /// The up-to-nine in-grid cells centered on `coords`, row by row.
    pub fn neighborhood(&self, coords: UVec2) -> impl Iterator<Item = u32> + '_ {
        let x0 = coords.x.saturating_sub(1);
        let x1 = (coords.x + 1).min(self.width - 1);
        let y0 = coords.y.saturating_sub(1);
        let y1 = (coords.y + 1).min(self.height - 1);
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| y * self.width + x))
    }
}
