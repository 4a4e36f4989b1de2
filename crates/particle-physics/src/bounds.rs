//! Axis-aligned simulation bounds

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Rectangle the swarm is spawned into and the grid is laid over.
///
/// Bounds are advisory: particles may drift outside them, in which case the grid
/// clamps them into the nearest border cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec2,
    pub size: Vec2,
}

impl Bounds {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            size: max - min,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Rejects NaN, infinite, and zero/negative extents.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min(), self.max());
        let ok = min.is_finite() && max.is_finite() && min.x < max.x && min.y < max.y;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::DegenerateBounds {
                min: min.to_array(),
                max: max.to_array(),
            })
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            size: Vec2::new(16.0, 9.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_are_half_size_from_center() {
        let b = Bounds::new(Vec2::new(1.0, -1.0), Vec2::new(4.0, 2.0));
        assert_eq!(b.min(), Vec2::new(-1.0, -2.0));
        assert_eq!(b.max(), Vec2::new(3.0, 0.0));
        assert_eq!(Bounds::from_min_max(b.min(), b.max()), b);
    }

    #[test]
    fn zero_width_is_rejected() {
        let b = Bounds::new(Vec2::ZERO, Vec2::new(0.0, 5.0));
        assert!(matches!(
            b.validate(),
            Err(ConfigError::DegenerateBounds { .. })
        ));
        let b = Bounds::new(Vec2::ZERO, Vec2::new(f32::NAN, 5.0));
        assert!(b.validate().is_err());
    }
}
