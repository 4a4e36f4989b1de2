//! Cursor state to per-frame pointer input

use glam::Vec2;
use particle_physics::Pointer;
use particle_renderer::Camera2D;

/// Tracks where the cursor is and whether it should push or pull.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerTracker {
    /// Physical pixels, `None` while the cursor is outside the window
    cursor: Option<Vec2>,
    repel: bool,
}

impl PointerTracker {
    pub fn cursor_moved(&mut self, position: Vec2) {
        self.cursor = Some(position);
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
    }

    pub fn set_repel(&mut self, repel: bool) {
        self.repel = repel;
    }

    /// World-space pointer for this frame.
    pub fn pointer(&self, camera: &Camera2D) -> Option<Pointer> {
        let position = camera.screen_to_world(self.cursor?);
        Some(if self.repel {
            Pointer::repel(position)
        } else {
            Pointer::attract(position)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_physics::{Bounds, PointerMode};

    fn camera() -> Camera2D {
        Camera2D::fit(&Bounds::new(Vec2::ZERO, Vec2::new(16.0, 9.0)), 1600, 900)
    }

    #[test]
    fn no_cursor_means_no_pointer() {
        let mut tracker = PointerTracker::default();
        assert_eq!(tracker.pointer(&camera()), None);

        tracker.cursor_moved(Vec2::new(800.0, 450.0));
        assert!(tracker.pointer(&camera()).is_some());

        tracker.cursor_left();
        assert_eq!(tracker.pointer(&camera()), None);
    }

    #[test]
    fn right_button_switches_to_repel() {
        let mut tracker = PointerTracker::default();
        tracker.cursor_moved(Vec2::new(800.0, 450.0));

        let pointer = tracker.pointer(&camera()).unwrap();
        assert_eq!(pointer.mode, PointerMode::Attract);
        assert!(pointer.position.abs_diff_eq(Vec2::ZERO, 1e-5));

        tracker.set_repel(true);
        assert_eq!(tracker.pointer(&camera()).unwrap().mode, PointerMode::Repel);
    }
}
