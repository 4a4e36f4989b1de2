//! Per-frame input supplied by the host

use glam::Vec2;

/// Whether the pointer pulls particles in or pushes them away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerMode {
    #[default]
    Attract,
    Repel,
}

impl PointerMode {
    pub fn sign(self) -> f32 {
        match self {
            PointerMode::Attract => 1.0,
            PointerMode::Repel => -1.0,
        }
    }
}

/// An active pointer in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub position: Vec2,
    pub mode: PointerMode,
}

impl Pointer {
    pub fn attract(position: Vec2) -> Self {
        Self {
            position,
            mode: PointerMode::Attract,
        }
    }

    pub fn repel(position: Vec2) -> Self {
        Self {
            position,
            mode: PointerMode::Repel,
        }
    }
}

/// Frame-varying input. `pointer: None` means no interaction this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub delta_time: f32,
    pub pointer: Option<Pointer>,
}

impl FrameInput {
    pub fn idle(delta_time: f32) -> Self {
        Self {
            delta_time,
            pointer: None,
        }
    }

    /// Delta-time as the kernels see it: negative or non-finite values become 0.
    pub fn sanitized_delta_time(&self) -> f32 {
        if self.delta_time.is_finite() {
            self.delta_time.max(0.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_delta_times_become_zero() {
        assert_eq!(FrameInput::idle(-1.0).sanitized_delta_time(), 0.0);
        assert_eq!(FrameInput::idle(f32::NAN).sanitized_delta_time(), 0.0);
        assert_eq!(FrameInput::idle(f32::INFINITY).sanitized_delta_time(), 0.0);
        assert_eq!(FrameInput::idle(0.016).sanitized_delta_time(), 0.016);
    }
}
