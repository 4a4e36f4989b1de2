//! Frame timing

use std::collections::VecDeque;
use std::time::Instant;

/// Frames averaged for the FPS readout.
const FPS_WINDOW: usize = 60;

/// Delta-time source for the simulation, clamped so a hitch (window drag,
/// breakpoint, slow first frame) cannot launch particles across the bounds.
pub struct FrameClock {
    last_frame_time: Instant,
    max_delta_time: f32,
    frame_times: VecDeque<f32>,
}

impl FrameClock {
    pub fn new(max_delta_time: f32) -> Self {
        Self {
            last_frame_time: Instant::now(),
            max_delta_time,
            frame_times: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// Seconds since the previous tick, clamped.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.record(elapsed)
    }

    fn record(&mut self, elapsed: f32) -> f32 {
        if self.frame_times.len() == FPS_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(elapsed);

        let dt = clamp_delta(elapsed, self.max_delta_time);
        if dt < elapsed {
            log::warn!(
                "Frame took {:.1}ms, clamping step to {:.1}ms",
                elapsed * 1000.0,
                dt * 1000.0
            );
        }
        dt
    }

    /// Average milliseconds per frame over the recent window
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32 * 1000.0
    }

    pub fn fps(&self) -> f32 {
        let ms = self.average_frame_time_ms();
        if ms > 0.0 {
            1000.0 / ms
        } else {
            0.0
        }
    }
}

pub fn clamp_delta(elapsed: f32, max_delta_time: f32) -> f32 {
    if elapsed.is_finite() {
        elapsed.clamp(0.0, max_delta_time)
    } else {
        0.0
    }
}
