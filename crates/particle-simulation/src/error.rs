//! Simulation errors

use particle_physics::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("buffer readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("readback callback was dropped before completing")]
    ReadbackAborted,

    #[error("{buffer} needs {size} bytes, device allows {limit}")]
    ExceedsDeviceLimits {
        buffer: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("particle state has {got} particles, simulation holds {expected}")]
    ParticleCountMismatch { expected: u32, got: usize },
}
