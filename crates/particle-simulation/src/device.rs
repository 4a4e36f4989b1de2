//! Device acquisition without a window, for tests and offline runs

use crate::SimulationError;

/// Request a high-performance adapter and device with no surface attached.
pub async fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue), SimulationError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await?;

    log::info!("Using GPU: {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Headless Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;

    Ok((device, queue))
}

/// Blocking variant of [`request_headless_device`].
pub fn headless_device() -> Result<(wgpu::Device, wgpu::Queue), SimulationError> {
    pollster::block_on(request_headless_device())
}
