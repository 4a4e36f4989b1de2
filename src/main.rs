//! Particle Swarm
//!
//! A GPU particle swarm with gravity, drag, short-range repulsion and a cursor
//! that attracts (or, with the right mouse button held, repels) nearby particles.
//!
//! Usage: `particle-swarm [config.json]`

mod clock;
mod input;

use clock::FrameClock;
use glam::Vec2;
use input::PointerTracker;
use particle_physics::{FrameInput, SwarmConfig};
use particle_renderer::{Camera2D, ParticleRenderer};
use particle_simulation::ParticleSimulation;
use std::error::Error;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Step length for `.` while paused
const SINGLE_STEP: f32 = 1.0 / 60.0;

/// Prefer an sRGB format. An adapter that cannot present to the surface
/// reports empty lists.
fn surface_format_and_alpha(
    caps: &wgpu::SurfaceCapabilities,
) -> Result<(wgpu::TextureFormat, wgpu::CompositeAlphaMode), Box<dyn Error>> {
    let format = caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| caps.formats.first())
        .copied()
        .ok_or("surface reports no supported texture formats")?;
    let alpha_mode = caps
        .alpha_modes
        .first()
        .copied()
        .ok_or("surface reports no supported alpha modes")?;
    Ok((format, alpha_mode))
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    simulation: ParticleSimulation,
    renderer: ParticleRenderer,
    camera: Camera2D,
    clock: FrameClock,
}

impl GpuState {
    async fn new(window: Arc<Window>, swarm: &SwarmConfig) -> Result<Self, Box<dyn Error>> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        // Create device and queue
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        // Configure surface
        let (surface_format, alpha_mode) =
            surface_format_and_alpha(&surface.get_capabilities(&adapter))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Create simulation
        let simulation = ParticleSimulation::new(device.clone(), queue.clone(), swarm)?;
        log::info!("✓ Simulation initialized");

        // Create renderer
        let renderer =
            ParticleRenderer::new(&device, config.format, simulation.positions_buffer());
        log::info!("✓ Renderer initialized");

        let camera = Camera2D::fit(&swarm.bounds, config.width, config.height);
        let clock = FrameClock::new(swarm.max_delta_time);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            simulation,
            renderer,
            camera,
            clock,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.camera.resize(
                new_size.width,
                new_size.height,
                &self.simulation.config().bounds,
            );
            log::debug!("Resized to {}x{}", new_size.width, new_size.height);
        }
    }

    /// Advance (unless paused) and draw one frame.
    fn frame(
        &mut self,
        pointer: &PointerTracker,
        advance: Option<f32>,
    ) -> Result<(), wgpu::SurfaceError> {
        if let Some(delta_time) = advance {
            self.simulation.step(&FrameInput {
                delta_time,
                pointer: pointer.pointer(&self.camera),
            });
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &self.camera,
            self.simulation.particle_count(),
            self.simulation.config().particle_size,
        );

        output.present();
        Ok(())
    }
}

struct App {
    swarm: SwarmConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    pointer: PointerTracker,
    paused: bool,
    step_once: bool,
}

impl App {
    fn new(swarm: SwarmConfig) -> Self {
        Self {
            swarm,
            window: None,
            gpu_state: None,
            pointer: PointerTracker::default(),
            paused: false,
            step_once: false,
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space => {
                self.paused = !self.paused;
                log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
            }
            KeyCode::Period => {
                if self.paused {
                    self.step_once = true;
                }
            }
            KeyCode::KeyR => {
                if let Some(gpu_state) = &self.gpu_state {
                    gpu_state.simulation.reset(self.swarm.seed);
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Particle Swarm")
            .with_inner_size(winit::dpi::LogicalSize::new(1600, 900));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone(), &self.swarm)) {
            Ok(gpu_state) => {
                self.window = Some(window);
                self.gpu_state = Some(gpu_state);
            }
            Err(e) => {
                log::error!("Failed to initialize GPU: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, key),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.pointer
                    .cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => self.pointer.cursor_left(),

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => self.pointer.set_repel(state == ElementState::Pressed),

            WindowEvent::RedrawRequested => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    let delta_time = gpu_state.clock.tick();
                    let advance = if !self.paused {
                        Some(delta_time)
                    } else if std::mem::take(&mut self.step_once) {
                        Some(SINGLE_STEP)
                    } else {
                        None
                    };

                    match gpu_state.frame(&self.pointer, advance) {
                        Ok(()) => {
                            window.set_title(&format!(
                                "Particle Swarm - {:.0} FPS ({:.2}ms) - {} particles{}",
                                gpu_state.clock.fps(),
                                gpu_state.clock.average_frame_time_ms(),
                                gpu_state.simulation.particle_count(),
                                if self.paused { " - paused" } else { "" }
                            ));
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu_state.resize(window.inner_size())
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::warn!("Render error: {e:?}"),
                    }
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu_state) = self.gpu_state.take() {
            gpu_state.simulation.release();
        }
    }
}

fn load_config() -> Result<SwarmConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(SwarmConfig::load(path)?),
        None => {
            let config = SwarmConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn main() {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle swarm...");

    let swarm = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(swarm);

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
        std::process::exit(1);
    }
}
