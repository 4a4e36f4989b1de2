//! GPU-based particle swarm simulation
//!
//! Every frame runs three stages as separate compute passes inside one
//! submission: clear the grid tables, counting-sort the particles into cells,
//! then accumulate forces and integrate. Pass boundaries are the only
//! synchronization the kernels rely on.

use glam::Vec2;
use particle_physics::{Bounds, FrameInput, GridLayout, ParticleState, SwarmConfig};

use crate::buffers::{check_device_limits, create_params_buffer, GridBuffers, ParticleBuffers};
use crate::readback::{read_buffer, GridSnapshot};
use crate::stage::{workgroups_for, Stage};
use crate::{SimParams, SimulationError};

const GRID_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/grid.wgsl")
);

const SIMULATE_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/simulate.wgsl")
);

fn bgl_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn bgl_uniform(binding: u32) -> wgpu::BindGroupLayoutEntry {
    bgl_entry(binding, wgpu::BufferBindingType::Uniform)
}

fn bgl_storage_ro(binding: u32) -> wgpu::BindGroupLayoutEntry {
    bgl_entry(binding, wgpu::BufferBindingType::Storage { read_only: true })
}

fn bgl_storage_rw(binding: u32) -> wgpu::BindGroupLayoutEntry {
    bgl_entry(binding, wgpu::BufferBindingType::Storage { read_only: false })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    entry_point: &str,
    label: &str,
) -> wgpu::ComputePipeline {
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

/// Compute pipelines for the grid build, one per kernel
struct GridPipelines {
    clear: wgpu::ComputePipeline,
    count: wgpu::ComputePipeline,
    prefix_sum: wgpu::ComputePipeline,
    scatter: wgpu::ComputePipeline,
    order: wgpu::ComputePipeline,
}

/// GPU particle swarm.
///
/// Owns every simulation buffer. The renderer borrows [`positions_buffer`](Self::positions_buffer).
pub struct ParticleSimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,

    config: SwarmConfig,
    layout: GridLayout,
    particle_count: u32,

    // Buffers
    particles: ParticleBuffers,
    grid: GridBuffers,
    params_buffer: wgpu::Buffer,

    // Compute pipelines
    grid_pipelines: GridPipelines,
    simulate_pipeline: wgpu::ComputePipeline,

    // Bind groups
    grid_bind_group_layout: wgpu::BindGroupLayout,
    simulate_bind_group_layout: wgpu::BindGroupLayout,
    grid_bind_group: wgpu::BindGroup,
    simulate_bind_group: wgpu::BindGroup,
}

impl ParticleSimulation {
    /// Validate `config`, place particles at rest inside its bounds and build
    /// every pipeline.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: &SwarmConfig,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let state = ParticleState::initialize_seeded(
            config.particle_count as usize,
            &config.bounds,
            config.seed,
        );
        Self::with_state(device, queue, config, &state)
    }

    /// Start from explicit particle state. `config.particle_count` is replaced
    /// by the state's length.
    pub fn with_state(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: &SwarmConfig,
        state: &ParticleState,
    ) -> Result<Self, SimulationError> {
        log::info!("Initializing ParticleSimulation...");

        let config = SwarmConfig {
            particle_count: state.len() as u32,
            ..config.clone()
        };
        config.validate()?;
        let layout = config.grid()?;
        let particle_count = config.particle_count;

        log::info!(
            "{} particles, {}x{} grid with cell size {}",
            particle_count,
            layout.width,
            layout.height,
            layout.cell_size
        );

        // Buffers
        check_device_limits(&device.limits(), particle_count, layout.cell_count())?;
        let particles = ParticleBuffers::new(&device, state);
        let grid = GridBuffers::new(&device, particle_count, layout.cell_count());
        let params = SimParams::new(&config, &layout, particle_count, &FrameInput::default());
        let params_buffer = create_params_buffer(&device, &params);

        log::info!("Buffers created");

        // Shaders
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Grid Build Shader"),
            source: wgpu::ShaderSource::Wgsl(GRID_SHADER.into()),
        });
        let simulate_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Simulate Shader"),
            source: wgpu::ShaderSource::Wgsl(SIMULATE_SHADER.into()),
        });

        log::info!("Shaders loaded");

        // Bind group layouts
        let grid_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Grid Bind Group Layout"),
                entries: &[
                    bgl_uniform(0),
                    bgl_storage_ro(1),
                    bgl_storage_rw(2),
                    bgl_storage_rw(3),
                    bgl_storage_rw(4),
                    bgl_storage_rw(5),
                    bgl_storage_rw(6),
                ],
            });

        let simulate_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Simulate Bind Group Layout"),
                entries: &[
                    bgl_uniform(0),
                    bgl_storage_rw(1),
                    bgl_storage_rw(2),
                    bgl_storage_ro(3),
                    bgl_storage_ro(4),
                    bgl_storage_ro(5),
                ],
            });

        // Pipelines
        let grid_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Grid Pipeline Layout"),
            bind_group_layouts: &[&grid_bind_group_layout],
            push_constant_ranges: &[],
        });
        let simulate_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Simulate Pipeline Layout"),
                bind_group_layouts: &[&simulate_bind_group_layout],
                push_constant_ranges: &[],
            });

        let grid_pipelines = GridPipelines {
            clear: create_pipeline(
                &device,
                &grid_pipeline_layout,
                &grid_shader,
                "clear",
                "Grid Clear Pipeline",
            ),
            count: create_pipeline(
                &device,
                &grid_pipeline_layout,
                &grid_shader,
                "count",
                "Grid Count Pipeline",
            ),
            prefix_sum: create_pipeline(
                &device,
                &grid_pipeline_layout,
                &grid_shader,
                "prefix_sum",
                "Grid Prefix Sum Pipeline",
            ),
            scatter: create_pipeline(
                &device,
                &grid_pipeline_layout,
                &grid_shader,
                "scatter",
                "Grid Scatter Pipeline",
            ),
            order: create_pipeline(
                &device,
                &grid_pipeline_layout,
                &grid_shader,
                "order",
                "Grid Order Pipeline",
            ),
        };
        let simulate_pipeline = create_pipeline(
            &device,
            &simulate_pipeline_layout,
            &simulate_shader,
            "main",
            "Simulate Pipeline",
        );

        log::info!("Pipelines created");

        let grid_bind_group = create_grid_bind_group(
            &device,
            &grid_bind_group_layout,
            &params_buffer,
            &particles,
            &grid,
        );
        let simulate_bind_group = create_simulate_bind_group(
            &device,
            &simulate_bind_group_layout,
            &params_buffer,
            &particles,
            &grid,
        );

        log::info!("Bind groups created");

        Ok(Self {
            device,
            queue,
            config,
            layout,
            particle_count,
            particles,
            grid,
            params_buffer,
            grid_pipelines,
            simulate_pipeline,
            grid_bind_group_layout,
            simulate_bind_group_layout,
            grid_bind_group,
            simulate_bind_group,
        })
    }

    /// Advance the swarm by one frame. Does not wait for the GPU.
    pub fn step(&self, frame: &FrameInput) {
        self.write_params(frame);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Simulation Encoder"),
            });

        for stage in Stage::ORDER {
            self.encode_stage(stage, &mut encoder);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Upload the uniform for the next submission.
    pub fn write_params(&self, frame: &FrameInput) {
        let params = SimParams::new(&self.config, &self.layout, self.particle_count, frame);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }

    pub fn encode_stage(&self, stage: Stage, encoder: &mut wgpu::CommandEncoder) {
        match stage {
            Stage::Clear => self.encode_clear(encoder),
            Stage::Build => self.encode_build(encoder),
            Stage::Simulate => self.encode_simulate(encoder),
        }
    }

    /// Zero the cell counts and starts, including the closing start entry.
    pub fn encode_clear(&self, encoder: &mut wgpu::CommandEncoder) {
        let cells = self.layout.cell_count() + 1;
        self.dispatch(
            encoder,
            &self.grid_pipelines.clear,
            &self.grid_bind_group,
            workgroups_for(cells),
            "Grid Clear Pass",
        );
    }

    /// Counting sort: count, prefix sum, scatter, then per-cell ordering.
    pub fn encode_build(&self, encoder: &mut wgpu::CommandEncoder) {
        let particle_groups = workgroups_for(self.particle_count);
        let cell_groups = workgroups_for(self.layout.cell_count());
        let pipelines = &self.grid_pipelines;
        let bind_group = &self.grid_bind_group;

        // Step 1: Count particles per cell
        self.dispatch(
            encoder,
            &pipelines.count,
            bind_group,
            particle_groups,
            "Grid Count Pass",
        );

        // Step 2: Exclusive scan into cell starts
        self.dispatch(
            encoder,
            &pipelines.prefix_sum,
            bind_group,
            1,
            "Grid Prefix Sum Pass",
        );

        // Step 3: Scatter particle indices into their cell ranges
        self.dispatch(
            encoder,
            &pipelines.scatter,
            bind_group,
            particle_groups,
            "Grid Scatter Pass",
        );

        // Step 4: Order each cell by index and snapshot positions
        self.dispatch(
            encoder,
            &pipelines.order,
            bind_group,
            cell_groups,
            "Grid Order Pass",
        );
    }

    pub fn encode_simulate(&self, encoder: &mut wgpu::CommandEncoder) {
        self.dispatch(
            encoder,
            &self.simulate_pipeline,
            &self.simulate_bind_group,
            workgroups_for(self.particle_count),
            "Simulate Pass",
        );
    }

    fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        workgroups: u32,
        label: &str,
    ) {
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(pipeline);
        compute_pass.set_bind_group(0, bind_group, &[]);
        compute_pass.dispatch_workgroups(workgroups, 1, 1);
    }

    /// Scatter the particles afresh inside the current bounds, at rest.
    pub fn reset(&self, seed: Option<u64>) {
        let state = ParticleState::initialize_seeded(
            self.particle_count as usize,
            &self.config.bounds,
            seed,
        );
        self.particles.upload(&self.queue, &state);
        log::debug!("Reset {} particles (seed {:?})", self.particle_count, seed);
    }

    /// Replace positions and velocities wholesale.
    pub fn upload_state(&self, state: &ParticleState) -> Result<(), SimulationError> {
        if state.len() != self.particle_count as usize {
            return Err(SimulationError::ParticleCountMismatch {
                expected: self.particle_count,
                got: state.len(),
            });
        }
        self.particles.upload(&self.queue, state);
        Ok(())
    }

    /// Move the simulation bounds. Grid storage is reallocated only when the
    /// new layout needs more cells than are already allocated.
    pub fn set_bounds(&mut self, bounds: Bounds) -> Result<(), SimulationError> {
        bounds.validate()?;
        let layout = GridLayout::new(&bounds, self.config.repulsion_radius)?;

        if layout.cell_count() > self.grid.cell_capacity() {
            check_device_limits(
                &self.device.limits(),
                self.particle_count,
                layout.cell_count(),
            )?;
            log::debug!(
                "Grid grows from {} to {} cells, reallocating",
                self.grid.cell_capacity(),
                layout.cell_count()
            );
            let grid = GridBuffers::new(&self.device, self.particle_count, layout.cell_count());
            self.grid_bind_group = create_grid_bind_group(
                &self.device,
                &self.grid_bind_group_layout,
                &self.params_buffer,
                &self.particles,
                &grid,
            );
            self.simulate_bind_group = create_simulate_bind_group(
                &self.device,
                &self.simulate_bind_group_layout,
                &self.params_buffer,
                &self.particles,
                &grid,
            );
            std::mem::replace(&mut self.grid, grid).destroy();
        }

        log::debug!(
            "Bounds set to center {} size {} ({}x{} cells)",
            bounds.center,
            bounds.size,
            layout.width,
            layout.height
        );
        self.config.bounds = bounds;
        self.layout = layout;
        Ok(())
    }

    /// Positions buffer, `array<vec2<f32>>` of [`particle_count`](Self::particle_count) entries.
    pub fn positions_buffer(&self) -> &wgpu::Buffer {
        &self.particles.positions
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn grid_layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Blocking copy of all positions.
    pub fn read_positions(&self) -> Result<Vec<Vec2>, SimulationError> {
        read_buffer(
            &self.device,
            &self.queue,
            &self.particles.positions,
            self.particle_count as usize,
        )
    }

    /// Blocking copy of all velocities.
    pub fn read_velocities(&self) -> Result<Vec<Vec2>, SimulationError> {
        read_buffer(
            &self.device,
            &self.queue,
            &self.particles.velocities,
            self.particle_count as usize,
        )
    }

    /// Blocking copy of the grid as left by the most recent build.
    pub fn read_grid(&self) -> Result<GridSnapshot, SimulationError> {
        let n = self.particle_count as usize;
        let cell_starts = read_buffer(
            &self.device,
            &self.queue,
            &self.grid.cell_starts,
            self.layout.cell_count() as usize + 1,
        )?;
        let sorted_indices = read_buffer(&self.device, &self.queue, &self.grid.sorted_indices, n)?;
        let sorted_positions =
            read_buffer(&self.device, &self.queue, &self.grid.sorted_positions, n)?;
        Ok(GridSnapshot {
            cell_starts,
            sorted_indices,
            sorted_positions,
        })
    }

    /// Free every GPU buffer now instead of waiting for drop.
    pub fn release(self) {
        self.particles.destroy();
        self.grid.destroy();
        self.params_buffer.destroy();
        log::info!("Released simulation buffers");
    }
}

fn create_grid_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    params: &wgpu::Buffer,
    particles: &ParticleBuffers,
    grid: &GridBuffers,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Grid Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: particles.positions.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: grid.entries.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: grid.cell_counts.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: grid.cell_starts.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: grid.sorted_indices.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: grid.sorted_positions.as_entire_binding(),
            },
        ],
    })
}

fn create_simulate_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    params: &wgpu::Buffer,
    particles: &ParticleBuffers,
    grid: &GridBuffers,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Simulate Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: particles.positions.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: particles.velocities.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: grid.cell_starts.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: grid.sorted_indices.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: grid.sorted_positions.as_entire_binding(),
            },
        ],
    })
}
