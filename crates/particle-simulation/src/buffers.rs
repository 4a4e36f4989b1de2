//! GPU buffers owned by the simulation

use bytemuck::{Pod, Zeroable};
use particle_physics::ParticleState;
use wgpu::util::DeviceExt;

use crate::{SimParams, SimulationError};

/// Matches `struct GridEntry` in `shaders/grid.wgsl`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GridEntry {
    pub cell_hash: u32,
    pub particle_index: u32,
}

const STATE_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::COPY_DST)
    .union(wgpu::BufferUsages::COPY_SRC);

const SCRATCH_USAGE: wgpu::BufferUsages =
    wgpu::BufferUsages::STORAGE.union(wgpu::BufferUsages::COPY_SRC);

/// Per-particle state. Positions are also bound by the renderer.
pub struct ParticleBuffers {
    pub positions: wgpu::Buffer,
    pub velocities: wgpu::Buffer,
}

impl ParticleBuffers {
    pub fn new(device: &wgpu::Device, state: &ParticleState) -> Self {
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Positions"),
            contents: bytemuck::cast_slice(&state.positions),
            usage: STATE_USAGE,
        });
        let velocities = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Velocities"),
            contents: bytemuck::cast_slice(&state.velocities),
            usage: STATE_USAGE,
        });
        Self {
            positions,
            velocities,
        }
    }

    /// Overwrite both buffers. `state` must hold the same particle count.
    pub fn upload(&self, queue: &wgpu::Queue, state: &ParticleState) {
        queue.write_buffer(&self.positions, 0, bytemuck::cast_slice(&state.positions));
        queue.write_buffer(&self.velocities, 0, bytemuck::cast_slice(&state.velocities));
    }

    pub fn destroy(&self) {
        self.positions.destroy();
        self.velocities.destroy();
    }
}

/// Counting-sort grid storage.
///
/// The offset tables are sized for `cell_capacity` cells, which may exceed the
/// current layout after a bounds change. Kernels only touch the first
/// `cell_count + 1` entries.
pub struct GridBuffers {
    pub entries: wgpu::Buffer,
    pub cell_counts: wgpu::Buffer,
    pub cell_starts: wgpu::Buffer,
    pub sorted_indices: wgpu::Buffer,
    pub sorted_positions: wgpu::Buffer,
    cell_capacity: u32,
}

impl GridBuffers {
    pub fn new(device: &wgpu::Device, particle_count: u32, cell_count: u32) -> Self {
        let n = particle_count as u64;
        let cells = cell_count as u64;
        let u32_size = std::mem::size_of::<u32>() as u64;

        let create = |label: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: SCRATCH_USAGE,
                mapped_at_creation: false,
            })
        };

        log::debug!("Allocating grid buffers for {cell_count} cells and {particle_count} particles");

        Self {
            entries: create("Grid Entries", n * std::mem::size_of::<GridEntry>() as u64),
            cell_counts: create("Grid Cell Counts", cells * u32_size),
            cell_starts: create("Grid Cell Starts", (cells + 1) * u32_size),
            sorted_indices: create("Grid Sorted Indices", n * u32_size),
            sorted_positions: create(
                "Grid Sorted Positions",
                n * 2 * std::mem::size_of::<f32>() as u64,
            ),
            cell_capacity: cell_count,
        }
    }

    pub fn cell_capacity(&self) -> u32 {
        self.cell_capacity
    }

    pub fn destroy(&self) {
        self.entries.destroy();
        self.cell_counts.destroy();
        self.cell_starts.destroy();
        self.sorted_indices.destroy();
        self.sorted_positions.destroy();
    }
}

/// Byte sizes of every storage buffer for a swarm of `particle_count`
/// particles over `cell_count` cells.
pub fn storage_sizes(particle_count: u32, cell_count: u32) -> [(&'static str, u64); 7] {
    let n = particle_count as u64;
    let cells = cell_count as u64;
    let vec2_size = 2 * std::mem::size_of::<f32>() as u64;
    let u32_size = std::mem::size_of::<u32>() as u64;
    [
        ("Particle Positions", n * vec2_size),
        ("Particle Velocities", n * vec2_size),
        ("Grid Entries", n * std::mem::size_of::<GridEntry>() as u64),
        ("Grid Cell Counts", cells * u32_size),
        ("Grid Cell Starts", (cells + 1) * u32_size),
        ("Grid Sorted Indices", n * u32_size),
        ("Grid Sorted Positions", n * vec2_size),
    ]
}

/// Reject layouts whose buffers the device cannot create or bind.
///
/// wgpu reports oversized buffers through the device error handler, which
/// panics, so this has to run before any allocation.
pub fn check_device_limits(
    limits: &wgpu::Limits,
    particle_count: u32,
    cell_count: u32,
) -> Result<(), SimulationError> {
    let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    for (buffer, size) in storage_sizes(particle_count, cell_count) {
        if size > limit {
            return Err(SimulationError::ExceedsDeviceLimits {
                buffer,
                size,
                limit,
            });
        }
    }
    Ok(())
}

pub fn create_params_buffer(device: &wgpu::Device, params: &SimParams) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Simulation Params"),
        contents: bytemuck::bytes_of(params),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}
