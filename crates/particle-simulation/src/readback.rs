//! Blocking buffer reads for tests and diagnostics
//!
//! Never called from the frame loop.

use bytemuck::Pod;
use glam::Vec2;

use crate::SimulationError;

/// Copy `len` elements of `source` into a staging buffer and wait for the map.
pub fn read_buffer<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    len: usize,
) -> Result<Vec<T>, SimulationError> {
    let size = (len * std::mem::size_of::<T>()) as u64;
    if size == 0 {
        return Ok(Vec::new());
    }

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    })?;

    rx.recv().map_err(|_| SimulationError::ReadbackAborted)??;

    let data = slice.get_mapped_range();
    let values = bytemuck::cast_slice::<u8, T>(&data).to_vec();
    drop(data);
    staging.unmap();
    staging.destroy();

    Ok(values)
}

/// Host copy of the grid after a build.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSnapshot {
    /// `cell_count + 1` entries; the last equals the particle count
    pub cell_starts: Vec<u32>,
    pub sorted_indices: Vec<u32>,
    pub sorted_positions: Vec<Vec2>,
}

impl GridSnapshot {
    pub fn cell_count(&self) -> u32 {
        self.cell_starts.len().saturating_sub(1) as u32
    }

    pub fn cell_particles(&self, cell: u32) -> &[u32] {
        let c = cell as usize;
        &self.sorted_indices[self.cell_starts[c] as usize..self.cell_starts[c + 1] as usize]
    }
}
