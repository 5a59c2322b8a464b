// SPDX-License-Identifier: GPL-3.0-only

//! Shared GPU processor infrastructure
//!
//! Provides common functionality for the compute stages:
//! - Thread-group sizing from hardware limits
//! - Workgroup dispatch calculations
//! - Async buffer readback utilities

use crate::errors::FrameError;
use crate::gpu::wgpu;

/// Threads per workgroup along x and y
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadGroupSize {
    pub width: u32,
    pub height: u32,
}

impl ThreadGroupSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Derive a group from the preferred execution width and the maximum
    /// number of threads per group.
    ///
    /// `height = max(1, max_threads / preferred_width)`, which keeps
    /// `width * height <= max_threads` whenever `preferred_width <= max_threads`.
    pub fn from_limits(preferred_width: u32, max_threads_per_group: u32) -> Self {
        let width = preferred_width.max(1);
        let height = (max_threads_per_group / width).max(1);
        Self { width, height }
    }

    /// Clamp each axis to the device's per-dimension limits
    pub fn clamped(self, max_width: u32, max_height: u32) -> Self {
        Self::new(self.width.min(max_width), self.height.min(max_height))
    }

    /// Total threads in one group
    pub fn threads(&self) -> u32 {
        self.width * self.height
    }
}

/// Thread grid of a dispatch, one thread per output pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGrid {
    pub width: u32,
    pub height: u32,
}

impl DispatchGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Workgroups needed along (x, y) to cover every thread of the grid
    pub fn workgroups(&self, group: ThreadGroupSize) -> (u32, u32) {
        (
            compute_dispatch_size(self.width, group.width),
            compute_dispatch_size(self.height, group.height),
        )
    }
}

/// Helper for async buffer readback (map, poll, read, unmap)
///
/// # Arguments
/// * `device` - The wgpu device for polling
/// * `buffer` - The buffer to read from (must be MAP_READ)
///
/// # Returns
/// The buffer contents as a Vec<u8>
pub async fn read_buffer_async(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
) -> Result<Vec<u8>, FrameError> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    let _ = device.poll(wgpu::PollType::wait_indefinitely());

    receiver
        .await
        .map_err(|_| FrameError::Readback("mapping callback dropped".to_string()))?
        .map_err(|e| FrameError::Readback(format!("failed to map buffer: {:?}", e)))?;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();

    Ok(data)
}

/// Calculate compute shader dispatch size (workgroups needed)
///
/// Given a dimension and workgroup size, returns the number of workgroups
/// needed to cover the entire dimension.
#[inline]
pub fn compute_dispatch_size(dimension: u32, workgroup_size: u32) -> u32 {
    dimension.div_ceil(workgroup_size.max(1))
}
