// SPDX-License-Identifier: GPL-3.0-only

//! GPU initialization utilities for compute pipelines.
//!
//! Applications that already own a device pass it to
//! [`WgpuBackend::new`](crate::shaders::WgpuBackend::new) directly; this
//! module only covers standalone use (the CLI and GPU tests).

use crate::errors::SetupError;
use std::sync::Arc;
use tracing::{debug, info};

/// Re-export so callers build against the same wgpu version
pub use wgpu;

/// Information about the created GPU device
#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, DX12, etc.)
    pub backend: wgpu::Backend,
    /// Kind of adapter (discrete, integrated, CPU)
    pub device_type: wgpu::DeviceType,
}

/// Create a wgpu device and queue for compute work.
///
/// # Arguments
///
/// * `label` - A label for the device (for debugging)
///
/// # Returns
///
/// A tuple of (Device, Queue, GpuDeviceInfo)
pub async fn create_compute_device(
    label: &str,
) -> Result<(Arc<wgpu::Device>, Arc<wgpu::Queue>, GpuDeviceInfo), SetupError> {
    info!(label = label, "Creating GPU device for compute");

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| SetupError::AdapterUnavailable(e.to_string()))?;

    let adapter_info = adapter.get_info();
    let adapter_limits = adapter.limits();

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        device_type = ?adapter_info.device_type,
        "GPU adapter selected for compute"
    );

    debug!(
        max_invocations = adapter_limits.max_compute_invocations_per_workgroup,
        max_size_x = adapter_limits.max_compute_workgroup_size_x,
        max_size_y = adapter_limits.max_compute_workgroup_size_y,
        max_texture = adapter_limits.max_texture_dimension_2d,
        "Adapter compute limits"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: adapter_limits,
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .map_err(|e| SetupError::DeviceCreation(e.to_string()))?;

    let info = GpuDeviceInfo {
        adapter_name: adapter_info.name,
        backend: adapter_info.backend,
        device_type: adapter_info.device_type,
    };

    Ok((Arc::new(device), Arc::new(queue), info))
}
