// SPDX-License-Identifier: GPL-3.0-only
//! Compute stages and the shared GPU plumbing they run on
//!
//! Each stage owns a compiled kernel and a triple-buffered [`TexturePool`].
//! Kernel sources are WGSL templates: the storage format and workgroup size
//! are substituted once the device limits are known, then the result is
//! validated with naga before any pipeline is created.

pub mod backend;
pub mod compute_stage;
pub mod gpu_processor;
pub mod smoothing;
pub mod texture_pool;
pub mod upscale;
pub mod wgpu_backend;

pub use backend::{
    ComputeBackend, DispatchRequest, FrameImage, ImageAllocator, ImageDescriptor,
    KernelDescriptor,
};
pub use compute_stage::{ComputeStage, FallbackStats};
pub use gpu_processor::{DispatchGrid, ThreadGroupSize, compute_dispatch_size, read_buffer_async};
pub use smoothing::{SmoothingParams, SmoothingStage};
pub use texture_pool::TexturePool;
pub use upscale::{UpscaleParams, UpscaleStage, UpscaleTarget};
pub use wgpu_backend::{GpuImage, WgpuBackend, WgpuKernel};

use crate::errors::SetupError;
use crate::gpu::wgpu;

/// Kuwahara smoothing kernel template (entry point `kuwahara`)
pub const SMOOTHING_SHADER: &str = include_str!("kuwahara.wgsl");

/// Catmull-Rom upscaling kernel template (entry point `upscale`)
pub const UPSCALE_SHADER: &str = include_str!("upscale.wgsl");

/// WGSL texel format name for a storage texture, if the format can be written
/// from a kernel without optional features.
pub fn storage_format_name(format: wgpu::TextureFormat) -> Option<&'static str> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some("rgba8unorm"),
        wgpu::TextureFormat::Rgba8Snorm => Some("rgba8snorm"),
        wgpu::TextureFormat::Rgba16Float => Some("rgba16float"),
        wgpu::TextureFormat::Rgba32Float => Some("rgba32float"),
        _ => None,
    }
}

/// Fill in a kernel template's `{{OUTPUT_FORMAT}}`, `{{GROUP_WIDTH}}` and
/// `{{GROUP_HEIGHT}}` placeholders.
pub fn compose_kernel_source(
    template: &str,
    group: ThreadGroupSize,
    format: wgpu::TextureFormat,
) -> Result<String, SetupError> {
    let format_name = storage_format_name(format).ok_or(SetupError::UnsupportedFormat(format))?;

    Ok(template
        .replace("{{OUTPUT_FORMAT}}", format_name)
        .replace("{{GROUP_WIDTH}}", &format!("{}u", group.width))
        .replace("{{GROUP_HEIGHT}}", &format!("{}u", group.height)))
}

/// Parse and validate composed WGSL, and check the compute entry point exists.
pub fn validate_kernel_source(
    label: &str,
    source: &str,
    entry_point: &str,
) -> Result<(), SetupError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| SetupError::ShaderCompilation {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| SetupError::ShaderCompilation {
        label: label.to_string(),
        message: e.to_string(),
    })?;

    let has_entry_point = module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry_point && ep.stage == naga::ShaderStage::Compute);
    if !has_entry_point {
        return Err(SetupError::MissingEntryPoint {
            label: label.to_string(),
            entry_point: entry_point.to_string(),
        });
    }

    Ok(())
}
