// SPDX-License-Identifier: GPL-3.0-only

//! Moving RGBA8 frames between CPU memory and GPU images
//!
//! Only used at the edges of the pipeline (CLI, tests). Real-time callers
//! feed decoder textures straight into the chain.

use crate::errors::FrameError;
use crate::gpu::wgpu;
use crate::gpu::wgpu::util::DeviceExt;
use crate::shaders::gpu_processor::read_buffer_async;
use crate::shaders::{FrameImage, GpuImage, WgpuBackend};

/// Upload tightly packed RGBA8 pixels as a sampled, copyable image
pub fn upload_rgba8(
    backend: &WgpuBackend,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> Result<GpuImage, FrameError> {
    let expected = width as usize * height as usize * 4;
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimensions { width, height });
    }
    if rgba.len() < expected {
        return Err(FrameError::AllocationFailed {
            width,
            height,
            format: wgpu::TextureFormat::Rgba8Unorm,
            reason: format!("pixel data too small: {} bytes, expected {}", rgba.len(), expected),
        });
    }

    let texture = backend.device().create_texture_with_data(
        backend.queue(),
        &wgpu::TextureDescriptor {
            label: Some("postfx_source_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &rgba[..expected],
    );

    Ok(GpuImage::from_texture(texture))
}

/// Bytes per row rounded up to the copy alignment
fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copy an RGBA8 image back to tightly packed CPU pixels.
///
/// Submits its own command buffer and waits for it, so all previously
/// submitted frames are complete when this returns.
pub async fn read_rgba8(backend: &WgpuBackend, image: &GpuImage) -> Result<Vec<u8>, FrameError> {
    if image.format() != wgpu::TextureFormat::Rgba8Unorm {
        return Err(FrameError::Readback(format!(
            "expected Rgba8Unorm, image is {:?}",
            image.format()
        )));
    }

    let (width, height) = (image.width(), image.height());
    let padded_row = padded_bytes_per_row(width);
    let unpadded_row = (width * 4) as usize;

    let staging_buffer = backend.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("postfx_readback_buffer"),
        size: padded_row as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = backend
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("postfx_readback_encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: image.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    backend.queue().submit(std::iter::once(encoder.finish()));

    let padded = read_buffer_async(backend.device(), &staging_buffer).await?;

    let mut rgba = Vec::with_capacity(unpadded_row * height as usize);
    for row in padded.chunks_exact(padded_row as usize) {
        rgba.extend_from_slice(&row[..unpadded_row]);
    }
    Ok(rgba)
}
