// SPDX-License-Identifier: GPL-3.0-only

//! Upscaling to an explicit target size
//!
//! The target is independent of the source size, so the same stage also
//! handles downscaling and aspect changes. The source format is preserved.

use crate::constants::UPSCALE_ENTRY_POINT;
use crate::errors::SetupError;
use crate::gpu::wgpu;
use crate::shaders::backend::{ComputeBackend, FrameImage, ImageDescriptor, KernelDescriptor};
use crate::shaders::compute_stage::{ComputeStage, FallbackStats};
use crate::shaders::texture_pool::TexturePool;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel uniform, binding 2
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UpscaleParams {
    pub input_size: [f32; 2],
    pub output_size: [f32; 2],
}

/// Output size of the upscaling stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpscaleTarget {
    pub width: u32,
    pub height: u32,
}

impl UpscaleTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for UpscaleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WIDTHxHEIGHT`, e.g. `3840x2160`
impl FromStr for UpscaleTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width: u32 = width
            .trim()
            .parse()
            .map_err(|e| format!("invalid width '{}': {}", width, e))?;
        let height: u32 = height
            .trim()
            .parse()
            .map_err(|e| format!("invalid height '{}': {}", height, e))?;
        if width == 0 || height == 0 {
            return Err(format!("target size must be non-zero, got {}x{}", width, height));
        }
        Ok(Self { width, height })
    }
}

/// Upscaling stage
pub struct UpscaleStage<B: ComputeBackend> {
    stage: ComputeStage<B>,
}

impl<B: ComputeBackend> UpscaleStage<B> {
    /// Build the stage for frames of `format`
    pub fn new(backend: B, format: wgpu::TextureFormat) -> Result<Self, SetupError> {
        Self::with_source(backend, format, super::UPSCALE_SHADER)
    }

    /// Build the stage from custom kernel source exposing `upscale`
    pub fn with_source(
        backend: B,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<Self, SetupError> {
        let stage = ComputeStage::new(
            backend,
            &KernelDescriptor {
                label: "Upscale",
                source,
                entry_point: UPSCALE_ENTRY_POINT,
                output_format: format,
            },
        )?;
        Ok(Self { stage })
    }

    /// Resample `source` to `target_width` x `target_height`.
    ///
    /// Returns `source` itself when the frame could not be processed.
    pub fn process(
        &mut self,
        stream: &mut B::CommandStream,
        source: &B::Image,
        target_width: u32,
        target_height: u32,
    ) -> B::Image {
        let params = UpscaleParams {
            input_size: [source.width() as f32, source.height() as f32],
            output_size: [target_width as f32, target_height as f32],
        };
        self.stage.dispatch(
            stream,
            source,
            ImageDescriptor::new(target_width, target_height, source.format()),
            bytemuck::bytes_of(&params),
        )
    }

    pub fn pool(&self) -> &TexturePool<B::Image> {
        self.stage.pool()
    }

    pub fn dispatches(&self) -> u64 {
        self.stage.dispatches()
    }

    pub fn fallbacks(&self) -> FallbackStats {
        self.stage.fallbacks()
    }

    pub fn release_resources(&mut self) {
        self.stage.release_resources();
    }
}
