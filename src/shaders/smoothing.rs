// SPDX-License-Identifier: GPL-3.0-only

//! Edge-preserving smoothing (Kuwahara filter)
//!
//! Output has the same size and format as the input. A radius of zero or
//! less disables the stage entirely: the source is returned as-is and the
//! pool does not rotate.

use crate::constants::{MAX_SMOOTHING_RADIUS, SMOOTHING_ENTRY_POINT};
use crate::errors::SetupError;
use crate::gpu::wgpu;
use crate::shaders::backend::{ComputeBackend, FrameImage, ImageDescriptor, KernelDescriptor};
use crate::shaders::compute_stage::{ComputeStage, FallbackStats};
use crate::shaders::texture_pool::TexturePool;

/// Kernel uniform, binding 2
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SmoothingParams {
    /// Source size in pixels
    pub resolution: [f32; 2],
    /// Sampling radius in pixels, at most [`MAX_SMOOTHING_RADIUS`]
    pub radius: i32,
    pub _padding: i32,
}

impl SmoothingParams {
    /// `radius` is clamped to `0..=MAX_SMOOTHING_RADIUS`
    pub fn new(width: u32, height: u32, radius: i32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            radius: radius.clamp(0, MAX_SMOOTHING_RADIUS),
            _padding: 0,
        }
    }
}

/// Kuwahara smoothing stage
pub struct SmoothingStage<B: ComputeBackend> {
    stage: ComputeStage<B>,
}

impl<B: ComputeBackend> SmoothingStage<B> {
    /// Build the stage for frames of `format`
    pub fn new(backend: B, format: wgpu::TextureFormat) -> Result<Self, SetupError> {
        Self::with_source(backend, format, super::SMOOTHING_SHADER)
    }

    /// Build the stage from custom kernel source exposing `kuwahara`
    pub fn with_source(
        backend: B,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<Self, SetupError> {
        let stage = ComputeStage::new(
            backend,
            &KernelDescriptor {
                label: "Kuwahara",
                source,
                entry_point: SMOOTHING_ENTRY_POINT,
                output_format: format,
            },
        )?;
        Ok(Self { stage })
    }

    /// Smooth `source`, recording the dispatch into `stream`.
    ///
    /// Returns `source` itself when `radius <= 0` or when the frame could not
    /// be processed.
    pub fn apply(
        &mut self,
        stream: &mut B::CommandStream,
        source: &B::Image,
        radius: i32,
    ) -> B::Image {
        if radius <= 0 {
            return source.clone();
        }

        let params = SmoothingParams::new(source.width(), source.height(), radius);
        self.stage.dispatch(
            stream,
            source,
            ImageDescriptor::like(source),
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
