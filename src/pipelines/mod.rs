// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame sequencing of the compute stages
//!
//! [`FrameChain`] runs smoothing then upscaling into a caller-owned command
//! stream. [`FrameRenderer`] is the wgpu convenience wrapper that owns the
//! encoder for a frame and submits it once.

pub mod frame_io;

use crate::config::Config;
use crate::errors::SetupError;
use crate::gpu::wgpu;
use crate::shaders::{
    ComputeBackend, FrameImage, GpuImage, SmoothingStage, UpscaleStage, UpscaleTarget,
    WgpuBackend,
};
use tracing::trace;

/// Parameters for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSettings {
    /// Kuwahara radius, 0 or less disables smoothing
    pub smoothing_radius: i32,
    /// Final output size, `None` disables upscaling
    pub upscale: Option<UpscaleTarget>,
}

/// Smoothing followed by upscaling, both optional per frame.
///
/// Each stage keeps its own texture pool, so the chain's output stays valid
/// for two further frames. Drive it from one thread, once per frame.
pub struct FrameChain<B: ComputeBackend> {
    smoothing: SmoothingStage<B>,
    upscale: UpscaleStage<B>,
}

impl<B: ComputeBackend> FrameChain<B> {
    /// Build both stages for frames of `format`
    pub fn new(backend: B, format: wgpu::TextureFormat) -> Result<Self, SetupError> {
        Ok(Self {
            smoothing: SmoothingStage::new(backend.clone(), format)?,
            upscale: UpscaleStage::new(backend, format)?,
        })
    }

    /// Record the enabled stages for one frame into `stream`.
    ///
    /// Disabled or failed stages pass their input through, so the result is
    /// always presentable.
    pub fn process_frame(
        &mut self,
        stream: &mut B::CommandStream,
        source: &B::Image,
        settings: &FrameSettings,
    ) -> B::Image {
        let smoothed = self
            .smoothing
            .apply(stream, source, settings.smoothing_radius);

        let output = match settings.upscale {
            Some(target) => self
                .upscale
                .process(stream, &smoothed, target.width, target.height),
            None => smoothed,
        };

        trace!(
            width = output.width(),
            height = output.height(),
            passthrough = output.same_image(source),
            "Frame recorded"
        );

        output
    }

    pub fn smoothing(&self) -> &SmoothingStage<B> {
        &self.smoothing
    }

    pub fn upscale(&self) -> &UpscaleStage<B> {
        &self.upscale
    }

    /// Drop every pooled image of both stages
    pub fn release_resources(&mut self) {
        self.smoothing.release_resources();
        self.upscale.release_resources();
    }
}

/// Owns a [`FrameChain`] on wgpu and submits one command buffer per frame
pub struct FrameRenderer {
    backend: WgpuBackend,
    chain: FrameChain<WgpuBackend>,
}

impl FrameRenderer {
    pub fn new(backend: WgpuBackend, format: wgpu::TextureFormat) -> Result<Self, SetupError> {
        let chain = FrameChain::new(backend.clone(), format)?;
        Ok(Self { backend, chain })
    }

    /// Build from configuration: thread-group width and pixel format
    pub fn from_config(
        device: std::sync::Arc<wgpu::Device>,
        queue: std::sync::Arc<wgpu::Queue>,
        config: &Config,
    ) -> Result<Self, SetupError> {
        let backend =
            WgpuBackend::with_preferred_group_width(device, queue, config.preferred_group_width);
        Self::new(backend, config.pixel_format.texture_format())
    }

    /// Record and submit one frame, returning the image to present.
    ///
    /// Does not wait for the GPU.
    pub fn render(&mut self, source: &GpuImage, settings: &FrameSettings) -> GpuImage {
        let mut encoder =
            self.backend
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("postfx_frame_encoder"),
                });

        let output = self.chain.process_frame(&mut encoder, source, settings);

        self.backend.queue().submit(std::iter::once(encoder.finish()));
        output
    }

    pub fn backend(&self) -> &WgpuBackend {
        &self.backend
    }

    pub fn chain(&self) -> &FrameChain<WgpuBackend> {
        &self.chain
    }
}
