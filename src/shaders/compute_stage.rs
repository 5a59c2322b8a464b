// SPDX-License-Identifier: GPL-3.0-only

//! Generic single-dispatch compute stage
//!
//! A stage owns one compiled kernel and one [`TexturePool`]. Each call
//! acquires the next pooled image, records one dispatch that reads the source
//! and writes the pooled image, and returns the pooled image. Any per-frame
//! failure returns the source instead: one frame without the effect is better
//! than stopping playback.

use crate::constants::FALLBACK_LOG_INTERVAL;
use crate::errors::{FrameError, SetupError};
use crate::gpu::wgpu;
use crate::shaders::backend::{
    ComputeBackend, DispatchRequest, FrameImage, ImageDescriptor, KernelDescriptor,
};
use crate::shaders::gpu_processor::{DispatchGrid, ThreadGroupSize};
use crate::shaders::texture_pool::TexturePool;
use tracing::{info, trace, warn};

/// Per-stage fallback counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FallbackStats {
    /// Frames in the current run of failures
    pub consecutive: u64,
    /// Frames that fell back over the stage's lifetime
    pub total: u64,
}

impl FallbackStats {
    fn record_failure(&mut self, label: &str, error: &FrameError) {
        self.consecutive += 1;
        self.total += 1;

        // First failure of a streak, then once per interval
        if self.consecutive == 1 || self.consecutive % FALLBACK_LOG_INTERVAL == 0 {
            warn!(
                stage = label,
                consecutive = self.consecutive,
                total = self.total,
                error = %error,
                "Stage skipped, passing source frame through"
            );
        } else {
            trace!(stage = label, error = %error, "Stage skipped");
        }
    }

    fn record_success(&mut self, label: &str) {
        if self.consecutive > 0 {
            info!(
                stage = label,
                skipped_frames = self.consecutive,
                "Stage recovered"
            );
            self.consecutive = 0;
        }
    }
}

/// One kernel, one pool, one dispatch per call.
///
/// Not synchronized: call from a single submission thread, once per frame.
pub struct ComputeStage<B: ComputeBackend> {
    backend: B,
    kernel: B::Kernel,
    label: String,
    output_format: wgpu::TextureFormat,
    group_size: ThreadGroupSize,
    pool: TexturePool<B::Image>,
    dispatches: u64,
    fallbacks: FallbackStats,
}

impl<B: ComputeBackend> ComputeStage<B> {
    /// Build the kernel. Errors here mean the stage must not be used.
    pub fn new(backend: B, desc: &KernelDescriptor<'_>) -> Result<Self, SetupError> {
        let kernel = backend.create_kernel(desc)?;
        let group_size = backend.thread_group_size(&kernel);

        info!(
            stage = desc.label,
            entry_point = desc.entry_point,
            format = ?desc.output_format,
            group_width = group_size.width,
            group_height = group_size.height,
            "Compute stage ready"
        );

        Ok(Self {
            backend,
            kernel,
            label: desc.label.to_string(),
            output_format: desc.output_format,
            group_size,
            pool: TexturePool::new(),
            dispatches: 0,
            fallbacks: FallbackStats::default(),
        })
    }

    /// Record a dispatch writing an image of `output`'s shape.
    ///
    /// Returns the written image, or a clone of `source` if the destination
    /// could not be acquired or the dispatch could not be recorded.
    pub fn dispatch(
        &mut self,
        stream: &mut B::CommandStream,
        source: &B::Image,
        output: ImageDescriptor,
        params: &[u8],
    ) -> B::Image {
        match self.try_dispatch(stream, source, output, params) {
            Ok(destination) => {
                self.fallbacks.record_success(&self.label);
                destination
            }
            Err(error) => {
                self.fallbacks.record_failure(&self.label, &error);
                source.clone()
            }
        }
    }

    fn try_dispatch(
        &mut self,
        stream: &mut B::CommandStream,
        source: &B::Image,
        output: ImageDescriptor,
        params: &[u8],
    ) -> Result<B::Image, FrameError> {
        if output.format != self.output_format {
            return Err(FrameError::FormatMismatch {
                expected: self.output_format,
                actual: output.format,
            });
        }

        let destination = self.pool.acquire(&self.backend, &output)?;

        // A caller feeding back one of our earlier outputs lands on its slot
        // every third frame; reading and writing it in one pass is invalid
        if destination.same_image(source) {
            return Err(FrameError::SourceInUse {
                slot: self.pool.cursor(),
            });
        }

        let request = DispatchRequest {
            label: &self.label,
            source,
            destination: &destination,
            params,
            group_size: self.group_size,
            grid: DispatchGrid::new(destination.width(), destination.height()),
        };
        self.backend.encode_dispatch(stream, &self.kernel, &request)?;
        self.dispatches += 1;

        trace!(
            stage = %self.label,
            slot = self.pool.cursor(),
            src_width = source.width(),
            src_height = source.height(),
            dst_width = destination.width(),
            dst_height = destination.height(),
            "Dispatch recorded"
        );

        Ok(destination)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Format the kernel writes; sources must match it
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn group_size(&self) -> ThreadGroupSize {
        self.group_size
    }

    pub fn pool(&self) -> &TexturePool<B::Image> {
        &self.pool
    }

    /// Drop pooled images (see [`TexturePool::release_all`])
    pub fn release_resources(&mut self) {
        self.pool.release_all();
    }

    /// Dispatches successfully recorded
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    pub fn fallbacks(&self) -> FallbackStats {
        self.fallbacks
    }
}
