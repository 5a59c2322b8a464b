// SPDX-License-Identifier: GPL-3.0-only

//! Frame PostFX - GPU compute post-processing for real-time video frames
//!
//! Two compute stages are provided, an edge-preserving Kuwahara smoothing
//! filter and an upscaler. Each stage records one dispatch per frame into the
//! caller's command stream and writes into its own triple-buffered texture
//! pool, so the image it returns stays untouched for two more frames while
//! the GPU and the display catch up. The CPU never waits on the GPU.
//!
//! # Architecture
//!
//! - [`shaders`]: texture pool, stage executor, the two stages and the wgpu
//!   backend they run on
//! - [`pipelines`]: per-frame chaining of the stages and frame upload/readback
//! - [`gpu`]: standalone device creation
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! let backend = WgpuBackend::new(device, queue);
//! let mut chain = FrameChain::new(backend, wgpu::TextureFormat::Rgba16Float)?;
//!
//! // every frame
//! let mut encoder = device.create_command_encoder(&Default::default());
//! let output = chain.process_frame(&mut encoder, &decoded, &settings);
//! queue.submit([encoder.finish()]);
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod gpu;
pub mod pipelines;
pub mod shaders;

// Re-export commonly used types
pub use config::{Config, FramePixelFormat};
pub use constants::SmoothingPreset;
pub use errors::{FrameError, PostFxError, PostFxResult, SetupError};
pub use pipelines::{FrameChain, FrameRenderer, FrameSettings};
pub use shaders::{
    ComputeBackend, FrameImage, GpuImage, SmoothingStage, TexturePool, UpscaleStage,
    UpscaleTarget, WgpuBackend,
};
