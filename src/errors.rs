// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the post-processing stages
//!
//! Errors are split by when they can happen. [`SetupError`] is fatal and only
//! produced while building a stage; [`FrameError`] is produced per frame and
//! absorbed by the stages, which fall back to passing the source through.

use thiserror::Error;

/// Result type alias using PostFxError
pub type PostFxResult<T> = Result<T, PostFxError>;

/// Crate-level error type
#[derive(Debug, Error)]
pub enum PostFxError {
    /// Device, adapter or kernel construction failed
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),
    /// A per-frame operation failed
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Reading or writing files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Decoding or encoding still images
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// Malformed configuration file
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Construction-time failures. A stage that fails to build must not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// No adapter matched the request
    #[error("No suitable GPU adapter: {0}")]
    AdapterUnavailable(String),
    /// Adapter refused to create a device
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(String),
    /// Kernel source does not declare the requested compute entry point
    #[error("Kernel `{label}` has no compute entry point `{entry_point}`")]
    MissingEntryPoint { label: String, entry_point: String },
    /// WGSL failed to parse or validate
    #[error("Kernel `{label}` failed to compile: {message}")]
    ShaderCompilation { label: String, message: String },
    /// The kernel cannot write images of this format
    #[error("Format {0:?} cannot be used as a storage output")]
    UnsupportedFormat(wgpu::TextureFormat),
}

/// Per-frame failures. Stages absorb these and return their source image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Requested image has a zero extent
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// Device could not provide the image
    #[error("Failed to allocate {width}x{height} {format:?} image: {reason}")]
    AllocationFailed {
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        reason: String,
    },
    /// Source format differs from the format the kernel writes
    #[error("Kernel writes {expected:?} but the frame is {actual:?}")]
    FormatMismatch {
        expected: wgpu::TextureFormat,
        actual: wgpu::TextureFormat,
    },
    /// The pool slot to write holds the image being read
    #[error("Pool slot {slot} holds the source image")]
    SourceInUse { slot: usize },
    /// The command stream could not take the compute pass
    #[error("Dispatch unavailable: {0}")]
    DispatchUnavailable(String),
    /// Mapping a buffer back to the CPU failed
    #[error("Readback failed: {0}")]
    Readback(String),
}
