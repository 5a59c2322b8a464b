// SPDX-License-Identifier: GPL-3.0-only

//! Seams between the stage logic and the GPU
//!
//! The pool and stage executor only need a handful of device operations:
//! allocate an image, compile a kernel, and record a dispatch into a command
//! stream. They are expressed as traits so the same rotation and fallback
//! logic drives `wgpu` in production and a recording fake in tests.

use crate::errors::{FrameError, SetupError};
use crate::gpu::wgpu;
use crate::shaders::gpu_processor::{DispatchGrid, ThreadGroupSize};

/// Handle to a device-resident 2D image.
///
/// Clones are cheap and refer to the same underlying image.
pub trait FrameImage: Clone {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Pixel format
    fn format(&self) -> wgpu::TextureFormat;

    /// Whether both handles refer to the same underlying image
    fn same_image(&self, other: &Self) -> bool;
}

/// Shape of an image to allocate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl ImageDescriptor {
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    /// Same shape as an existing image
    pub fn like<I: FrameImage>(image: &I) -> Self {
        Self::new(image.width(), image.height(), image.format())
    }

    /// Whether `image` can be reused for this request without reallocation
    pub fn matches<I: FrameImage>(&self, image: &I) -> bool {
        image.width() == self.width && image.height() == self.height && image.format() == self.format
    }

    /// Reject zero extents
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// What a stage needs to build its kernel
#[derive(Debug, Clone, Copy)]
pub struct KernelDescriptor<'a> {
    /// Debug label, also used for log fields
    pub label: &'a str,
    /// WGSL source, see [`crate::shaders::compose_kernel_source`]
    pub source: &'a str,
    /// Compute entry point in `source`
    pub entry_point: &'a str,
    /// Format of the images the kernel writes
    pub output_format: wgpu::TextureFormat,
}

/// One compute dispatch to record
#[derive(Debug)]
pub struct DispatchRequest<'a, I> {
    pub label: &'a str,
    /// Bound read-only at binding 0
    pub source: &'a I,
    /// Bound as write-only storage at binding 1
    pub destination: &'a I,
    /// Uniform data bound at binding 2
    pub params: &'a [u8],
    pub group_size: ThreadGroupSize,
    /// Threads to cover, one per destination pixel
    pub grid: DispatchGrid,
}

/// Allocates pooled images
pub trait ImageAllocator {
    type Image: FrameImage;

    /// Allocate a GPU-private image usable as both dispatch input and output
    fn allocate_image(&self, desc: &ImageDescriptor) -> Result<Self::Image, FrameError>;
}

/// Device operations needed by a compute stage
pub trait ComputeBackend: ImageAllocator + Clone {
    /// Compiled pipeline state, immutable after construction
    type Kernel;

    /// Caller-owned sequence of GPU work for one frame
    type CommandStream;

    /// Compile a kernel. Failure here is fatal for the stage.
    fn create_kernel(&self, desc: &KernelDescriptor<'_>) -> Result<Self::Kernel, SetupError>;

    /// Thread-group size the kernel was built with
    fn thread_group_size(&self, kernel: &Self::Kernel) -> ThreadGroupSize;

    /// Append one compute pass to `stream`
    fn encode_dispatch(
        &self,
        stream: &mut Self::CommandStream,
        kernel: &Self::Kernel,
        request: &DispatchRequest<'_, Self::Image>,
    ) -> Result<(), FrameError>;
}
