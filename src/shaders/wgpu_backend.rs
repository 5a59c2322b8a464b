// SPDX-License-Identifier: GPL-3.0-only

//! wgpu implementation of the compute backend
//!
//! Images are textures with sampled, storage and copy-source usage. Kernels
//! share one bind group layout:
//! - 0: source texture (float, read with `textureLoad`)
//! - 1: destination storage texture (write-only)
//! - 2: stage parameters (uniform)
//!
//! The command stream is a `wgpu::CommandEncoder` owned by the caller; each
//! dispatch appends one compute pass to it and nothing is submitted here.
//!
//! Texture, buffer and bind group creation run inside device error scopes so
//! out-of-memory and validation errors become [`FrameError`]s for the stage
//! to absorb.

use crate::constants::DEFAULT_PREFERRED_GROUP_WIDTH;
use crate::errors::{FrameError, SetupError};
use crate::gpu::wgpu;
use crate::gpu::wgpu::util::DeviceExt;
use crate::shaders::backend::{
    ComputeBackend, DispatchRequest, FrameImage, ImageAllocator, ImageDescriptor,
    KernelDescriptor,
};
use crate::shaders::gpu_processor::ThreadGroupSize;
use crate::shaders::{compose_kernel_source, validate_kernel_source};
use std::sync::Arc;
use tracing::debug;

/// Usage of every pooled image
const POOLED_IMAGE_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::TEXTURE_BINDING
    .union(wgpu::TextureUsages::STORAGE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC);

/// Shared handle to a 2D texture and its default view
#[derive(Debug, Clone)]
pub struct GpuImage {
    texture: Arc<wgpu::Texture>,
    view: Arc<wgpu::TextureView>,
}

impl GpuImage {
    /// Wrap an existing texture, e.g. a decoded video frame
    pub fn from_texture(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture: Arc::new(texture),
            view: Arc::new(view),
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl FrameImage for GpuImage {
    fn width(&self) -> u32 {
        self.texture.width()
    }

    fn height(&self) -> u32 {
        self.texture.height()
    }

    fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    fn same_image(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.texture, &other.texture)
    }
}

/// Compiled compute pipeline and its bind group layout
#[derive(Debug)]
pub struct WgpuKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    output_format: wgpu::TextureFormat,
    group_size: ThreadGroupSize,
}

/// Compute backend over a shared device and queue
#[derive(Debug, Clone)]
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    group_size: ThreadGroupSize,
}

impl WgpuBackend {
    /// Use the default preferred thread-group width
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self::with_preferred_group_width(device, queue, DEFAULT_PREFERRED_GROUP_WIDTH)
    }

    /// `preferred_width` is the hardware's SIMD width (warp/wave/SIMD-group).
    /// Group height follows from the device's invocation limit.
    pub fn with_preferred_group_width(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        preferred_width: u32,
    ) -> Self {
        let limits = device.limits();
        let group_size = ThreadGroupSize::from_limits(
            preferred_width.min(limits.max_compute_invocations_per_workgroup),
            limits.max_compute_invocations_per_workgroup,
        )
        .clamped(
            limits.max_compute_workgroup_size_x,
            limits.max_compute_workgroup_size_y,
        );

        debug!(
            preferred_width,
            max_invocations = limits.max_compute_invocations_per_workgroup,
            group_width = group_size.width,
            group_height = group_size.height,
            "Derived compute thread-group size"
        );

        Self {
            device,
            queue,
            group_size,
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Thread-group size new kernels are compiled with
    pub fn group_size(&self) -> ThreadGroupSize {
        self.group_size
    }

    fn create_bind_group_layout(
        &self,
        label: &str,
        output_format: wgpu::TextureFormat,
    ) -> wgpu::BindGroupLayout {
        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{}_bind_group_layout", label)),
                entries: &[
                    // Source image
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Destination image
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: output_format,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    // Stage parameters
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            })
    }

    /// Run `f` inside out-of-memory and validation error scopes.
    ///
    /// Device errors raised by `f` are returned here instead of reaching the
    /// uncaptured error handler, which panics by default. On native backends
    /// popping a scope resolves immediately, so this never waits on the GPU.
    fn scoped<T>(&self, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let value = f();
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        let validation = pollster::block_on(self.device.pop_error_scope());
        (value, out_of_memory.or(validation))
    }

    fn check_source(&self, source: &GpuImage) -> Result<(), FrameError> {
        let texture = source.texture();
        if texture.dimension() != wgpu::TextureDimension::D2
            || texture.depth_or_array_layers() != 1
        {
            return Err(FrameError::DispatchUnavailable(format!(
                "source must be a single-layer 2D texture, got {:?} with {} layers",
                texture.dimension(),
                texture.depth_or_array_layers()
            )));
        }
        if texture.sample_count() != 1 {
            return Err(FrameError::DispatchUnavailable(format!(
                "multisampled source ({} samples) cannot be read",
                texture.sample_count()
            )));
        }

        if !source
            .texture()
            .usage()
            .contains(wgpu::TextureUsages::TEXTURE_BINDING)
        {
            return Err(FrameError::DispatchUnavailable(
                "source texture is not bindable for reading".to_string(),
            ));
        }

        let sample_type = source
            .format()
            .sample_type(None, Some(self.device.features()));
        if !matches!(sample_type, Some(wgpu::TextureSampleType::Float { .. })) {
            return Err(FrameError::DispatchUnavailable(format!(
                "source format {:?} cannot be read as float",
                source.format()
            )));
        }

        Ok(())
    }
}

impl ImageAllocator for WgpuBackend {
    type Image = GpuImage;

    fn allocate_image(&self, desc: &ImageDescriptor) -> Result<GpuImage, FrameError> {
        let fail = |reason: String| FrameError::AllocationFailed {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            reason,
        };

        let max_dimension = self.device.limits().max_texture_dimension_2d;
        if desc.width > max_dimension || desc.height > max_dimension {
            return Err(fail(format!("exceeds device limit of {}", max_dimension)));
        }

        let allowed = desc
            .format
            .guaranteed_format_features(self.device.features())
            .allowed_usages;
        if !allowed.contains(POOLED_IMAGE_USAGE) {
            return Err(fail("format does not support storage writes".to_string()));
        }

        let (texture, error) = self.scoped(|| {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("postfx_pooled_texture"),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: desc.format,
                usage: POOLED_IMAGE_USAGE,
                view_formats: &[],
            })
        });
        if let Some(error) = error {
            return Err(fail(error.to_string()));
        }

        Ok(GpuImage::from_texture(texture))
    }
}

impl ComputeBackend for WgpuBackend {
    type Kernel = WgpuKernel;
    type CommandStream = wgpu::CommandEncoder;

    fn create_kernel(&self, desc: &KernelDescriptor<'_>) -> Result<WgpuKernel, SetupError> {
        let source = compose_kernel_source(desc.source, self.group_size, desc.output_format)?;
        validate_kernel_source(desc.label, &source, desc.entry_point)?;

        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let bind_group_layout = self.create_bind_group_layout(desc.label, desc.output_format);

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{}_pipeline_layout", desc.label)),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(desc.entry_point),
                compilation_options: Default::default(),
                cache: None,
            });

        Ok(WgpuKernel {
            pipeline,
            bind_group_layout,
            output_format: desc.output_format,
            group_size: self.group_size,
        })
    }

    fn thread_group_size(&self, kernel: &WgpuKernel) -> ThreadGroupSize {
        kernel.group_size
    }

    fn encode_dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kernel: &WgpuKernel,
        request: &DispatchRequest<'_, GpuImage>,
    ) -> Result<(), FrameError> {
        if request.destination.format() != kernel.output_format {
            return Err(FrameError::FormatMismatch {
                expected: kernel.output_format,
                actual: request.destination.format(),
            });
        }
        if request.source.same_image(request.destination) {
            return Err(FrameError::DispatchUnavailable(
                "source and destination are the same texture".to_string(),
            ));
        }
        self.check_source(request.source)?;

        let (bind_group, error) = self.scoped(|| {
            let params_buffer =
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{}_params", request.label)),
                        contents: request.params,
                        usage: wgpu::BufferUsages::UNIFORM,
                    });

            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{}_bind_group", request.label)),
                layout: &kernel.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(request.source.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(
                            request.destination.view(),
                        ),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            })
        });
        // Nothing has been recorded into the encoder yet
        if let Some(error) = error {
            return Err(FrameError::DispatchUnavailable(error.to_string()));
        }

        let (workgroups_x, workgroups_y) = request.grid.workgroups(request.group_size);

        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(request.label),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(&kernel.pipeline);
        compute_pass.set_bind_group(0, &bind_group, &[]);
        compute_pass.dispatch_workgroups(workgroups_x, workgroups_y, 1);

        Ok(())
    }
}
