// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the stage chain over a still image
//! - Inspecting the GPU and the thread-group size kernels will use

use frame_postfx::pipelines::frame_io::{read_rgba8, upload_rgba8};
use frame_postfx::shaders::FrameImage;
use frame_postfx::{Config, FramePixelFormat, FrameRenderer, WgpuBackend, gpu};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Options of the `process` command after flag resolution
pub struct ProcessOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub radius: Option<i32>,
    pub upscale: Option<frame_postfx::UpscaleTarget>,
    pub frames: u32,
    pub config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

/// Run the chain `frames` times over an image and save the last output
pub fn process_image(options: ProcessOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(options.config.as_ref())?;
    if let Some(radius) = options.radius {
        config.smoothing_radius = radius;
    }
    if options.upscale.is_some() {
        config.upscale = options.upscale;
    }
    // Still images decode to 8-bit; the whole chain runs in that format
    config.pixel_format = FramePixelFormat::Rgba8Unorm;
    config.validate()?;

    let decoded = image::open(&options.input)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    println!("Input: {} ({}x{})", options.input.display(), width, height);

    let (device, queue, gpu_info) = pollster::block_on(gpu::create_compute_device("frame-postfx"))?;
    println!("GPU: {} ({:?})", gpu_info.adapter_name, gpu_info.backend);

    let mut renderer = FrameRenderer::from_config(device, queue, &config)?;
    let source = upload_rgba8(renderer.backend(), decoded.as_raw(), width, height)?;
    let settings = config.frame_settings();

    let started = Instant::now();
    let mut output = source.clone();
    for frame in 0..options.frames.max(1) {
        output = renderer.render(&source, &settings);
        info!(
            frame,
            width = output.width(),
            height = output.height(),
            "Frame submitted"
        );
    }

    let pixels = pollster::block_on(read_rgba8(renderer.backend(), &output))?;
    let elapsed = started.elapsed();

    let image = image::RgbaImage::from_raw(output.width(), output.height(), pixels)
        .ok_or("Readback size does not match output dimensions")?;
    image.save(&options.output)?;

    let chain = renderer.chain();
    println!(
        "Output: {} ({}x{})",
        options.output.display(),
        output.width(),
        output.height()
    );
    println!(
        "Frames: {} in {:.1} ms",
        options.frames.max(1),
        elapsed.as_secs_f64() * 1000.0
    );
    println!(
        "Smoothing: {} dispatches, {} pooled images, {} skipped",
        chain.smoothing().dispatches(),
        chain.smoothing().pool().allocations(),
        chain.smoothing().fallbacks().total
    );
    println!(
        "Upscale:   {} dispatches, {} pooled images, {} skipped",
        chain.upscale().dispatches(),
        chain.upscale().pool().allocations(),
        chain.upscale().fallbacks().total
    );

    Ok(())
}

/// Print adapter details and the derived thread-group size
pub fn show_info(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config.as_ref())?;

    let (device, queue, gpu_info) = pollster::block_on(gpu::create_compute_device("frame-postfx"))?;
    let limits = device.limits();
    let backend =
        WgpuBackend::with_preferred_group_width(device, queue, config.preferred_group_width);
    let group = backend.group_size();

    println!("frame-postfx {}", env!("GIT_VERSION"));
    println!();
    println!("Adapter:     {}", gpu_info.adapter_name);
    println!("Backend:     {:?}", gpu_info.backend);
    println!("Device type: {:?}", gpu_info.device_type);
    println!();
    println!(
        "Max invocations per workgroup: {}",
        limits.max_compute_invocations_per_workgroup
    );
    println!(
        "Max workgroup size:            {}x{}",
        limits.max_compute_workgroup_size_x, limits.max_compute_workgroup_size_y
    );
    println!(
        "Max texture dimension:         {}",
        limits.max_texture_dimension_2d
    );
    println!();
    println!(
        "Thread group: {}x{} ({} threads, preferred width {})",
        group.width,
        group.height,
        group.threads(),
        config.preferred_group_width
    );
    println!("Frame format: {:?}", config.pixel_format.texture_format());

    Ok(())
}
