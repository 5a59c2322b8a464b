// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use frame_postfx::{SmoothingPreset, UpscaleTarget};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "frame-postfx")]
#[command(about = "GPU compute post-processing for video frames")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the smoothing/upscaling chain over a still image
    Process {
        /// Input image (any format the image crate decodes)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Kuwahara radius in pixels (0 disables smoothing)
        #[arg(short, long, conflicts_with = "preset")]
        radius: Option<i32>,

        /// Smoothing preset (Off, Subtle, Painterly, Strong)
        #[arg(short, long)]
        preset: Option<SmoothingPreset>,

        /// Upscale target as WIDTHxHEIGHT
        #[arg(short, long)]
        upscale: Option<UpscaleTarget>,

        /// Number of frames to run, to exercise pool rotation
        #[arg(short, long, default_value = "1")]
        frames: u32,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the GPU adapter and the derived compute thread-group size
    Info {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=frame_postfx=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            radius,
            preset,
            upscale,
            frames,
            config,
        } => {
            let options = cli::ProcessOptions {
                input,
                output,
                radius: radius.or(preset.map(|p| p.radius())),
                upscale,
                frames,
                config,
            };
            cli::process_image(options)
        }
        Commands::Info { config } => cli::show_info(config),
    }
}
