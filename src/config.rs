// SPDX-License-Identifier: GPL-3.0-only

//! Post-processing configuration
//!
//! Loaded from an optional JSON file; every field has a default so partial
//! files are accepted. Command-line flags override file values.

use crate::constants::{DEFAULT_PREFERRED_GROUP_WIDTH, SmoothingPreset};
use crate::errors::{PostFxError, PostFxResult};
use crate::gpu::wgpu;
use crate::pipelines::FrameSettings;
use crate::shaders::UpscaleTarget;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixel format of the frames flowing through the chain
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePixelFormat {
    /// 8-bit normalized, what still images decode to
    Rgba8Unorm,
    /// Half float, keeps HDR and 10-bit video headroom
    #[default]
    Rgba16Float,
}

impl FramePixelFormat {
    pub fn texture_format(&self) -> wgpu::TextureFormat {
        match self {
            Self::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            Self::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Kuwahara radius in pixels (0 disables smoothing)
    pub smoothing_radius: i32,
    /// Output size of the upscaler (absent disables upscaling)
    pub upscale: Option<UpscaleTarget>,
    /// Pixel format the stages are built for
    pub pixel_format: FramePixelFormat,
    /// SIMD width used to shape compute thread groups
    pub preferred_group_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smoothing_radius: SmoothingPreset::default().radius(),
            upscale: None,
            pixel_format: FramePixelFormat::default(),
            preferred_group_width: DEFAULT_PREFERRED_GROUP_WIDTH,
        }
    }
}

impl Config {
    /// Read and validate a JSON configuration file
    pub fn load(path: &Path) -> PostFxResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the stages cannot work with
    pub fn validate(&self) -> PostFxResult<()> {
        if self.preferred_group_width == 0 {
            return Err(PostFxError::Config(
                "preferred_group_width must be at least 1".to_string(),
            ));
        }
        if let Some(target) = self.upscale {
            if target.width == 0 || target.height == 0 {
                return Err(PostFxError::Config(format!(
                    "upscale target must be non-zero, got {}",
                    target
                )));
            }
        }
        Ok(())
    }

    /// Per-frame parameters for the chain
    pub fn frame_settings(&self) -> FrameSettings {
        FrameSettings {
            smoothing_radius: self.smoothing_radius,
            upscale: self.upscale,
        }
    }
}
