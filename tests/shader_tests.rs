// SPDX-License-Identifier: MPL-2.0

//! Integration tests for kernel source composition and validation
//!
//! Runs naga over the composed WGSL, so shader regressions are caught
//! without a GPU.

use frame_postfx::constants::{SMOOTHING_ENTRY_POINT, UPSCALE_ENTRY_POINT};
use frame_postfx::errors::SetupError;
use frame_postfx::gpu::wgpu::TextureFormat;
use frame_postfx::shaders::{
    SMOOTHING_SHADER, ThreadGroupSize, UPSCALE_SHADER, compose_kernel_source,
    validate_kernel_source,
};

const FORMATS: [TextureFormat; 2] = [TextureFormat::Rgba8Unorm, TextureFormat::Rgba16Float];

#[test]
fn test_smoothing_kernel_validates() {
    for format in FORMATS {
        let source =
            compose_kernel_source(SMOOTHING_SHADER, ThreadGroupSize::new(32, 8), format).unwrap();
        validate_kernel_source("Kuwahara", &source, SMOOTHING_ENTRY_POINT)
            .unwrap_or_else(|e| panic!("{:?}: {}", format, e));
    }
}

#[test]
fn test_upscale_kernel_validates() {
    for format in FORMATS {
        let source =
            compose_kernel_source(UPSCALE_SHADER, ThreadGroupSize::new(16, 16), format).unwrap();
        validate_kernel_source("Upscale", &source, UPSCALE_ENTRY_POINT)
            .unwrap_or_else(|e| panic!("{:?}: {}", format, e));
    }
}

#[test]
fn test_wrong_entry_point_is_reported() {
    let source = compose_kernel_source(
        SMOOTHING_SHADER,
        ThreadGroupSize::new(8, 8),
        TextureFormat::Rgba16Float,
    )
    .unwrap();
    let err = validate_kernel_source("Kuwahara", &source, UPSCALE_ENTRY_POINT).unwrap_err();
    assert_eq!(
        err,
        SetupError::MissingEntryPoint {
            label: "Kuwahara".to_string(),
            entry_point: UPSCALE_ENTRY_POINT.to_string(),
        }
    );
}

#[test]
fn test_unfilled_template_fails_to_compile() {
    let err = validate_kernel_source("Kuwahara", SMOOTHING_SHADER, SMOOTHING_ENTRY_POINT)
        .unwrap_err();
    assert!(matches!(err, SetupError::ShaderCompilation { .. }));
}
