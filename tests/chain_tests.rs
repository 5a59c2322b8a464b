// SPDX-License-Identifier: MPL-2.0

//! Integration tests for per-frame stage chaining

mod common;

use common::{MockBackend, MockStream};
use frame_postfx::gpu::wgpu::TextureFormat;
use frame_postfx::shaders::FrameImage;
use frame_postfx::{FrameChain, FrameSettings, UpscaleTarget};

const FORMAT: TextureFormat = TextureFormat::Rgba16Float;

fn hd_to_uhd() -> FrameSettings {
    FrameSettings {
        smoothing_radius: 3,
        upscale: Some(UpscaleTarget::new(3840, 2160)),
    }
}

#[test]
fn test_smooth_then_upscale() {
    let backend = MockBackend::default();
    let mut chain = FrameChain::new(backend, FORMAT).unwrap();
    let mut stream = MockStream::default();
    let source = MockBackend::source_frame(1, 1920, 1080, FORMAT);

    let output = chain.process_frame(&mut stream, &source, &hd_to_uhd());

    assert_eq!((output.width(), output.height()), (3840, 2160));
    assert!(!output.same_image(&source));

    assert_eq!(stream.dispatches.len(), 2);
    let (smooth, upscale) = (&stream.dispatches[0], &stream.dispatches[1]);
    assert_eq!(smooth.label, "Kuwahara");
    assert_eq!(smooth.source, source.id);
    assert_eq!(
        (smooth.destination_width, smooth.destination_height),
        (1920, 1080)
    );
    assert_eq!(upscale.label, "Upscale");
    assert_eq!(upscale.source, smooth.destination);
    assert_eq!(upscale.destination, output.id);
    assert_ne!(smooth.destination, upscale.destination);
}

#[test]
fn test_steady_state_allocates_three_per_stage() {
    let backend = MockBackend::default();
    let mut chain = FrameChain::new(backend.clone(), FORMAT).unwrap();
    let mut stream = MockStream::default();
    let source = MockBackend::source_frame(1, 1920, 1080, FORMAT);

    let outputs: Vec<_> = (0..4)
        .map(|_| chain.process_frame(&mut stream, &source, &hd_to_uhd()))
        .collect();

    assert_eq!(chain.smoothing().pool().allocations(), 3);
    assert_eq!(chain.upscale().pool().allocations(), 3);
    assert_eq!(backend.allocations(), 6);

    // Frame 3 reuses frame 0's output, the two frames between differ
    assert!(outputs[3].same_image(&outputs[0]));
    assert!(!outputs[1].same_image(&outputs[0]));
    assert!(!outputs[2].same_image(&outputs[0]));
}

#[test]
fn test_disabled_stages_pass_source_through() {
    let backend = MockBackend::default();
    let mut chain = FrameChain::new(backend, FORMAT).unwrap();
    let mut stream = MockStream::default();
    let source = MockBackend::source_frame(1, 1920, 1080, FORMAT);

    let output = chain.process_frame(&mut stream, &source, &FrameSettings::default());

    assert!(output.same_image(&source));
    assert!(stream.dispatches.is_empty());
    assert_eq!(chain.smoothing().pool().cursor(), 0);
    assert_eq!(chain.upscale().pool().cursor(), 0);
}

#[test]
fn test_upscale_only() {
    let backend = MockBackend::default();
    let mut chain = FrameChain::new(backend, FORMAT).unwrap();
    let mut stream = MockStream::default();
    let source = MockBackend::source_frame(1, 1280, 720, FORMAT);
    let settings = FrameSettings {
        smoothing_radius: 0,
        upscale: Some(UpscaleTarget::new(1920, 1080)),
    };

    let output = chain.process_frame(&mut stream, &source, &settings);

    assert_eq!(stream.dispatches.len(), 1);
    assert_eq!(stream.dispatches[0].source, source.id);
    assert_eq!((output.width(), output.height()), (1920, 1080));
}

#[test]
fn test_wrong_format_passes_through_both_stages() {
    let backend = MockBackend::default();
    let mut chain = FrameChain::new(backend, FORMAT).unwrap();
    let mut stream = MockStream::default();
    // Both kernels write Rgba16Float
    let source = MockBackend::source_frame(1, 1920, 1080, TextureFormat::Rgba8Unorm);

    let output = chain.process_frame(&mut stream, &source, &hd_to_uhd());

    assert!(output.same_image(&source));
    assert_eq!(chain.smoothing().fallbacks().total, 1);
    assert_eq!(chain.upscale().fallbacks().total, 1);
}

#[test]
fn test_release_resources_drops_all_slots() {
    let backend = MockBackend::default();
    let mut chain = FrameChain::new(backend.clone(), FORMAT).unwrap();
    let mut stream = MockStream::default();
    let source = MockBackend::source_frame(1, 1920, 1080, FORMAT);
    for _ in 0..3 {
        chain.process_frame(&mut stream, &source, &hd_to_uhd());
    }

    chain.release_resources();
    assert_eq!(chain.smoothing().pool().occupied_slots(), 0);
    assert_eq!(chain.upscale().pool().occupied_slots(), 0);

    chain.process_frame(&mut stream, &source, &hd_to_uhd());
    assert_eq!(backend.allocations(), 8);
}
