// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use frame_postfx::constants::{POOL_CAPACITY, SmoothingPreset};

#[test]
fn test_pool_is_triple_buffered() {
    assert_eq!(POOL_CAPACITY, 3);
}

#[test]
fn test_smoothing_preset_values() {
    // Test that all presets exist (Off, Subtle, Painterly, Strong)
    assert_eq!(SmoothingPreset::ALL.len(), 4);
    assert_eq!(SmoothingPreset::Off.radius(), 0);
}

#[test]
fn test_smoothing_preset_ordering() {
    // Presets are ordered from weakest to strongest
    let mut prev_radius = -1;
    for preset in SmoothingPreset::ALL {
        assert!(
            preset.radius() > prev_radius,
            "Presets should be ordered from weakest to strongest"
        );
        prev_radius = preset.radius();
    }
}

#[test]
fn test_smoothing_preset_display_names() {
    for preset in SmoothingPreset::ALL {
        assert!(!preset.display_name().is_empty());
        assert_eq!(preset.to_string(), preset.display_name());
    }
}

#[test]
fn test_smoothing_preset_parse() {
    assert_eq!("painterly".parse(), Ok(SmoothingPreset::Painterly));
    assert_eq!(" STRONG ".parse(), Ok(SmoothingPreset::Strong));
    assert!("blurry".parse::<SmoothingPreset>().is_err());
}

#[test]
fn test_smoothing_preset_default() {
    assert_eq!(SmoothingPreset::default(), SmoothingPreset::Subtle);
}
