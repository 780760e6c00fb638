// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use snapcam::{Config, Rotation};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.album_name, "CameraX-Image");
    assert_eq!(config.preview_max_dimension, 1024);
    assert_eq!(
        config.rotation,
        Rotation::Rotate90,
        "Captures should be turned upright by default"
    );
}

#[test]
fn test_config_keeps_provisional_by_default() {
    // Keep leaves the provisional capture in the album unless asked otherwise
    let config = Config::default();
    assert!(!config.discard_provisional_on_keep);
}

#[test]
fn test_config_flash_pre_capture() {
    let config = Config {
        flash_pre_capture_ms: 250,
        ..Config::default()
    };
    assert_eq!(config.flash_pre_capture(), Duration::from_millis(250));
}
