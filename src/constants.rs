// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Shared picture storage layout
pub mod storage {
    /// Top-level collection the album lives in (XDG Pictures)
    pub const COLLECTION_DIR: &str = "Pictures";

    /// Album directory captures and committed photos are written to
    pub const DEFAULT_ALBUM: &str = "CameraX-Image";

    /// `chrono` pattern for `yyyy-MM-dd-HH-mm-ss-SSS` display names
    pub const DISPLAY_NAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

    /// MIME type of every entry this app inserts
    pub const JPEG_MIME: &str = "image/jpeg";

    /// Collision suffixes tried before `insert` gives up
    pub const MAX_NAME_ATTEMPTS: u32 = 1000;

    /// Prefix of in-progress writes; hidden so viewers never list them
    pub const PARTIAL_PREFIX: &str = ".pending-";
}

/// Preview and commit image parameters
pub mod photo {
    /// Neither preview dimension is kept above this bound by the sampler
    pub const PREVIEW_MAX_DIMENSION: u32 = 1024;

    /// JPEG quality of the committed (kept) copy
    pub const COMMIT_JPEG_QUALITY: u8 = 100;

    /// Rotation applied to captures before display and commit, in degrees
    pub const DEFAULT_ROTATION_DEGREES: i32 = 90;
}

/// GStreamer pipeline parameters
pub mod pipeline {
    /// Preview queue depth (keep small for low latency)
    pub const PREVIEW_MAX_BUFFERS: u32 = 2;

    /// The still branch only ever holds the newest frame
    pub const STILL_MAX_BUFFERS: u32 = 1;

    /// Pixel format delivered to the viewfinder
    pub const PREVIEW_FORMAT: &str = "RGBA";

    /// Pixel format delivered to the still-capture branch
    pub const STILL_FORMAT: &str = "RGB";

    /// Capacity of the preview frame channel towards the UI
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 60;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// How long a still grab waits for the sensor to deliver a frame
    pub const STILL_PULL_TIMEOUT: Duration = Duration::from_secs(3);

    /// Default time the flash LEDs burn before the still is grabbed
    pub const DEFAULT_FLASH_PRE_CAPTURE_MS: u64 = 300;

    /// Delay between the permission-denied notice and closing the window
    pub const DENIED_EXIT_DELAY_MS: u64 = 2500;

    /// Camera warm-up for headless captures (auto exposure settling)
    pub const CLI_WARMUP: Duration = Duration::from_millis(800);
}

/// UI sizing
pub mod ui {
    /// Shutter button size (outer)
    pub const CAPTURE_BUTTON_OUTER: f32 = 64.0;

    /// Shutter button size (inner disc)
    pub const CAPTURE_BUTTON_INNER: f32 = 54.0;

    /// Shutter button border radius
    pub const CAPTURE_BUTTON_RADIUS: f32 = 27.0;

    /// Gallery thumbnail button edge length
    pub const GALLERY_BUTTON_SIZE: f32 = 40.0;

    /// Width of the keep / retake buttons
    pub const DECISION_BUTTON_WIDTH: f32 = 140.0;

    /// Padding around the bottom control row
    pub const CONTROL_ROW_PADDING: u16 = 16;
}

/// Application information utilities
pub mod app_info {
    use std::path::Path;

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Check if the application is running inside a Flatpak sandbox
    pub fn is_flatpak() -> bool {
        Path::new("/.flatpak-info").exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_pattern_has_millis() {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_milli_opt(7, 5, 1, 42))
            .unwrap();
        assert_eq!(
            ts.format(storage::DISPLAY_NAME_FORMAT).to_string(),
            "2024-03-09-07-05-01-042"
        );
    }
}
