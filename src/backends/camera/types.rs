// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the camera session

//! Shared types for camera backends

use std::sync::Arc;
use std::time::Instant;

/// Physical placement of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraLocation {
    /// Facing the user
    Front,
    /// Facing away from the user (the "rear" sensor on phones and tablets)
    Back,
    /// Plugged in (USB webcams)
    External,
    #[default]
    Unknown,
}

impl CameraLocation {
    /// Parse libcamera's `api.libcamera.location` property value
    pub fn from_property(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" => CameraLocation::Front,
            "back" | "rear" => CameraLocation::Back,
            "external" => CameraLocation::External,
            _ => CameraLocation::Unknown,
        }
    }
}

impl std::fmt::Display for CameraLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraLocation::Front => write!(f, "front"),
            CameraLocation::Back => write!(f, "back"),
            CameraLocation::External => write!(f, "external"),
            CameraLocation::Unknown => write!(f, "unknown"),
        }
    }
}

/// How the GStreamer source element reaches a camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSource {
    /// A specific PipeWire node, addressed by `object.serial` when known
    PipeWire {
        node_id: String,
        serial: Option<String>,
    },
    /// Whatever camera PipeWire picks
    PipeWireDefault,
    /// No PipeWire: let GStreamer autodetect a source
    Auto,
}

impl CameraSource {
    /// `gst-launch` description of the source element
    pub fn element_description(&self) -> String {
        match self {
            CameraSource::PipeWire {
                serial: Some(serial),
                ..
            } => format!("pipewiresrc target-object={} do-timestamp=true", serial),
            CameraSource::PipeWire { node_id, .. } => {
                format!("pipewiresrc path={} do-timestamp=true", node_id)
            }
            CameraSource::PipeWireDefault => "pipewiresrc do-timestamp=true".to_string(),
            CameraSource::Auto => "autovideosrc".to_string(),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub source: CameraSource,
    pub location: CameraLocation,
}

/// Pick the rear-facing camera, falling back to the first one
pub fn select_rear_camera(cameras: &[CameraDevice]) -> Option<usize> {
    cameras
        .iter()
        .position(|cam| cam.location == CameraLocation::Back)
        .or(if cameras.is_empty() { None } else { Some(0) })
}

/// One viewfinder frame, tightly packed RGBA
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// When the frame left the pipeline (latency diagnostics)
    pub captured_at: Instant,
}

/// One frame pulled from the still-capture stream
#[derive(Debug, Clone)]
pub struct StillFrame {
    pub image: image::RgbImage,
}

impl StillFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Drop the per-row padding GStreamer may add after `row_bytes`
pub fn pack_rows(data: &[u8], row_bytes: usize, stride: usize, height: usize) -> Vec<u8> {
    if stride == row_bytes {
        return data[..row_bytes * height].to_vec();
    }
    let mut packed = Vec::with_capacity(row_bytes * height);
    for row in data.chunks(stride).take(height) {
        packed.extend_from_slice(&row[..row_bytes]);
    }
    packed
}

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<PreviewFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// GStreamer or a required element is missing
    NotAvailable(String),
    /// Failed to build or start the pipeline
    InitializationFailed(String),
    /// No frame arrived in time
    Timeout,
    /// The pipeline stopped delivering frames
    StreamEnded,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::Timeout => write!(f, "Timed out waiting for a frame"),
            BackendError::StreamEnded => write!(f, "Camera stream ended"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam(name: &str, location: CameraLocation) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            source: CameraSource::PipeWireDefault,
            location,
        }
    }

    #[test]
    fn test_rear_camera_preferred() {
        let cams = [
            cam("selfie", CameraLocation::Front),
            cam("main", CameraLocation::Back),
        ];
        assert_eq!(select_rear_camera(&cams), Some(1));
    }

    #[test]
    fn test_first_camera_without_rear() {
        let cams = [cam("usb", CameraLocation::External)];
        assert_eq!(select_rear_camera(&cams), Some(0));
        assert_eq!(select_rear_camera(&[]), None);
    }

    #[test]
    fn test_source_prefers_serial() {
        let src = CameraSource::PipeWire {
            node_id: "76".into(),
            serial: Some("2146".into()),
        };
        assert_eq!(
            src.element_description(),
            "pipewiresrc target-object=2146 do-timestamp=true"
        );
    }

    #[test]
    fn test_pack_rows_strips_padding() {
        // 2x2 RGB with 8-byte stride (2 bytes padding per row)
        let data = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        assert_eq!(
            pack_rows(&data, 6, 8, 2),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn test_location_parsing() {
        assert_eq!(CameraLocation::from_property("Back"), CameraLocation::Back);
        assert_eq!(CameraLocation::from_property("front"), CameraLocation::Front);
        assert_eq!(CameraLocation::from_property("?"), CameraLocation::Unknown);
    }
}
