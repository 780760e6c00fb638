// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application
//!
//! Every failure is caught where it happens and surfaced to the user as a
//! short-lived notice. Only [`PermissionError`] ends the session.

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for the photo pipeline
pub type PhotoResult<T> = Result<T, PhotoError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Runtime permission was not granted
    Permission(PermissionError),
    /// Camera binding errors
    Camera(CameraError),
    /// Capture, preview and commit errors
    Photo(PhotoError),
    /// Command-line argument out of range
    InvalidArgument(String),
}

/// Permission gate errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The user (or the portal) refused camera access
    CameraDenied,
    /// The picture album cannot be created or written
    StorageDenied(String),
    /// The permission request itself failed (portal unreachable, bus error)
    RequestFailed(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// Pipeline could not be built or started
    BindingFailed(String),
    /// Camera disconnected or the stream ended
    Disconnected,
}

/// Photo pipeline errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// No camera session is bound
    NotBound,
    /// The still-capture stream produced no frame
    NoFrameAvailable,
    /// Capture failed
    CaptureFailed(String),
    /// Stored image could not be read or decoded
    DecodeFailed(String),
    /// Encoding failed
    EncodingFailed(String),
    /// Save failed
    SaveFailed(String),
    /// Deleting a provisional capture failed
    DeleteFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Permission(e) => write!(f, "Permission error: {}", e),
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::CameraDenied => write!(f, "Camera access denied"),
            PermissionError::StorageDenied(msg) => write!(f, "Storage not writable: {}", msg),
            PermissionError::RequestFailed(msg) => write!(f, "Permission request failed: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::BindingFailed(msg) => write!(f, "Failed to start camera: {}", msg),
            CameraError::Disconnected => write!(f, "Camera disconnected"),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NotBound => write!(f, "Camera is not ready"),
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::CaptureFailed(msg) => write!(f, "Photo capture failed: {}", msg),
            PhotoError::DecodeFailed(msg) => write!(f, "Could not load photo: {}", msg),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Failed to save photo: {}", msg),
            PhotoError::DeleteFailed(msg) => write!(f, "Failed to discard photo: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PermissionError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}

impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        AppError::Permission(err)
    }
}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<gstreamer::glib::Error> for AppError {
    fn from(err: gstreamer::glib::Error) -> Self {
        AppError::Camera(CameraError::BindingFailed(err.to_string()))
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::StreamEnded => CameraError::Disconnected,
            other => CameraError::BindingFailed(other.to_string()),
        }
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => PhotoError::EncodingFailed(e.to_string()),
            other => PhotoError::DecodeFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_error_messages_are_user_facing() {
        let err = AppError::from(PhotoError::SaveFailed("disk full".into()));
        assert_eq!(err.to_string(), "Photo error: Failed to save photo: disk full");
    }

    #[test]
    fn test_stream_end_is_a_disconnect() {
        assert!(matches!(
            CameraError::from(BackendError::StreamEnded),
            CameraError::Disconnected
        ));
        assert!(matches!(
            AppError::from(BackendError::Timeout),
            AppError::Camera(CameraError::BindingFailed(_))
        ));
    }

    #[test]
    fn test_permission_denial_message() {
        let err = AppError::from(PermissionError::CameraDenied);
        assert_eq!(err.to_string(), "Permission error: Camera access denied");
    }
}
