// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::app::flow::CaptureFlow;
use crate::backends::camera::{CameraDevice, PreviewFrame, StillCapture};
use crate::config::Config;
use crate::errors::{CameraError, PermissionError, PhotoError};
use crate::flash::FlashState;
use crate::permissions::PermissionOutcome;
use crate::pipelines::photo::{DecodedPreview, PhotoPipeline};
use crate::storage::ImageReference;
use cosmic::cosmic_config;
use cosmic::widget::about::About;
use cosmic::widget::image::Handle;
use cosmic::widget::toaster::{ToastId, Toasts};
use std::sync::Arc;

/// Where the permission gate stands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PermissionState {
    /// Request not answered yet
    #[default]
    Pending,
    Granted,
    /// The session is over; the window closes shortly
    Denied(PermissionError),
}

impl PermissionState {
    /// Only a granted gate lets the camera start
    pub fn allows_camera(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Lifecycle of the camera binding
#[derive(Debug, Clone, Default)]
pub enum SessionStatus {
    /// Nothing requested yet
    #[default]
    Unbound,
    /// Pipeline is being built for the current generation
    Binding,
    /// Streaming; stills can be pulled
    Bound(StillCapture),
    /// Binding failed or the stream died; stays unusable until rebound
    Failed(CameraError),
}

/// Capture session state
///
/// Every bind bumps `generation`; the camera subscription is keyed on it, so
/// a new generation drops the old pipeline before the new one starts.
/// Messages from older generations are ignored.
#[derive(Debug, Default)]
pub struct CameraSession {
    pub generation: u64,
    pub device: Option<CameraDevice>,
    pub status: SessionStatus,
    pub flash: FlashState,
}

impl CameraSession {
    /// Still-capture handle, if streaming
    pub fn still(&self) -> Option<&StillCapture> {
        match &self.status {
            SessionStatus::Bound(still) => Some(still),
            _ => None,
        }
    }

    /// Whether the subscription should be running
    pub fn wants_stream(&self) -> bool {
        self.device.is_some()
            && matches!(
                self.status,
                SessionStatus::Binding | SessionStatus::Bound(_)
            )
    }

    /// Whether a camera stream may be bound under `permission`
    pub fn may_bind(&self, permission: &PermissionState) -> bool {
        permission.allows_camera() && self.wants_stream()
    }

    /// True for messages of the current generation
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Drop the device and binding for good
    ///
    /// The generation still advances so late messages from a running
    /// subscription are treated as stale.
    pub fn shut_down(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }
}

/// Decoded capture shown on the decision screen
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
}

/// The application model stores app-specific state used to describe its
/// interface and drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Display a context drawer with the designated page if defined.
    pub context_page: ContextPage,
    /// The about page for this app.
    pub about: About,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Configuration handler for saving settings
    pub config_handler: Option<cosmic_config::Config>,
    /// Capture, preview and commit stages
    pub pipeline: PhotoPipeline,
    pub permission: PermissionState,
    /// Cameras found at startup
    pub available_cameras: Vec<CameraDevice>,
    pub session: CameraSession,
    /// LIVE / PREVIEW state machine
    pub flow: CaptureFlow,
    /// Latest viewfinder frame
    pub viewfinder: Option<Handle>,
    /// Decision screen image; dropped when leaving PREVIEW
    pub preview: Option<PreviewImage>,
    /// Latest gallery thumbnail (cached)
    pub gallery_thumbnail: Option<Handle>,
    /// Transient notices
    pub toasts: Toasts<Message>,
}

/// The context page to display in the context drawer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ContextPage {
    #[default]
    About,
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    // ===== UI Navigation =====
    /// Open external URL (repository, etc.)
    LaunchUrl(String),
    /// Toggle context drawer page
    ToggleContextPage(ContextPage),
    /// Dismiss a notice
    CloseToast(ToastId),

    // ===== Permissions =====
    /// Permission gate answered
    PermissionResolved(PermissionOutcome),
    /// Close the window after a denial
    Exit,

    // ===== Camera Session =====
    /// Cameras enumerated after the gate opened
    CamerasEnumerated(Vec<CameraDevice>),
    /// Unbind and rebind the session
    StartCamera,
    /// Session for the given generation is streaming
    CameraBound(u64, StillCapture),
    /// Session for the given generation failed
    CameraFailed(u64, CameraError),
    /// New viewfinder frame from the given generation
    CameraFrame(u64, Arc<PreviewFrame>),
    /// Flip the still-capture flash
    ToggleFlash,

    // ===== Capture / Decision =====
    /// Shutter pressed
    Capture,
    /// Acquisition finished
    CaptureFinished(Result<ImageReference, PhotoError>),
    /// Preview decode finished
    PreviewLoaded(ImageReference, Result<Arc<DecodedPreview>, PhotoError>),
    /// Commit the photo on the decision screen
    Keep,
    KeepFinished(Result<ImageReference, PhotoError>),
    /// Discard the photo on the decision screen
    Retake,
    RetakeFinished(Result<(), PhotoError>),

    // ===== System =====
    /// Open the album in the default viewer
    OpenGallery,
    /// Latest album thumbnail loaded
    GalleryThumbnailLoaded(Option<Handle>),
    /// Update configuration
    UpdateConfig(Config),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{CameraLocation, CameraSource};

    fn device() -> CameraDevice {
        CameraDevice {
            name: "Test Camera".to_string(),
            source: CameraSource::Auto,
            location: CameraLocation::Back,
        }
    }

    fn binding_session() -> CameraSession {
        CameraSession {
            generation: 3,
            device: Some(device()),
            status: SessionStatus::Binding,
            flash: FlashState::default(),
        }
    }

    #[test]
    fn test_granted_session_binds() {
        assert!(binding_session().may_bind(&PermissionState::Granted));
    }

    #[test]
    fn test_denied_or_pending_never_binds() {
        let session = binding_session();
        assert!(session.wants_stream());
        assert!(!session.may_bind(&PermissionState::Pending));
        assert!(!session.may_bind(&PermissionState::Denied(PermissionError::CameraDenied)));
        assert!(!session.may_bind(&PermissionState::Denied(
            PermissionError::StorageDenied("read-only".to_string())
        )));
    }

    #[test]
    fn test_unbound_or_failed_session_does_not_bind() {
        let mut session = binding_session();
        session.status = SessionStatus::Unbound;
        assert!(!session.may_bind(&PermissionState::Granted));

        session.status = SessionStatus::Failed(CameraError::Disconnected);
        assert!(!session.may_bind(&PermissionState::Granted));

        session.status = SessionStatus::Binding;
        session.device = None;
        assert!(!session.may_bind(&PermissionState::Granted));
    }

    #[test]
    fn test_shut_down_leaves_nothing_to_bind() {
        let mut session = binding_session();
        session.shut_down();

        assert!(session.device.is_none());
        assert!(!session.wants_stream());
        assert!(!session.may_bind(&PermissionState::Granted));
        assert_eq!(session.generation, 4);
        assert!(!session.is_current(3), "frames of the old binding are stale");
    }

    #[test]
    fn test_only_current_generation_is_accepted() {
        let session = binding_session();
        assert!(session.is_current(3));
        assert!(!session.is_current(2));
        assert!(!session.is_current(4));
    }
}
