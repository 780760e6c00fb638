// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function only dispatches; the handlers live in the
//! `handlers` submodules:
//!
//! - `handlers::permission`: permission gate result, shutdown on denial
//! - `handlers::camera`: enumeration, session binding, frames, flash
//! - `handlers::capture`: still acquisition and preview decoding
//! - `handlers::decision`: keep / retake
//! - `handlers::system`: gallery, context pages, configuration

use crate::app::state::{AppModel, Message};
use cosmic::Task;

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            // ===== UI Navigation =====
            Message::LaunchUrl(url) => self.handle_launch_url(url),
            Message::ToggleContextPage(page) => self.handle_toggle_context_page(page),
            Message::CloseToast(id) => {
                self.toasts.remove(id);
                Task::none()
            }

            // ===== Permissions =====
            Message::PermissionResolved(outcome) => self.handle_permission_resolved(outcome),
            Message::Exit => self.handle_exit(),

            // ===== Camera Session =====
            Message::CamerasEnumerated(cameras) => self.handle_cameras_enumerated(cameras),
            Message::StartCamera => self.start_camera(),
            Message::CameraBound(generation, still) => self.handle_camera_bound(generation, still),
            Message::CameraFailed(generation, error) => {
                self.handle_camera_failed(generation, error)
            }
            Message::CameraFrame(generation, frame) => self.handle_camera_frame(generation, frame),
            Message::ToggleFlash => self.handle_toggle_flash(),

            // ===== Capture / Decision =====
            Message::Capture => self.handle_capture(),
            Message::CaptureFinished(result) => self.handle_capture_finished(result),
            Message::PreviewLoaded(reference, preview) => {
                self.handle_preview_loaded(reference, preview)
            }
            Message::Keep => self.handle_keep(),
            Message::KeepFinished(result) => self.handle_keep_finished(result),
            Message::Retake => self.handle_retake(),
            Message::RetakeFinished(result) => self.handle_retake_finished(result),

            // ===== System =====
            Message::OpenGallery => self.handle_open_gallery(),
            Message::GalleryThumbnailLoaded(handle) => self.handle_gallery_thumbnail_loaded(handle),
            Message::UpdateConfig(config) => self.handle_update_config(config),
        }
    }
}
