// SPDX-License-Identifier: GPL-3.0-only

//! Permission gate handlers
//!
//! The gate runs once at startup. A denial shows a notice and closes the
//! window; no camera stream is ever bound in that case.

use crate::app::state::{AppModel, Message, PermissionState};
use crate::constants::timing;
use crate::fl;
use crate::permissions::{PermissionGate, PermissionOutcome};
use cosmic::Task;
use tracing::{error, info};

impl AppModel {
    /// Ask for camera and storage access
    pub(crate) fn request_permissions(&self) -> Task<cosmic::Action<Message>> {
        let gate = PermissionGate::new(self.pipeline.store().album_dir());
        Task::perform(async move { gate.ensure().await }, |outcome| {
            cosmic::Action::App(Message::PermissionResolved(outcome))
        })
    }

    pub(crate) fn handle_permission_resolved(
        &mut self,
        outcome: PermissionOutcome,
    ) -> Task<cosmic::Action<Message>> {
        match outcome {
            PermissionOutcome::Granted => {
                info!("Permissions granted");
                self.permission = PermissionState::Granted;
                Task::batch([self.enumerate_cameras(), self.refresh_gallery_thumbnail()])
            }
            PermissionOutcome::Denied(reason) => {
                error!(%reason, "Permission denied, ending session");
                self.permission = PermissionState::Denied(reason.clone());
                self.session.shut_down();
                let notice = self.notify(fl!("permission-denied", reason = reason.to_string()));
                Task::batch([
                    notice,
                    Self::delay_task(timing::DENIED_EXIT_DELAY_MS, Message::Exit),
                ])
            }
        }
    }

    pub(crate) fn handle_exit(&mut self) -> Task<cosmic::Action<Message>> {
        info!("Closing application");
        cosmic::iced::exit()
    }
}
