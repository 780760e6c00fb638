// SPDX-License-Identifier: GPL-3.0-only

//! Keep / retake handlers

use crate::app::state::{AppModel, Message};
use crate::errors::PhotoError;
use crate::fl;
use crate::storage::ImageReference;
use cosmic::Task;
use tracing::{debug, error, info};

impl AppModel {
    pub(crate) fn handle_keep(&mut self) -> Task<cosmic::Action<Message>> {
        let reference = match self.flow.begin_resolve() {
            Ok(reference) => reference,
            Err(rejection) => {
                debug!(?rejection, "Keep ignored");
                return Task::none();
            }
        };

        info!(entry = %reference, "Keeping photo");
        let pipeline = self.pipeline.clone();
        Task::perform(async move { pipeline.keep(reference).await }, |result| {
            cosmic::Action::App(Message::KeepFinished(result))
        })
    }

    pub(crate) fn handle_keep_finished(
        &mut self,
        result: Result<ImageReference, PhotoError>,
    ) -> Task<cosmic::Action<Message>> {
        self.flow.resolved();
        self.preview = None;

        match result {
            Ok(committed) => {
                let notice = self.notify(fl!("photo-saved", name = committed.display_name()));
                Task::batch([notice, self.refresh_gallery_thumbnail()])
            }
            Err(e) => {
                error!(error = %e, "Keep failed");
                self.notify(e.to_string())
            }
        }
    }

    pub(crate) fn handle_retake(&mut self) -> Task<cosmic::Action<Message>> {
        let reference = match self.flow.begin_resolve() {
            Ok(reference) => reference,
            Err(rejection) => {
                debug!(?rejection, "Retake ignored");
                return Task::none();
            }
        };

        info!(entry = %reference, "Discarding photo");
        let pipeline = self.pipeline.clone();
        Task::perform(async move { pipeline.retake(reference).await }, |result| {
            cosmic::Action::App(Message::RetakeFinished(result))
        })
    }

    pub(crate) fn handle_retake_finished(
        &mut self,
        result: Result<(), PhotoError>,
    ) -> Task<cosmic::Action<Message>> {
        self.flow.resolved();
        self.preview = None;

        match result {
            Ok(()) => self.refresh_gallery_thumbnail(),
            Err(e) => {
                error!(error = %e, "Retake failed");
                self.notify(e.to_string())
            }
        }
    }
}
