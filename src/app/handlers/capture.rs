// SPDX-License-Identifier: GPL-3.0-only

//! Capture handlers
//!
//! Shutter press → still acquisition → preview decode → decision screen.

use crate::app::state::{AppModel, Message, PreviewImage};
use crate::backends::camera::StillSource;
use crate::errors::PhotoError;
use crate::pipelines::photo::DecodedPreview;
use crate::storage::ImageReference;
use cosmic::Task;
use cosmic::widget::image::Handle;
use std::sync::Arc;
use tracing::{debug, error, info};

impl AppModel {
    pub(crate) fn handle_capture(&mut self) -> Task<cosmic::Action<Message>> {
        if let Err(rejection) = self.flow.begin_capture() {
            debug!(?rejection, "Capture request rejected");
            return Task::none();
        }

        let Some(still) = self.session.still().cloned() else {
            self.flow.capture_failed();
            return self.notify(PhotoError::NotBound.to_string());
        };

        info!(flash = ?self.session.flash.mode(), "Capturing photo...");
        let pipeline = self.pipeline.clone();
        let flash = self.session.flash.clone();
        let source: Arc<dyn StillSource> = Arc::new(still);

        Task::perform(
            async move { pipeline.capture(source, flash).await },
            |result| cosmic::Action::App(Message::CaptureFinished(result)),
        )
    }

    pub(crate) fn handle_capture_finished(
        &mut self,
        result: Result<ImageReference, PhotoError>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(reference) => {
                debug!(entry = %reference, "Loading preview");
                let pipeline = self.pipeline.clone();
                Task::perform(
                    async move {
                        let preview = pipeline.load_preview(reference.clone()).await;
                        (reference, preview.map(Arc::new))
                    },
                    |(reference, preview)| {
                        cosmic::Action::App(Message::PreviewLoaded(reference, preview))
                    },
                )
            }
            Err(e) => {
                error!(error = %e, "Capture failed");
                self.flow.capture_failed();
                self.notify(e.to_string())
            }
        }
    }

    pub(crate) fn handle_preview_loaded(
        &mut self,
        reference: ImageReference,
        preview: Result<Arc<DecodedPreview>, PhotoError>,
    ) -> Task<cosmic::Action<Message>> {
        match preview {
            Ok(preview) => {
                let preview = Arc::unwrap_or_clone(preview);
                self.preview = Some(PreviewImage {
                    width: preview.width,
                    height: preview.height,
                    handle: Handle::from_rgba(preview.width, preview.height, preview.rgba),
                });
                self.flow.show_preview(reference);
                Task::none()
            }
            Err(e) => {
                // The provisional file stays in the album
                error!(entry = %reference, error = %e, "Preview decode failed");
                self.flow.preview_failed();
                self.notify(e.to_string())
            }
        }
    }
}
