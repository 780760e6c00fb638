// SPDX-License-Identifier: GPL-3.0-only

//! System handlers
//!
//! Handles the gallery, context pages, external links and configuration.

use crate::app::state::{AppModel, ContextPage, Message};
use crate::config::Config;
use crate::fl;
use crate::pipelines::photo::PhotoPipeline;
use cosmic::Task;
use cosmic::widget::image::Handle;
use tracing::{error, info};

impl AppModel {
    // =========================================================================
    // Gallery Handlers
    // =========================================================================

    pub(crate) fn handle_open_gallery(&mut self) -> Task<cosmic::Action<Message>> {
        let album = self.pipeline.store().album_dir();
        info!(path = %album.display(), "Opening gallery directory");

        if let Err(e) = open::that(&album) {
            error!(error = %e, path = %album.display(), "Failed to open gallery directory");
            return self.notify(fl!("gallery-unavailable"));
        }
        Task::none()
    }

    pub(crate) fn refresh_gallery_thumbnail(&self) -> Task<cosmic::Action<Message>> {
        let store = self.pipeline.store().clone();
        Task::perform(
            async move { crate::storage::load_latest_thumbnail(store).await },
            |handle| cosmic::Action::App(Message::GalleryThumbnailLoaded(handle)),
        )
    }

    pub(crate) fn handle_gallery_thumbnail_loaded(
        &mut self,
        handle: Option<Handle>,
    ) -> Task<cosmic::Action<Message>> {
        self.gallery_thumbnail = handle;
        Task::none()
    }

    // =========================================================================
    // Navigation Handlers
    // =========================================================================

    pub(crate) fn handle_launch_url(&self, url: String) -> Task<cosmic::Action<Message>> {
        if let Err(err) = open::that_detached(&url) {
            error!(url = %url, error = %err, "Failed to open URL");
        }
        Task::none()
    }

    pub(crate) fn handle_toggle_context_page(
        &mut self,
        context_page: ContextPage,
    ) -> Task<cosmic::Action<Message>> {
        if self.context_page == context_page {
            self.core.window.show_context = !self.core.window.show_context;
        } else {
            self.context_page = context_page;
            self.core.window.show_context = true;
        }
        Task::none()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub(crate) fn handle_update_config(&mut self, config: Config) -> Task<cosmic::Action<Message>> {
        info!("UpdateConfig received");
        let theme_changed = config.app_theme != self.config.app_theme;
        let flash_lead_changed = config.flash_pre_capture_ms != self.config.flash_pre_capture_ms;

        // A capture in flight keeps the pipeline it was started with
        self.pipeline = PhotoPipeline::from_config(&config);
        self.config = config;
        if flash_lead_changed {
            self.session.flash.set_pre_capture(self.config.flash_pre_capture());
        }

        if theme_changed {
            cosmic::command::set_theme(self.config.app_theme.theme())
        } else {
            Task::none()
        }
    }
}
