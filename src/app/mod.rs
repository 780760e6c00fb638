// SPDX-License-Identifier: GPL-3.0-only

//! Main application module
//!
//! # Architecture
//!
//! - `state`: application state types (`AppModel`, `Message`, session state)
//! - `flow`: LIVE / PREVIEW state machine with capture and decision guards
//! - `view`: main view rendering
//! - `update`: message dispatch
//! - `handlers`: message handlers grouped by domain
//!
//! Startup runs the permission gate; only a granted gate leads to camera
//! enumeration and the session subscription.

pub mod flow;
mod handlers;
mod state;
mod update;
mod view;

use crate::config::Config;
use crate::fl;
use crate::pipelines::photo::PhotoPipeline;
use cosmic::app::context_drawer;
use cosmic::iced::Subscription;
use cosmic::widget::{self, about::About, toaster::Toasts};
use cosmic::{Element, Task};
pub use flow::{CaptureFlow, CaptureUiState};
pub use state::{
    AppModel, CameraSession, ContextPage, Message, PermissionState, PreviewImage, SessionStatus,
};
use tracing::{error, info};

const REPOSITORY: &str = "https://github.com/snapcam/snapcam";

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = "io.github.snapcam.Snapcam";

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let about = About::default()
            .name(fl!("app-title"))
            .icon(widget::icon::from_name(Self::APP_ID))
            .version(crate::constants::app_info::version())
            .links([(fl!("repository"), REPOSITORY)])
            .license(env!("CARGO_PKG_LICENSE"));

        let (config_handler, config) = Config::load(Self::APP_ID);

        // Required before any GStreamer call; enumeration and binding report
        // their own errors if this fails
        if let Err(e) = gstreamer::init() {
            error!(error = %e, "Failed to initialize GStreamer");
        }

        let pipeline = PhotoPipeline::from_config(&config);
        info!(album = %pipeline.store().album_dir().display(), rotation = %pipeline.rotation(), "Photo pipeline ready");

        let app = AppModel {
            core,
            context_page: ContextPage::default(),
            about,
            config,
            config_handler,
            pipeline,
            permission: PermissionState::default(),
            available_cameras: Vec::new(),
            session: CameraSession::default(),
            flow: CaptureFlow::default(),
            viewfinder: None,
            preview: None,
            gallery_thumbnail: None,
            toasts: Toasts::new(Message::CloseToast),
        };

        let permission_task = app.request_permissions();
        (app, permission_task)
    }

    /// Elements to pack at the end of the header bar.
    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        vec![
            widget::button::icon(widget::icon::from_name("help-about-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::About))
                .into(),
        ]
    }

    /// Display a context drawer if the context page is requested.
    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Self::Message>> {
        if !self.core.window.show_context {
            return None;
        }

        Some(match self.context_page {
            ContextPage::About => context_drawer::about(
                &self.about,
                |url| Message::LaunchUrl(url.to_string()),
                Message::ToggleContextPage(ContextPage::About),
            ),
        })
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        Subscription::batch([config_sub, self.camera_subscription()])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}
