// SPDX-License-Identifier: GPL-3.0-only

//! Camera session handlers
//!
//! Handles camera enumeration, binding, viewfinder frames and the flash
//! toggle. Binding itself happens in [`AppModel::camera_subscription`].

use crate::app::state::{AppModel, CameraSession, Message, SessionStatus};
use crate::backends::camera::{
    CameraDevice, CaptureSession, PreviewFrame, enumerate_cameras, select_rear_camera,
};
use crate::constants::pipeline;
use crate::errors::CameraError;
use crate::fl;
use crate::flash::{FlashHardware, FlashMode, FlashState, FlashToggle};
use cosmic::Task;
use cosmic::iced::Subscription;
use cosmic::widget::image::Handle;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What the running session reports back
enum SessionEvent {
    Frame(PreviewFrame),
    Failed(String),
}

impl AppModel {
    // =========================================================================
    // Enumeration & Binding
    // =========================================================================

    pub(crate) fn enumerate_cameras(&self) -> Task<cosmic::Action<Message>> {
        Task::perform(
            async {
                tokio::task::spawn_blocking(enumerate_cameras)
                    .await
                    .unwrap_or_default()
            },
            |cameras| cosmic::Action::App(Message::CamerasEnumerated(cameras)),
        )
    }

    pub(crate) fn handle_cameras_enumerated(
        &mut self,
        cameras: Vec<CameraDevice>,
    ) -> Task<cosmic::Action<Message>> {
        info!(count = cameras.len(), "Cameras enumerated");
        self.available_cameras = cameras;

        match select_rear_camera(&self.available_cameras) {
            Some(index) => {
                let device = self.available_cameras[index].clone();
                info!(name = %device.name, location = %device.location, "Selected camera");
                self.session.device = Some(device);
                self.start_camera()
            }
            None => {
                warn!("No camera to bind");
                self.session.status = SessionStatus::Failed(CameraError::NoCameraFound);
                self.notify(CameraError::NoCameraFound.to_string())
            }
        }
    }

    /// Unbind whatever is bound and bind the selected camera again
    pub(crate) fn start_camera(&mut self) -> Task<cosmic::Action<Message>> {
        if !self.permission.allows_camera() {
            debug!("Camera start ignored until permissions are granted");
            return Task::none();
        }
        if self.session.device.is_none() {
            // Nothing was found at startup; look again
            return self.enumerate_cameras();
        }

        let flash = FlashState::new(FlashHardware::detect(), self.config.flash_pre_capture());
        self.session = CameraSession {
            generation: self.session.generation + 1,
            device: self.session.device.take(),
            status: SessionStatus::Binding,
            flash,
        };
        self.viewfinder = None;
        info!(generation = self.session.generation, "Binding camera session");
        Task::none()
    }

    pub(crate) fn handle_camera_bound(
        &mut self,
        generation: u64,
        still: crate::backends::camera::StillCapture,
    ) -> Task<cosmic::Action<Message>> {
        if !self.session.is_current(generation) {
            debug!(generation, "Ignoring bind from stale session");
            return Task::none();
        }
        info!(generation, "Camera session ready");
        self.session.status = SessionStatus::Bound(still);
        Task::none()
    }

    pub(crate) fn handle_camera_failed(
        &mut self,
        generation: u64,
        error: CameraError,
    ) -> Task<cosmic::Action<Message>> {
        if !self.session.is_current(generation) {
            debug!(generation, "Ignoring failure from stale session");
            return Task::none();
        }
        error!(generation, %error, "Camera session failed");
        self.session.status = SessionStatus::Failed(error.clone());
        self.viewfinder = None;
        self.notify(fl!("camera-failed", reason = error.to_string()))
    }

    pub(crate) fn handle_camera_frame(
        &mut self,
        generation: u64,
        frame: Arc<PreviewFrame>,
    ) -> Task<cosmic::Action<Message>> {
        if !self.session.is_current(generation) || !self.session.wants_stream() {
            return Task::none();
        }
        self.viewfinder = Some(Handle::from_rgba(
            frame.width,
            frame.height,
            frame.data.to_vec(),
        ));
        Task::none()
    }

    // =========================================================================
    // Flash
    // =========================================================================

    pub(crate) fn handle_toggle_flash(&mut self) -> Task<cosmic::Action<Message>> {
        match self.session.flash.toggle() {
            FlashToggle::Switched(FlashMode::On) => self.notify(fl!("flash-enabled")),
            FlashToggle::Switched(FlashMode::Off) => self.notify(fl!("flash-disabled")),
            FlashToggle::Unavailable => {
                info!("Flash toggle requested but no flash LED is controllable");
                self.notify(fl!("flash-unavailable"))
            }
        }
    }

    // =========================================================================
    // Session Subscription
    // =========================================================================

    /// Stream of viewfinder frames for the current session generation
    ///
    /// Keyed on the generation: bumping it drops the running pipeline and
    /// binds a fresh one. A failed bind is reported once and not retried.
    pub(crate) fn camera_subscription(&self) -> Subscription<Message> {
        use futures::{SinkExt, StreamExt};

        if !self.session.may_bind(&self.permission) {
            return Subscription::none();
        }
        let Some(device) = self.session.device.clone() else {
            return Subscription::none();
        };
        let generation = self.session.generation;

        Subscription::run_with_id(
            ("camera-session", generation),
            cosmic::iced::stream::channel(
                pipeline::FRAME_CHANNEL_CAPACITY * 2,
                move |mut output| async move {
                    info!(generation, camera = %device.name, "Camera subscription started");

                    let (sender, receiver) =
                        futures::channel::mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
                    let bound =
                        tokio::task::spawn_blocking(move || CaptureSession::bind(&device, sender))
                            .await;

                    let session = match bound {
                        Ok(Ok(session)) => session,
                        Ok(Err(e)) => {
                            error!(error = %e, "Failed to bind camera");
                            let _ = output
                                .send(Message::CameraFailed(generation, e.into()))
                                .await;
                            return;
                        }
                        Err(e) => {
                            error!(error = %e, "Camera bind task panicked");
                            let _ = output
                                .send(Message::CameraFailed(
                                    generation,
                                    CameraError::BindingFailed(e.to_string()),
                                ))
                                .await;
                            return;
                        }
                    };

                    if output
                        .send(Message::CameraBound(generation, session.still_capture()))
                        .await
                        .is_err()
                    {
                        return;
                    }

                    let bus_events = match session.bus() {
                        Some(bus) => bus
                            .stream()
                            .filter_map(|msg| {
                                let event = match msg.view() {
                                    gstreamer::MessageView::Error(err) => {
                                        Some(SessionEvent::Failed(err.error().to_string()))
                                    }
                                    gstreamer::MessageView::Eos(_) => {
                                        Some(SessionEvent::Failed("end of stream".to_string()))
                                    }
                                    _ => None,
                                };
                                futures::future::ready(event)
                            })
                            .boxed(),
                        None => futures::stream::empty().boxed(),
                    };
                    let mut events =
                        futures::stream::select(receiver.map(SessionEvent::Frame), bus_events);

                    let mut frame_count = 0u64;
                    while let Some(event) = events.next().await {
                        match event {
                            SessionEvent::Frame(frame) => {
                                frame_count += 1;
                                let latency_us = frame.captured_at.elapsed().as_micros();
                                if frame_count % crate::constants::timing::FRAME_LOG_INTERVAL == 0
                                {
                                    debug!(
                                        frame = frame_count,
                                        width = frame.width,
                                        height = frame.height,
                                        latency_ms = latency_us as f64 / 1000.0,
                                        "Viewfinder frame"
                                    );
                                }
                                // Dropping frames is fine for live preview
                                let message = Message::CameraFrame(generation, Arc::new(frame));
                                if let Err(e) = output.try_send(message)
                                    && e.is_disconnected()
                                {
                                    info!("Output channel closed, stopping camera subscription");
                                    break;
                                }
                            }
                            SessionEvent::Failed(reason) => {
                                error!(%reason, "Camera stream stopped");
                                let _ = output
                                    .send(Message::CameraFailed(
                                        generation,
                                        CameraError::Disconnected,
                                    ))
                                    .await;
                                break;
                            }
                        }
                    }

                    info!(generation, frames = frame_count, "Camera subscription ending");
                    drop(session);
                },
            ),
        )
    }
}
