// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! Exactly one of two layouts is visible:
//! - LIVE: viewfinder with flash toggle, shutter and gallery button
//! - PREVIEW: the captured photo with retake and keep
//!
//! Both are wrapped in the toaster that carries transient notices.

use crate::app::flow::CaptureUiState;
use crate::app::state::{AppModel, Message, PermissionState, SessionStatus};
use crate::constants::ui;
use crate::fl;
use crate::flash::FlashMode;
use cosmic::Element;
use cosmic::iced::{Alignment, Background, Color, ContentFit, Length};
use cosmic::widget::{self, icon};

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        let content = match &self.permission {
            PermissionState::Pending => Self::centered_message(fl!("waiting-permission")),
            PermissionState::Denied(reason) => {
                Self::centered_message(fl!("permission-denied", reason = reason.to_string()))
            }
            PermissionState::Granted => match (self.flow.state(), &self.preview) {
                (CaptureUiState::Preview, Some(_)) => self.build_decision_view(),
                _ => self.build_live_view(),
            },
        };

        let page = widget::container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme| widget::container::Style {
                background: Some(Background::Color(Color::BLACK)),
                ..Default::default()
            });

        widget::toaster(&self.toasts, page)
    }

    fn centered_message<'a>(text: String) -> Element<'a, Message> {
        widget::container(widget::text::title4(text))
            .width(Length::Fill)
            .height(Length::Fill)
            .center(Length::Fill)
            .into()
    }

    // =========================================================================
    // LIVE
    // =========================================================================

    fn build_live_view(&self) -> Element<'_, Message> {
        let viewfinder: Element<'_, Message> = match (&self.viewfinder, &self.session.status) {
            (Some(frame), _) => widget::image::Image::new(frame.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            (None, SessionStatus::Failed(error)) => {
                let spacing = cosmic::theme::spacing();
                widget::container(
                    widget::column()
                        .push(widget::text::body(fl!(
                            "camera-failed",
                            reason = error.to_string()
                        )))
                        .push(
                            widget::button::standard(fl!("restart-camera"))
                                .on_press(Message::StartCamera),
                        )
                        .spacing(spacing.space_s)
                        .align_x(Alignment::Center),
                )
                .width(Length::Fill)
                .height(Length::Fill)
                .center(Length::Fill)
                .into()
            }
            (None, _) => Self::centered_message(fl!("camera-starting")),
        };

        let controls = widget::row()
            .push(self.build_flash_button())
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .push(self.build_capture_button())
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .push(self.build_gallery_button())
            .align_y(Alignment::Center)
            .padding(ui::CONTROL_ROW_PADDING)
            .width(Length::Fill);

        widget::column()
            .push(viewfinder)
            .push(controls)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Shutter: white disc, grey and pressed while a capture is in flight
    fn build_capture_button(&self) -> Element<'_, Message> {
        let ready = self.session.still().is_some() && !self.flow.is_capturing();

        let (color, inner_size) = if self.flow.is_capturing() {
            (Color::from_rgb(0.7, 0.7, 0.7), ui::CAPTURE_BUTTON_INNER * 0.85)
        } else if ready {
            (Color::WHITE, ui::CAPTURE_BUTTON_INNER)
        } else {
            (Color::from_rgba(0.5, 0.5, 0.5, 0.3), ui::CAPTURE_BUTTON_INNER)
        };

        let disc = widget::container(widget::Space::new(
            Length::Fixed(inner_size),
            Length::Fixed(inner_size),
        ))
        .style(move |_theme| widget::container::Style {
            background: Some(Background::Color(color)),
            border: cosmic::iced::Border {
                radius: [ui::CAPTURE_BUTTON_RADIUS * (inner_size / ui::CAPTURE_BUTTON_INNER); 4]
                    .into(),
                ..Default::default()
            },
            ..Default::default()
        });

        let button = widget::button::custom(disc)
            .on_press_maybe(ready.then_some(Message::Capture))
            .padding(0)
            .width(Length::Fixed(ui::CAPTURE_BUTTON_OUTER))
            .height(Length::Fixed(ui::CAPTURE_BUTTON_OUTER));

        widget::tooltip(
            widget::container(button)
                .width(Length::Fixed(ui::CAPTURE_BUTTON_OUTER))
                .height(Length::Fixed(ui::CAPTURE_BUTTON_OUTER))
                .center(Length::Fixed(ui::CAPTURE_BUTTON_OUTER)),
            widget::text::body(fl!("capture")),
            widget::tooltip::Position::Top,
        )
        .into()
    }

    fn build_flash_button(&self) -> Element<'_, Message> {
        let name = match self.session.flash.mode() {
            FlashMode::On => "camera-flash-symbolic",
            FlashMode::Off => "flash-off-symbolic",
        };

        widget::button::icon(icon::from_name(name))
            .on_press(Message::ToggleFlash)
            .width(Length::Fixed(ui::GALLERY_BUTTON_SIZE))
            .into()
    }

    /// Latest photo thumbnail, or a folder icon for an empty album
    fn build_gallery_button(&self) -> Element<'_, Message> {
        let size = ui::GALLERY_BUTTON_SIZE;
        let content: Element<'_, Message> = match &self.gallery_thumbnail {
            Some(thumbnail) => widget::image::Image::new(thumbnail.clone())
                .content_fit(ContentFit::Cover)
                .width(Length::Fixed(size - 2.0))
                .height(Length::Fixed(size - 2.0))
                .into(),
            None => widget::container(icon::from_name("folder-pictures-symbolic").size(24))
                .width(Length::Fixed(size))
                .height(Length::Fixed(size))
                .center(Length::Fixed(size))
                .into(),
        };

        widget::button::custom(content)
            .on_press(Message::OpenGallery)
            .padding(0)
            .width(Length::Fixed(size))
            .height(Length::Fixed(size))
            .class(cosmic::theme::Button::Image)
            .into()
    }

    // =========================================================================
    // PREVIEW
    // =========================================================================

    fn build_decision_view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();
        let enabled = !self.flow.is_resolving();

        let photo: Element<'_, Message> = match &self.preview {
            Some(preview) => widget::image::Image::new(preview.handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => widget::Space::new(Length::Fill, Length::Fill).into(),
        };

        let retake = widget::button::standard(fl!("retake"))
            .on_press_maybe(enabled.then_some(Message::Retake))
            .width(Length::Fixed(ui::DECISION_BUTTON_WIDTH));
        let keep = widget::button::suggested(fl!("keep"))
            .on_press_maybe(enabled.then_some(Message::Keep))
            .width(Length::Fixed(ui::DECISION_BUTTON_WIDTH));

        let controls = widget::row()
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .push(retake)
            .push(keep)
            .push(widget::Space::new(Length::Fill, Length::Shrink))
            .spacing(spacing.space_l)
            .align_y(Alignment::Center)
            .padding(ui::CONTROL_ROW_PADDING)
            .width(Length::Fill);

        widget::column()
            .push(photo)
            .push(controls)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
