// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! This module organizes message handlers by functional domain,
//! keeping related functionality together for easier maintenance.

pub mod camera;
pub mod capture;
pub mod decision;
pub mod permission;
pub mod system;

use crate::app::state::{AppModel, Message};
use cosmic::Task;
use cosmic::widget::toaster::Toast;

impl AppModel {
    /// Create a delayed task that sends a message after the specified milliseconds
    pub(crate) fn delay_task(millis: u64, message: Message) -> Task<cosmic::Action<Message>> {
        Task::perform(
            async move {
                tokio::time::sleep(tokio::time::Duration::from_millis(millis)).await;
                message
            },
            cosmic::Action::App,
        )
    }

    /// Show a short-lived notice
    pub(crate) fn notify(&mut self, text: impl Into<String>) -> Task<cosmic::Action<Message>> {
        self.toasts
            .push(Toast::new(text.into()))
            .map(cosmic::Action::App)
    }
}
