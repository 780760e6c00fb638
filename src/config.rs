// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{photo, storage, timing};
use crate::pipelines::photo::Rotation;
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use cosmic::{Theme, theme};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application theme preference
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum AppTheme {
    /// Follow system theme (dark or light based on system setting)
    #[default]
    System,
    /// Always use dark theme
    Dark,
    /// Always use light theme
    Light,
}

impl AppTheme {
    /// Get the COSMIC theme for this app theme preference
    pub fn theme(&self) -> Theme {
        match self {
            Self::Dark => {
                let mut theme = theme::system_dark();
                theme.theme_type.prefer_dark(Some(true));
                theme
            }
            Self::Light => {
                let mut theme = theme::system_light();
                theme.theme_type.prefer_dark(Some(false));
                theme
            }
            Self::System => theme::system_preference(),
        }
    }
}

#[derive(Debug, Clone, CosmicConfigEntry, Eq, PartialEq, Serialize, Deserialize)]
#[version = 1]
pub struct Config {
    /// Application theme preference (System, Dark, Light)
    pub app_theme: AppTheme,
    /// Album directory under Pictures
    pub album_name: String,
    /// Longest side a preview may keep before power-of-two downsampling
    pub preview_max_dimension: u32,
    /// Rotation applied to previews and committed photos
    pub rotation: Rotation,
    /// Delete the provisional capture after a successful keep
    pub discard_provisional_on_keep: bool,
    /// How long the flash burns before the still is grabbed
    pub flash_pre_capture_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_theme: AppTheme::default(),
            album_name: storage::DEFAULT_ALBUM.to_string(),
            preview_max_dimension: photo::PREVIEW_MAX_DIMENSION,
            rotation: Rotation::from_degrees(photo::DEFAULT_ROTATION_DEGREES),
            discard_provisional_on_keep: false,
            flash_pre_capture_ms: timing::DEFAULT_FLASH_PRE_CAPTURE_MS,
        }
    }
}

impl Config {
    /// Load the stored configuration for `app_id`
    ///
    /// Falls back to defaults (per field, or entirely) and logs what failed.
    pub fn load(app_id: &str) -> (Option<cosmic_config::Config>, Self) {
        match cosmic_config::Config::new(app_id, Self::VERSION) {
            Ok(handler) => {
                let config = match Self::get_entry(&handler) {
                    Ok(config) => config,
                    Err((errors, config)) => {
                        tracing::error!(?errors, "Errors loading config");
                        config
                    }
                };
                (Some(handler), config)
            }
            Err(err) => {
                tracing::error!(%err, "Failed to create config handler");
                (None, Self::default())
            }
        }
    }

    /// Flash lead time as a duration
    pub fn flash_pre_capture(&self) -> Duration {
        Duration::from_millis(self.flash_pre_capture_ms)
    }
}
