// SPDX-License-Identifier: GPL-3.0-only

//! Snapcam - a point-and-keep camera for the COSMIC desktop
//!
//! One rear camera feeds a live viewfinder. A capture is stored right away
//! as a provisional JPEG, shown on a decision screen, and then either kept
//! (re-encoded upright at maximum quality) or deleted for a retake.
//!
//! # Architecture
//!
//! - [`app`]: application model, state machine and UI
//! - [`backends`]: camera enumeration and the GStreamer capture session
//! - [`pipelines`]: capture, preview decode and commit stages
//! - [`permissions`]: camera and storage permission gate
//! - [`storage`]: the picture album
//! - [`flash`]: still-capture flash LED
//! - [`config`]: user configuration handling

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod i18n;
pub mod permissions;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{AppModel, Message};
pub use config::Config;
pub use pipelines::photo::{PhotoPipeline, Rotation};
pub use storage::{ImageReference, ImageStore};
