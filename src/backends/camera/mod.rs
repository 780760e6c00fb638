// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend
//!
//! - [`enumeration`]: discover cameras and pick the rear one
//! - [`session`]: bind a camera to a GStreamer pipeline with preview and
//!   still-capture branches
//! - [`types`]: shared device, frame and error types

pub mod enumeration;
pub mod session;
pub mod types;

pub use enumeration::enumerate_cameras;
pub use session::{CaptureSession, StillCapture};
pub use types::*;

use std::time::Duration;

/// Something that can hand out a full-resolution still frame
///
/// The photo pipeline only depends on this seam, so it runs the same against
/// a live [`StillCapture`] and against a synthetic source in tests.
pub trait StillSource: Send + Sync {
    /// Block until a frame is available or `timeout` passes
    fn grab_still(&self, timeout: Duration) -> BackendResult<StillFrame>;
}
