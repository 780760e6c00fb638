// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! - [`photo`]: still capture, bounded preview decoding and keep/retake
//!
//! Heavy work runs on background tasks so the live preview never stalls.

pub mod photo;
