// SPDX-License-Identifier: GPL-3.0-only

//! Hardware access layer
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │         App / photo pipeline         │
//! └──────────────────┬───────────────────┘
//!                    │  StillSource, PreviewFrame
//! ┌──────────────────┴───────────────────┐
//! │   camera: enumeration + session      │
//! │   (PipeWire nodes, GStreamer tee)    │
//! └──────────────────────────────────────┘
//! ```
//!
//! Flash LEDs live in [`crate::flash`]; they are not part of the stream.

pub mod camera;
