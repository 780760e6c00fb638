// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer capture session
//!
//! One pipeline per bound camera. After decoding, a `tee` splits the stream
//! into two appsinks:
//!
//! ```text
//! source ! decodebin ! videoconvert ! tee ─┬─ queue ! RGBA ! appsink "preview"  (pushed to the UI)
//!                                          └─ queue ! RGB  ! appsink "still"    (latest frame, pulled on capture)
//! ```
//!
//! Dropping the session stops the pipeline and releases the camera.

use super::StillSource;
use super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Build the `gst-launch` description for `source`
pub fn pipeline_description(source: &CameraSource) -> String {
    format!(
        "{src} ! decodebin ! videoconvert ! tee name=t \
         t. ! queue leaky=downstream max-size-buffers=2 ! videoconvert ! \
         video/x-raw,format={preview_fmt} ! appsink name=preview \
         t. ! queue leaky=downstream max-size-buffers=1 ! videoconvert ! \
         video/x-raw,format={still_fmt} ! appsink name=still",
        src = source.element_description(),
        preview_fmt = pipeline::PREVIEW_FORMAT,
        still_fmt = pipeline::STILL_FORMAT,
    )
}

/// A running camera pipeline feeding preview frames and serving stills
pub struct CaptureSession {
    pipeline: gstreamer::Pipeline,
    preview: AppSink,
    still: StillCapture,
    device: CameraDevice,
}

impl CaptureSession {
    /// Start streaming from `device`
    ///
    /// Preview frames are pushed into `frame_sender`; frames are dropped
    /// while the channel is full.
    pub fn bind(device: &CameraDevice, frame_sender: FrameSender) -> BackendResult<Self> {
        info!(device = %device.name, location = %device.location, "Binding camera session");

        gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

        let description = pipeline_description(&device.source);
        debug!(%description, "Launching pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| {
                BackendError::InitializationFailed("Launch result is not a pipeline".to_string())
            })?;

        let preview = appsink_by_name(&pipeline, "preview")?;
        preview.set_property("emit-signals", true);
        preview.set_property("sync", false);
        preview.set_property("max-buffers", pipeline::PREVIEW_MAX_BUFFERS);
        preview.set_property("drop", true);
        preview.set_property("enable-last-sample", false);
        preview.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| forward_preview_sample(sink, &frame_sender))
                .build(),
        );

        // Pull mode: the newest frame waits in the sink until a capture asks for it
        let still_sink = appsink_by_name(&pipeline, "still")?;
        still_sink.set_property("emit-signals", false);
        still_sink.set_property("sync", false);
        still_sink.set_property("max-buffers", pipeline::STILL_MAX_BUFFERS);
        still_sink.set_property("drop", true);

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            let _ = pipeline.set_state(gstreamer::State::Null);
            BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
        })?;

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, ?pending, "Pipeline state");
        if result.is_err() {
            let reason = first_bus_error(&pipeline)
                .unwrap_or_else(|| "pipeline failed to reach PLAYING".to_string());
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(reason));
        }
        if state != gstreamer::State::Playing {
            warn!(?state, "Pipeline is not in PLAYING state yet");
        }

        info!(device = %device.name, "Camera session bound");
        Ok(Self {
            pipeline,
            preview,
            still: StillCapture { sink: still_sink },
            device: device.clone(),
        })
    }

    /// Cloneable handle for still capture
    pub fn still_capture(&self) -> StillCapture {
        self.still.clone()
    }

    /// Pipeline bus, for error and end-of-stream monitoring
    pub fn bus(&self) -> Option<gstreamer::Bus> {
        self.pipeline.bus()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        info!(device = %self.device.name, "Unbinding camera session");
        self.preview
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, "Pipeline stopped");
    }
}

/// Handle to the still-capture branch of a bound session
///
/// Cheap to clone and usable from a blocking thread while the session keeps
/// streaming. Once the session is dropped, grabs fail with
/// [`BackendError::StreamEnded`].
#[derive(Clone)]
pub struct StillCapture {
    sink: AppSink,
}

impl std::fmt::Debug for StillCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StillCapture")
            .field("sink", &self.sink.name())
            .finish()
    }
}

impl StillSource for StillCapture {
    fn grab_still(&self, timeout: Duration) -> BackendResult<StillFrame> {
        if self.sink.is_eos() {
            return Err(BackendError::StreamEnded);
        }

        let timeout = gstreamer::ClockTime::from_mseconds(timeout.as_millis() as u64);
        let Some(sample) = self.sink.try_pull_sample(timeout) else {
            return Err(if self.sink.is_eos() {
                BackendError::StreamEnded
            } else {
                BackendError::Timeout
            });
        };

        still_from_sample(&sample)
    }
}

fn appsink_by_name(pipeline: &gstreamer::Pipeline, name: &str) -> BackendResult<AppSink> {
    pipeline
        .by_name(name)
        .ok_or_else(|| BackendError::InitializationFailed(format!("No appsink named {}", name)))?
        .dynamic_cast::<AppSink>()
        .map_err(|_| BackendError::InitializationFailed(format!("{} is not an appsink", name)))
}

/// Drain the bus for the first error message
fn first_bus_error(pipeline: &gstreamer::Pipeline) -> Option<String> {
    let bus = pipeline.bus()?;
    while let Some(msg) = bus.pop() {
        if let gstreamer::MessageView::Error(err) = msg.view() {
            return Some(err.error().to_string());
        }
    }
    None
}

fn forward_preview_sample(
    sink: &AppSink,
    frame_sender: &FrameSender,
) -> Result<gstreamer::FlowSuccess, gstreamer::FlowError> {
    let frame_start = Instant::now();
    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

    let sample = sink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
            warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
        }
        return Ok(gstreamer::FlowSuccess::Ok);
    }

    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
    let info = VideoInfo::from_caps(caps).map_err(|e| {
        error!(frame = frame_num, error = ?e, "Failed to get video info");
        gstreamer::FlowError::Error
    })?;
    let map = buffer.map_readable().map_err(|_| gstreamer::FlowError::Error)?;

    let width = info.width();
    let height = info.height();
    let data = pack_rows(
        map.as_slice(),
        width as usize * 4,
        info.stride()[0] as usize,
        height as usize,
    );

    let frame = PreviewFrame {
        width,
        height,
        data: Arc::from(data),
        captured_at: frame_start,
    };

    let mut sender = frame_sender.clone();
    match sender.try_send(frame) {
        Ok(()) => {
            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                debug!(
                    frame = frame_num,
                    width,
                    height,
                    convert_us = frame_start.elapsed().as_micros(),
                    "Preview frame"
                );
            }
            Ok(gstreamer::FlowSuccess::Ok)
        }
        Err(e) if e.is_disconnected() => {
            debug!("Preview receiver gone");
            Err(gstreamer::FlowError::Flushing)
        }
        Err(_) => {
            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                debug!(frame = frame_num, "Frame dropped (channel full)");
            }
            Ok(gstreamer::FlowSuccess::Ok)
        }
    }
}

fn still_from_sample(sample: &gstreamer::Sample) -> BackendResult<StillFrame> {
    let caps = sample
        .caps()
        .ok_or_else(|| BackendError::Other("Still sample has no caps".to_string()))?;
    let info = VideoInfo::from_caps(caps).map_err(|e| BackendError::Other(e.to_string()))?;
    let buffer = sample
        .buffer()
        .ok_or_else(|| BackendError::Other("Still sample has no buffer".to_string()))?;
    let map = buffer
        .map_readable()
        .map_err(|e| BackendError::Other(e.to_string()))?;

    let (width, height) = (info.width(), info.height());
    let data = pack_rows(
        map.as_slice(),
        width as usize * 3,
        info.stride()[0] as usize,
        height as usize,
    );
    let image = image::RgbImage::from_raw(width, height, data)
        .ok_or_else(|| BackendError::Other("Still frame buffer too small".to_string()))?;

    debug!(width, height, "Pulled still frame");
    Ok(StillFrame { image })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_has_both_branches() {
        let desc = pipeline_description(&CameraSource::PipeWireDefault);
        assert!(desc.starts_with("pipewiresrc"));
        assert!(desc.contains("tee name=t"));
        assert!(desc.contains("format=RGBA ! appsink name=preview"));
        assert!(desc.contains("format=RGB ! appsink name=still"));
    }
}
