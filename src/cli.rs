// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo and keeping it without the decision screen

use cosmic::Application;
use futures::channel::mpsc;
use snapcam::app::AppModel;
use snapcam::backends::camera::{CaptureSession, enumerate_cameras, select_rear_camera};
use snapcam::config::Config;
use snapcam::constants::{pipeline, timing};
use snapcam::errors::{AppError, AppResult, CameraError, PhotoError};
use snapcam::flash::{FlashHardware, FlashState};
use snapcam::permissions::{PermissionGate, PermissionOutcome};
use snapcam::pipelines::photo::{PhotoPipeline, ProvisionalPolicy};
use std::sync::Arc;

/// List all available cameras
pub fn list_cameras() -> AppResult<()> {
    gstreamer::init()?;

    let cameras = enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let rear = select_rear_camera(&cameras);
    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let marker = if Some(index) == rear { " (default)" } else { "" };
        println!("  [{}] {}{}", index, camera.name, marker);
        println!("      Location: {}", camera.location);
    }

    Ok(())
}

/// Take a photo with the given (or the rear) camera and keep it
pub fn take_photo(camera_index: Option<usize>, discard_provisional: bool) -> AppResult<()> {
    gstreamer::init()?;

    let (_, config) = Config::load(AppModel::APP_ID);
    let mut photo_pipeline = PhotoPipeline::from_config(&config);
    if discard_provisional {
        photo_pipeline = photo_pipeline.with_policy(ProvisionalPolicy::Discard);
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| PhotoError::CaptureFailed(format!("Failed to start runtime: {}", e)))?;

    let gate = PermissionGate::new(photo_pipeline.store().album_dir());
    if let PermissionOutcome::Denied(reason) = rt.block_on(gate.ensure()) {
        return Err(AppError::Permission(reason));
    }

    let cameras = enumerate_cameras();
    let index = match camera_index {
        Some(index) if index < cameras.len() => index,
        Some(index) => {
            return Err(AppError::InvalidArgument(format!(
                "camera index {} out of range ({} camera(s) found)",
                index,
                cameras.len()
            )));
        }
        None => select_rear_camera(&cameras).ok_or(CameraError::NoCameraFound)?,
    };
    let camera = &cameras[index];
    println!("Using camera: {} ({})", camera.name, camera.location);

    // The viewfinder branch still runs; its frames are simply never read
    let (sender, _receiver) = mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
    let session = CaptureSession::bind(camera, sender)?;

    // Let auto exposure settle before grabbing the still
    std::thread::sleep(timing::CLI_WARMUP);

    println!("Capturing...");
    let flash = FlashState::new(FlashHardware::detect(), config.flash_pre_capture());
    let still = Arc::new(session.still_capture());
    let kept = rt.block_on(async {
        let provisional = photo_pipeline.capture(still, flash).await?;
        photo_pipeline.keep(provisional).await
    })?;
    drop(session);

    println!("Photo saved: {}", kept.path().display());
    Ok(())
}
