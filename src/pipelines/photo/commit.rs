// SPDX-License-Identifier: GPL-3.0-only

//! Keep or discard a provisional capture

use super::encoding::{EncodingQuality, encode_jpeg};
use super::processing::Rotation;
use crate::errors::{PhotoError, PhotoResult};
use crate::storage::{ImageReference, ImageStore};
use image::ImageReader;
use tracing::{info, warn};

/// What [`keep`] does with the provisional capture afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisionalPolicy {
    /// Leave it next to the committed copy
    #[default]
    Retain,
    /// Delete it once the committed copy is written
    Discard,
}

impl ProvisionalPolicy {
    pub fn from_discard_flag(discard: bool) -> Self {
        if discard {
            ProvisionalPolicy::Discard
        } else {
            ProvisionalPolicy::Retain
        }
    }
}

/// Commit `provisional` as a new, rotated, maximum-quality JPEG
///
/// Works from the full-resolution stored image, not the preview bitmap.
/// Blocking: run it on a worker thread.
pub fn keep(
    store: &ImageStore,
    provisional: &ImageReference,
    rotation: Rotation,
    policy: ProvisionalPolicy,
) -> PhotoResult<ImageReference> {
    let full = ImageReader::open(provisional.path())
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
        .decode()?;

    let upright = rotation.apply(full).to_rgb8();
    let bytes = encode_jpeg(&upright, EncodingQuality::Maximum)?;

    let descriptor = store.descriptor_now();
    let committed = store
        .insert_bytes(&descriptor, &bytes)
        .map_err(|e| PhotoError::SaveFailed(e.to_string()))?;
    info!(
        from = %provisional,
        to = %committed,
        width = upright.width(),
        height = upright.height(),
        "Photo kept"
    );

    if policy == ProvisionalPolicy::Discard
        && let Err(e) = store.delete(provisional)
    {
        // The photo itself is safe; only the duplicate remains
        warn!(entry = %provisional, error = %e, "Failed to discard provisional capture");
    }

    Ok(committed)
}

/// Delete the provisional capture
pub fn retake(store: &ImageStore, provisional: &ImageReference) -> PhotoResult<()> {
    store
        .delete(provisional)
        .map_err(|e| PhotoError::DeleteFailed(e.to_string()))?;
    info!(entry = %provisional, "Photo discarded for retake");
    Ok(())
}
