// SPDX-License-Identifier: GPL-3.0-only

//! Still acquisition
//!
//! Pulls one full-resolution frame from the session's still branch (with the
//! flash lit if requested), encodes it and files it under a fresh
//! timestamped descriptor. The stored entry is the provisional capture the
//! decision screen works on.

use super::encoding::{EncodingQuality, encode_jpeg};
use crate::backends::camera::{BackendError, StillSource};
use crate::constants::timing;
use crate::errors::{PhotoError, PhotoResult};
use crate::flash::FlashState;
use crate::storage::{ImageReference, ImageStore};
use tracing::{debug, info};

/// Capture one still into `store`
///
/// Blocking: run it on a worker thread.
pub fn acquire(
    source: &dyn StillSource,
    flash: &FlashState,
    store: &ImageStore,
    quality: EncodingQuality,
) -> PhotoResult<ImageReference> {
    let descriptor = store.descriptor_now();
    debug!(name = %descriptor.display_name, flash = ?flash.mode(), "Acquiring still");

    let frame = flash
        .with_flash(|| source.grab_still(timing::STILL_PULL_TIMEOUT))
        .map_err(|e| match e {
            BackendError::Timeout => PhotoError::NoFrameAvailable,
            other => PhotoError::CaptureFailed(other.to_string()),
        })?;

    let bytes = encode_jpeg(&frame.image, quality)?;
    let reference = store
        .insert_bytes(&descriptor, &bytes)
        .map_err(|e| PhotoError::SaveFailed(e.to_string()))?;

    info!(
        entry = %reference,
        width = frame.width(),
        height = frame.height(),
        "Still captured"
    );
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{BackendResult, StillFrame};
    use std::time::Duration;

    struct Fixed(u32, u32);

    impl StillSource for Fixed {
        fn grab_still(&self, _timeout: Duration) -> BackendResult<StillFrame> {
            Ok(StillFrame {
                image: image::RgbImage::from_pixel(self.0, self.1, image::Rgb([9, 9, 9])),
            })
        }
    }

    struct Silent;

    impl StillSource for Silent {
        fn grab_still(&self, _timeout: Duration) -> BackendResult<StillFrame> {
            Err(BackendError::Timeout)
        }
    }

    fn temp_store() -> ImageStore {
        let root = std::env::temp_dir().join(format!("snapcam-capture-{}", uuid::Uuid::new_v4()));
        ImageStore::new(root, "CameraX-Image")
    }

    #[test]
    fn test_acquire_stores_jpeg() {
        let store = temp_store();
        let reference = acquire(
            &Fixed(40, 30),
            &FlashState::default(),
            &store,
            EncodingQuality::High,
        )
        .unwrap();

        assert_eq!(reference.path().extension().unwrap(), "jpg");
        let img = image::open(reference.path()).unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));
    }

    #[test]
    fn test_no_frame_leaves_store_untouched() {
        let store = temp_store();
        let err = acquire(&Silent, &FlashState::default(), &store, EncodingQuality::High)
            .unwrap_err();
        assert_eq!(err, PhotoError::NoFrameAvailable);
        assert!(store.entries().unwrap().is_empty());
    }
}
