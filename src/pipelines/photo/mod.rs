// SPDX-License-Identifier: GPL-3.0-only

//! Async photo pipeline
//!
//! ```text
//! still branch ──▶ acquire ──▶ provisional JPEG ──▶ load_preview ──▶ decision screen
//!                                    │                                   │
//!                                    │              keep ◀───────────────┤
//!                                    │                │                  │
//!                                    └── retake ◀─────┼──────────────────┘
//!                                                     ▼
//!                                           committed JPEG (q=100)
//! ```
//!
//! Each stage is a blocking function in its own module; [`PhotoPipeline`]
//! runs them on tokio's blocking pool so the viewfinder keeps streaming.

pub mod capture;
pub mod commit;
pub mod encoding;
pub mod preview;
pub mod processing;

pub use commit::ProvisionalPolicy;
pub use encoding::EncodingQuality;
pub use preview::{DecodedPreview, sample_factor};
pub use processing::Rotation;

use crate::backends::camera::StillSource;
use crate::config::Config;
use crate::constants::photo;
use crate::errors::{PhotoError, PhotoResult};
use crate::flash::FlashState;
use crate::storage::{ImageReference, ImageStore};
use std::sync::Arc;

/// Photo pipeline settings plus the store it writes into
#[derive(Debug, Clone)]
pub struct PhotoPipeline {
    store: ImageStore,
    rotation: Rotation,
    preview_bound: u32,
    policy: ProvisionalPolicy,
}

impl PhotoPipeline {
    pub fn new(store: ImageStore) -> Self {
        Self {
            store,
            rotation: Rotation::default(),
            preview_bound: photo::PREVIEW_MAX_DIMENSION,
            policy: ProvisionalPolicy::default(),
        }
    }

    /// Pipeline configured from user settings
    pub fn from_config(config: &Config) -> Self {
        Self::new(ImageStore::pictures(&config.album_name))
            .with_rotation(config.rotation)
            .with_preview_bound(config.preview_max_dimension)
            .with_policy(ProvisionalPolicy::from_discard_flag(
                config.discard_provisional_on_keep,
            ))
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_preview_bound(mut self, bound: u32) -> Self {
        self.preview_bound = bound.max(1);
        self
    }

    pub fn with_policy(mut self, policy: ProvisionalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Pull a still and store it as the provisional capture
    pub async fn capture(
        &self,
        source: Arc<dyn StillSource>,
        flash: FlashState,
    ) -> PhotoResult<ImageReference> {
        let store = self.store.clone();
        run_blocking(move || {
            capture::acquire(source.as_ref(), &flash, &store, EncodingQuality::High)
        })
        .await
    }

    /// Decode the provisional capture for the decision screen
    pub async fn load_preview(&self, reference: ImageReference) -> PhotoResult<DecodedPreview> {
        let store = self.store.clone();
        let (bound, rotation) = (self.preview_bound, self.rotation);
        run_blocking(move || preview::load_preview(&store, &reference, bound, rotation)).await
    }

    /// Commit the provisional capture
    pub async fn keep(&self, reference: ImageReference) -> PhotoResult<ImageReference> {
        let store = self.store.clone();
        let (rotation, policy) = (self.rotation, self.policy);
        run_blocking(move || commit::keep(&store, &reference, rotation, policy)).await
    }

    /// Delete the provisional capture
    pub async fn retake(&self, reference: ImageReference) -> PhotoResult<()> {
        let store = self.store.clone();
        run_blocking(move || commit::retake(&store, &reference)).await
    }
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new(ImageStore::default())
    }
}

async fn run_blocking<T, F>(work: F) -> PhotoResult<T>
where
    F: FnOnce() -> PhotoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PhotoError::CaptureFailed(format!("Worker task error: {}", e)))?
}
