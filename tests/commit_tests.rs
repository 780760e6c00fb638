// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for keeping and retaking a provisional capture

use image::{ImageReader, Rgb, RgbImage};
use snapcam::pipelines::photo::commit::{self, ProvisionalPolicy};
use snapcam::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
use snapcam::{ImageReference, ImageStore, Rotation};

fn temp_store() -> ImageStore {
    let root = std::env::temp_dir().join(format!("snapcam-commit-{}", uuid::Uuid::new_v4()));
    ImageStore::new(root, "CameraX-Image")
}

/// A 40x20 landscape capture, as the still branch would store it
fn store_provisional(store: &ImageStore) -> ImageReference {
    let image = RgbImage::from_pixel(40, 20, Rgb([200, 120, 40]));
    let bytes = encode_jpeg(&image, EncodingQuality::High).unwrap();
    store.insert_bytes(&store.descriptor_now(), &bytes).unwrap()
}

fn dimensions(reference: &ImageReference) -> (u32, u32) {
    ImageReader::open(reference.path())
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .into_dimensions()
        .unwrap()
}

#[test]
fn test_keep_adds_one_rotated_entry() {
    let store = temp_store();
    let provisional = store_provisional(&store);
    assert_eq!(store.entries().unwrap().len(), 1);

    let committed = commit::keep(
        &store,
        &provisional,
        Rotation::Rotate90,
        ProvisionalPolicy::Retain,
    )
    .unwrap();

    let entries = store.entries().unwrap();
    assert_eq!(entries.len(), 2, "exactly one new entry expected");
    assert!(entries.contains(&committed));
    assert!(entries.contains(&provisional));
    assert_ne!(committed, provisional);

    // The committed copy is upright; the provisional one is untouched
    assert_eq!(dimensions(&committed), (20, 40));
    assert_eq!(dimensions(&provisional), (40, 20));
}

#[test]
fn test_keep_with_discard_policy_removes_provisional() {
    let store = temp_store();
    let provisional = store_provisional(&store);

    let committed = commit::keep(
        &store,
        &provisional,
        Rotation::Rotate90,
        ProvisionalPolicy::Discard,
    )
    .unwrap();

    assert_eq!(store.entries().unwrap(), vec![committed]);
    assert!(!store.exists(&provisional));
}

#[test]
fn test_keep_without_rotation_preserves_dimensions() {
    let store = temp_store();
    let provisional = store_provisional(&store);

    let committed =
        commit::keep(&store, &provisional, Rotation::None, ProvisionalPolicy::Retain).unwrap();
    assert_eq!(dimensions(&committed), (40, 20));
}

#[test]
fn test_keep_missing_capture_fails() {
    let store = temp_store();
    let provisional = store_provisional(&store);
    store.delete(&provisional).unwrap();

    let result = commit::keep(
        &store,
        &provisional,
        Rotation::Rotate90,
        ProvisionalPolicy::Retain,
    );
    assert!(result.is_err());
    assert!(store.entries().unwrap().is_empty(), "nothing may be committed");
}

#[test]
fn test_retake_removes_capture() {
    let store = temp_store();
    let provisional = store_provisional(&store);

    commit::retake(&store, &provisional).unwrap();

    assert!(!store.exists(&provisional));
    assert!(store.entries().unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_keep_runs_off_thread() {
    let store = temp_store();
    let provisional = store_provisional(&store);
    let pipeline = snapcam::PhotoPipeline::new(store.clone());

    let committed = pipeline.keep(provisional.clone()).await.unwrap();

    assert_eq!(dimensions(&committed), (20, 40));
    assert_eq!(store.entries().unwrap().len(), 2);
}
