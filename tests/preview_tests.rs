// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for memory-bounded preview decoding

use image::{Rgb, RgbImage};
use snapcam::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
use image::GenericImageView;
use snapcam::pipelines::photo::preview::{decode_reduced, load_preview, read_bounds};
use snapcam::{ImageReference, ImageStore, Rotation};

fn temp_store() -> ImageStore {
    let root = std::env::temp_dir().join(format!("snapcam-preview-{}", uuid::Uuid::new_v4()));
    ImageStore::new(root, "CameraX-Image")
}

fn store_capture(store: &ImageStore, width: u32, height: u32) -> ImageReference {
    let image = RgbImage::from_pixel(width, height, Rgb([10, 80, 160]));
    let bytes = encode_jpeg(&image, EncodingQuality::High).unwrap();
    store.insert_bytes(&store.descriptor_now(), &bytes).unwrap()
}

#[test]
fn test_large_capture_is_downsampled_and_rotated() {
    let store = temp_store();
    let reference = store_capture(&store, 3000, 4000);

    assert_eq!(read_bounds(reference.path()).unwrap(), (3000, 4000));

    let preview = load_preview(&store, &reference, 1024, Rotation::Rotate90).unwrap();
    assert_eq!(preview.factor, 4);
    assert_eq!(preview.source_size, (3000, 4000));
    // 750x1000 after sampling, turned on its side
    assert_eq!((preview.width, preview.height), (1000, 750));
    assert_eq!(preview.rgba.len(), 1000 * 750 * 4);
}

#[test]
fn test_large_capture_is_decoded_at_reduced_size() {
    let store = temp_store();
    let reference = store_capture(&store, 3000, 4000);

    // The 1/4 IDCT decode already yields the sampled size
    let reduced = decode_reduced(reference.path(), (3000, 4000), 4).unwrap();
    assert_eq!(reduced.dimensions(), (750, 1000));
}

#[test]
fn test_small_capture_keeps_full_size() {
    let store = temp_store();
    let reference = store_capture(&store, 800, 600);

    let preview = load_preview(&store, &reference, 1024, Rotation::Rotate90).unwrap();
    assert_eq!(preview.factor, 1);
    assert_eq!((preview.width, preview.height), (600, 800));
}

#[test]
fn test_preview_does_not_touch_the_album() {
    let store = temp_store();
    let reference = store_capture(&store, 800, 600);

    load_preview(&store, &reference, 1024, Rotation::None).unwrap();
    assert_eq!(store.entries().unwrap(), vec![reference]);
}

#[test]
fn test_missing_capture_fails_to_decode() {
    let store = temp_store();
    let reference = store_capture(&store, 64, 48);
    store.delete(&reference).unwrap();

    assert!(load_preview(&store, &reference, 1024, Rotation::Rotate90).is_err());
}
