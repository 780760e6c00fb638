// SPDX-License-Identifier: GPL-3.0-only

//! Memory-bounded preview decoding
//!
//! The decision screen never holds a full-resolution bitmap. Image bounds are
//! read from the header first. JPEGs are then decoded straight at 1/2, 1/4
//! or 1/8 scale through the decoder's reduced IDCT, so the full-size pixel
//! buffer is never allocated. Other formats are decoded in full and shrunk.

use super::processing::Rotation;
use crate::errors::{PhotoError, PhotoResult};
use crate::storage::{ImageReference, ImageStore};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Downsample factor for an image of `width` x `height` against `bound`
///
/// 1 when both sides fit. Otherwise the smallest power of two at which
/// `width / factor` or `height / factor` drops below `bound`.
pub fn sample_factor(width: u32, height: u32, bound: u32) -> u32 {
    if width <= bound && height <= bound {
        return 1;
    }

    let mut factor = 1u32;
    while height / factor >= bound && width / factor >= bound {
        factor *= 2;
    }
    factor
}

/// Downsampled, rotated RGBA bitmap shown on the decision screen
#[derive(Clone)]
pub struct DecodedPreview {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Header dimensions of the stored image
    pub source_size: (u32, u32),
    pub factor: u32,
}

impl std::fmt::Debug for DecodedPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedPreview")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("source_size", &self.source_size)
            .field("factor", &self.factor)
            .finish_non_exhaustive()
    }
}

/// Read only the image header for its dimensions
pub fn read_bounds(path: &Path) -> PhotoResult<(u32, u32)> {
    ImageReader::open(path)
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
        .into_dimensions()
        .map_err(PhotoError::from)
}

/// Largest reduction the JPEG decoder performs while decoding
const MAX_DECODER_SCALE: u32 = 8;

/// Decode `path` reduced by `factor`, before any rotation
///
/// The result is `(width / factor, height / factor)`. JPEGs are scaled by
/// the decoder; factors above 8 finish with a resize of the 1/8 image.
pub fn decode_reduced(path: &Path, size: (u32, u32), factor: u32) -> PhotoResult<DynamicImage> {
    let (width, height) = size;
    let target = ((width / factor).max(1), (height / factor).max(1));

    if factor > 1 && is_jpeg(path)? {
        let decoder_factor = factor.min(MAX_DECODER_SCALE);
        let request = ((width / decoder_factor).max(1), (height / decoder_factor).max(1));
        if let Some(scaled) = decode_jpeg_scaled(path, request)? {
            debug!(
                decoded_w = scaled.width(),
                decoded_h = scaled.height(),
                "Scaled JPEG decode"
            );
            return Ok(fit_to(scaled, target));
        }
    }

    let full = ImageReader::open(path)
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
        .decode()?;
    Ok(fit_to(full, target))
}

fn fit_to(image: DynamicImage, (width, height): (u32, u32)) -> DynamicImage {
    if image.width() == width && image.height() == height {
        image
    } else {
        image.thumbnail_exact(width, height)
    }
}

fn is_jpeg(path: &Path) -> PhotoResult<bool> {
    let reader = ImageReader::open(path)
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?;
    Ok(reader.format() == Some(ImageFormat::Jpeg))
}

/// Decode a JPEG at the smallest IDCT scale still covering `request`
///
/// `None` for pixel formats the preview does not handle (16-bit, CMYK); the
/// caller then takes the full decode path.
pub fn decode_jpeg_scaled(path: &Path, request: (u32, u32)) -> PhotoResult<Option<DynamicImage>> {
    let file = File::open(path).map_err(|e| PhotoError::DecodeFailed(e.to_string()))?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));

    let clamp = |v: u32| u16::try_from(v).unwrap_or(u16::MAX);
    let (out_w, out_h) = decoder
        .scale(clamp(request.0), clamp(request.1))
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?;
    let pixels = decoder
        .decode()
        .map_err(|e| PhotoError::DecodeFailed(e.to_string()))?;
    let format = decoder.info().map(|info| info.pixel_format);

    let (out_w, out_h) = (u32::from(out_w), u32::from(out_h));
    let image = match format {
        Some(jpeg_decoder::PixelFormat::RGB24) => {
            RgbImage::from_raw(out_w, out_h, pixels).map(DynamicImage::ImageRgb8)
        }
        Some(jpeg_decoder::PixelFormat::L8) => {
            GrayImage::from_raw(out_w, out_h, pixels).map(DynamicImage::ImageLuma8)
        }
        other => {
            debug!(?other, "Pixel format not handled by scaled decode");
            None
        }
    };
    Ok(image)
}

/// Decode `reference` for display
///
/// Blocking: run it on a worker thread.
pub fn load_preview(
    store: &ImageStore,
    reference: &ImageReference,
    bound: u32,
    rotation: Rotation,
) -> PhotoResult<DecodedPreview> {
    if !store.exists(reference) {
        return Err(PhotoError::DecodeFailed(format!("{} is gone", reference)));
    }

    let (width, height) = read_bounds(reference.path())?;
    let factor = sample_factor(width, height, bound.max(1));
    debug!(width, height, factor, "Preview bounds");

    let reduced = decode_reduced(reference.path(), (width, height), factor)?;

    let rgba = rotation.apply(reduced).to_rgba8();
    let (out_w, out_h) = rgba.dimensions();
    info!(
        entry = %reference,
        out_w,
        out_h,
        factor,
        %rotation,
        "Preview decoded"
    );

    Ok(DecodedPreview {
        width: out_w,
        height: out_h,
        rgba: rgba.into_raw(),
        source_size: (width, height),
        factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::encoding::{EncodingQuality, encode_jpeg};
    use image::GenericImageView;

    fn temp_jpeg(width: u32, height: u32) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("snapcam-preview-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("capture.jpg");
        let image = RgbImage::from_pixel(width, height, image::Rgb([30, 90, 150]));
        std::fs::write(&path, encode_jpeg(&image, EncodingQuality::High).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_decoder_output_is_already_reduced() {
        let path = temp_jpeg(1600, 1200);
        let factor = sample_factor(1600, 1200, 512);
        assert_eq!(factor, 4);

        let scaled = decode_jpeg_scaled(&path, (1600 / factor, 1200 / factor))
            .unwrap()
            .expect("RGB JPEG is handled by the scaled decoder");
        assert_eq!(scaled.dimensions(), (400, 300));
    }

    #[test]
    fn test_reduced_decode_matches_factor_before_rotation() {
        let path = temp_jpeg(1600, 1200);
        let reduced = decode_reduced(&path, (1600, 1200), 4).unwrap();
        assert_eq!(reduced.dimensions(), (400, 300));
    }

    #[test]
    fn test_factor_beyond_decoder_scale_is_finished_by_resize() {
        let path = temp_jpeg(2048, 2048);
        let reduced = decode_reduced(&path, (2048, 2048), 16).unwrap();
        assert_eq!(reduced.dimensions(), (128, 128));
    }

    #[test]
    fn test_non_jpeg_takes_full_decode_path() {
        let dir = std::env::temp_dir().join(format!("snapcam-preview-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("capture.png");
        RgbImage::from_pixel(64, 32, image::Rgb([1, 2, 3]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let reduced = decode_reduced(&path, (64, 32), 2).unwrap();
        assert_eq!(reduced.dimensions(), (32, 16));
    }

    #[test]
    fn test_factor_for_large_portrait() {
        assert_eq!(sample_factor(3000, 4000, 1024), 4);
    }

    #[test]
    fn test_factor_for_small_image() {
        assert_eq!(sample_factor(800, 600, 1024), 1);
        assert_eq!(sample_factor(1024, 1024, 1024), 1);
    }

    #[test]
    fn test_factor_is_power_of_two() {
        for (w, h) in [(1025, 1025), (4032, 3024), (8000, 6000), (1500, 900), (2048, 2048)] {
            let f = sample_factor(w, h, 1024);
            assert!(f >= 1 && f.is_power_of_two(), "{w}x{h} -> {f}");
            // Doubling stopped as soon as one side fell below the bound
            assert!(w / f < 1024 || h / f < 1024 || (w <= 1024 && h <= 1024));
        }
    }

    #[test]
    fn test_one_long_side_keeps_factor_one() {
        // Only one side exceeds the bound; the loop condition fails immediately
        assert_eq!(sample_factor(1500, 900, 1024), 1);
    }
}
