// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding for captured and committed photos

use crate::constants::photo;
use crate::errors::{PhotoError, PhotoResult};
use image::RgbImage;
use tracing::debug;

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingQuality {
    /// Provisional captures
    High,
    /// Committed photos
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => photo::COMMIT_JPEG_QUALITY,
        }
    }
}

/// Encode an RGB image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> PhotoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        &mut buffer,
        quality.jpeg_quality(),
    );

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;

    debug!(
        width = image.width(),
        height = image.height(),
        quality = quality.jpeg_quality(),
        size = buffer.len(),
        "JPEG encoded"
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_quality_is_maximum() {
        assert_eq!(EncodingQuality::Maximum.jpeg_quality(), 100);
        assert!(EncodingQuality::High.jpeg_quality() < 100);
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let img = RgbImage::from_pixel(16, 8, image::Rgb([200, 10, 10]));
        let bytes = encode_jpeg(&img, EncodingQuality::High).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }
}
