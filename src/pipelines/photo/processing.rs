// SPDX-License-Identifier: GPL-3.0-only

//! Orientation fix-up applied to previews and committed photos

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Clockwise rotation applied after decoding
///
/// Sensors on phones and tablets are mounted sideways; stills come out of
/// the pipeline in sensor orientation and are turned upright here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    None,
    #[default]
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Map degrees to a rotation, snapping to the nearest quarter turn
    pub fn from_degrees(degrees: i32) -> Self {
        match ((degrees.rem_euclid(360) + 45) / 90) % 4 {
            1 => Rotation::Rotate90,
            2 => Rotation::Rotate180,
            3 => Rotation::Rotate270,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Rotation::None => image,
            Rotation::Rotate90 => image.rotate90(),
            Rotation::Rotate180 => image.rotate180(),
            Rotation::Rotate270 => image.rotate270(),
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_from_degrees_snaps() {
        assert_eq!(Rotation::from_degrees(90), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees(-90), Rotation::Rotate270);
        assert_eq!(Rotation::from_degrees(358), Rotation::None);
        assert_eq!(Rotation::from_degrees(540), Rotation::Rotate180);
    }

    #[test]
    fn test_rotate90_is_clockwise() {
        // Red pixel in the top-left corner of a landscape image
        let mut img = RgbImage::from_pixel(4, 2, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));

        let rotated = Rotation::Rotate90.apply(DynamicImage::ImageRgb8(img)).to_rgb8();
        assert_eq!(rotated.dimensions(), (2, 4));
        // Clockwise: top-left ends up top-right
        assert_eq!(rotated.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }
}
