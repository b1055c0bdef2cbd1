use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

use crate::models::ThresholdMode;

/// The level a page was binarized at, and how it was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdChoice {
    pub level: u8,
    /// True when Otsu was requested but the page has a single intensity, so the
    /// manual reference value was used instead
    pub fell_back: bool,
}

fn is_single_level(image: &GrayImage) -> bool {
    let mut pixels = image.pixels();
    match pixels.next() {
        Some(first) => pixels.all(|p| p == first),
        None => true,
    }
}

/// Pick the binarization level for a grayscale page
pub fn choose_threshold(image: &GrayImage, mode: ThresholdMode, reference: u8) -> ThresholdChoice {
    match mode {
        ThresholdMode::Manual => ThresholdChoice {
            level: reference,
            fell_back: false,
        },
        ThresholdMode::Otsu if is_single_level(image) => ThresholdChoice {
            level: reference,
            fell_back: true,
        },
        ThresholdMode::Otsu => ThresholdChoice {
            level: otsu_level(image),
            fell_back: false,
        },
    }
}

/// Pixels strictly above `level` become 255, all others 0.
///
/// Dark ink ends up 0 on a 255 background for every page.
pub fn binarize(image: &GrayImage, level: u8) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel[0] > level { 255u8 } else { 0u8 };
        out.put_pixel(x, y, Luma([value]));
    }
    out
}
