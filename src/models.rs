use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A named page photograph.
///
/// The raster is shared and never mutated; every pipeline stage produces a new
/// image derived from it.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub name: String,
    image: Arc<RgbImage>,
}

impl PageImage {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            image: Arc::new(image.to_rgb8()),
        }
    }

    pub fn from_rgb(name: impl Into<String>, image: RgbImage) -> Self {
        Self {
            name: name.into(),
            image: Arc::new(image),
        }
    }

    /// Decode an uploaded page. Only JPEG and PNG content is accepted, whatever
    /// the name says.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let format = image::guess_format(bytes)
            .map_err(|_| Error::UnsupportedFormat(name.clone()))?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(Error::UnsupportedFormat(format!("{} ({:?})", name, format)));
        }
        let image = image::load_from_memory_with_format(bytes, format)?;
        Ok(Self::new(name, image))
    }

    /// Load a page from disk, naming it after its file name
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, &bytes)
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// How the binarization threshold is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Otsu's level; the manual value only seeds pages where Otsu is undefined
    #[default]
    Otsu,
    /// Use the manual value as-is
    Manual,
}

/// Preprocessing knobs exposed to the operator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParameters {
    /// Side of the square Gaussian kernel, odd and positive
    pub blur_kernel_size: u32,
    /// Reference threshold in 0..=255
    pub otsu_threshold: i32,
    /// Upscale applied before recognition, within 1.0..=MAX_SCALE_FACTOR
    pub scale_factor: f32,
    pub threshold_mode: ThresholdMode,
}

/// Largest upscale accepted before recognition
pub const MAX_SCALE_FACTOR: f32 = 3.0;

impl Default for PreprocessParameters {
    fn default() -> Self {
        Self {
            blur_kernel_size: 5,
            otsu_threshold: 128,
            scale_factor: 1.5,
            threshold_mode: ThresholdMode::Otsu,
        }
    }
}

impl PreprocessParameters {
    /// Reject malformed parameters. Nothing is corrected silently.
    pub fn validate(&self) -> Result<()> {
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(Error::InvalidParameter(format!(
                "blur kernel size must be odd and positive, got {}",
                self.blur_kernel_size
            )));
        }
        if !(0..=255).contains(&self.otsu_threshold) {
            return Err(Error::InvalidParameter(format!(
                "threshold must be within 0..=255, got {}",
                self.otsu_threshold
            )));
        }
        if !self.scale_factor.is_finite()
            || !(1.0..=MAX_SCALE_FACTOR).contains(&self.scale_factor)
        {
            return Err(Error::InvalidParameter(format!(
                "scale factor must be within 1.0..={}, got {}",
                MAX_SCALE_FACTOR, self.scale_factor
            )));
        }
        Ok(())
    }

    /// Threshold as a pixel value. Only meaningful after `validate`.
    pub fn threshold_level(&self) -> u8 {
        self.otsu_threshold.clamp(0, 255) as u8
    }
}

/// Two vertical preview markers, in pixels from the left edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitLines {
    pub left: u32,
    pub right: u32,
}

/// Text recovered from one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrResult {
    pub name: String,
    pub raw_text: String,
    pub normalized_text: String,
    /// Set when recognition failed and `raw_text` is a placeholder
    pub warning: Option<String>,
}

impl OcrResult {
    pub fn is_placeholder(&self) -> bool {
        self.warning.is_some()
    }
}

/// Fraction of a batch that has been processed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.done as f32 / self.total as f32
    }
}

/// Everything a finished batch hands back
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Per-page results in natural page order
    pub pages: Vec<OcrResult>,
    pub split_lines: Option<SplitLines>,
    pub raw_combined: String,
    pub normalized_combined: String,
}

impl BatchOutput {
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages
            .iter()
            .filter_map(|p| p.warning.as_deref().map(|w| (p.name.as_str(), w)))
    }
}
