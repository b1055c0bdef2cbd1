use image::{DynamicImage, GrayImage};
use imageproc::filter::separable_filter_equal;

use crate::error::{Error, Result};
use crate::models::ThresholdMode;
use crate::pipeline::{MetadataValue, PipelineContext, PipelineData, PipelineStep};
use crate::preprocess::threshold;

/// Convert to single-channel luma
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = data.image.to_luma8();
        Ok(data.with_image(DynamicImage::ImageLuma8(gray)))
    }

    fn name(&self) -> &str {
        "Grayscale"
    }
}

/// 1-D Gaussian weights for an odd `size`, with the sigma derived from the
/// size the usual way (`0.3 * ((size - 1) / 2 - 1) + 0.8`). Sizes up to 7 use
/// the standard binomial-like tables.
pub fn gaussian_kernel(size: u32) -> Result<Vec<f32>> {
    if size == 0 || size % 2 == 0 {
        return Err(Error::InvalidParameter(format!(
            "blur kernel size must be odd and positive, got {}",
            size
        )));
    }

    let fixed: &[f32] = match size {
        1 => &[1.0],
        3 => &[0.25, 0.5, 0.25],
        5 => &[0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        _ => &[],
    };
    if !fixed.is_empty() {
        return Ok(fixed.to_vec());
    }

    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f64;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    Ok(raw.into_iter().map(|w| (w / sum) as f32).collect())
}

/// Square Gaussian blur of side `kernel_size`
pub fn gaussian_blur(image: &GrayImage, kernel_size: u32) -> Result<GrayImage> {
    let kernel = gaussian_kernel(kernel_size)?;
    if kernel.len() == 1 {
        return Ok(image.clone());
    }
    Ok(separable_filter_equal(image, &kernel))
}

/// Gaussian blur with an explicit square kernel side
pub struct GaussianBlurStep {
    pub kernel_size: u32,
}

impl PipelineStep for GaussianBlurStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = data.image.to_luma8();
        let blurred = gaussian_blur(&gray, self.kernel_size)?;
        Ok(data
            .with_image(DynamicImage::ImageLuma8(blurred))
            .with_metadata("kernel_size", MetadataValue::Int(self.kernel_size as i32)))
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Global binarization to strict 0/255
pub struct BinarizeStep {
    pub mode: ThresholdMode,
    /// Manual level, or the fallback for pages where Otsu is undefined
    pub reference: u8,
}

impl PipelineStep for BinarizeStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = data.image.to_luma8();
        let choice = threshold::choose_threshold(&gray, self.mode, self.reference);
        let binary = threshold::binarize(&gray, choice.level);
        Ok(data
            .with_image(DynamicImage::ImageLuma8(binary))
            .with_metadata("threshold", MetadataValue::Int(choice.level as i32))
            .with_metadata("threshold_fallback", MetadataValue::Bool(choice.fell_back)))
    }

    fn name(&self) -> &str {
        "Threshold"
    }
}
