pub mod resize;
pub mod steps;
pub mod threshold;

use image::{DynamicImage, GrayImage, RgbImage};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{PageImage, PreprocessParameters};
use crate::pipeline::{DebugConfig, Pipeline};
use steps::{BinarizeStep, GaussianBlurStep, GrayscaleStep};

/// Turns page photographs into 0/255 rasters ready for recognition:
/// grayscale, square Gaussian blur, global threshold.
#[derive(Clone)]
pub struct Preprocessor {
    params: PreprocessParameters,
    pipeline: Pipeline,
}

impl Preprocessor {
    /// Fails with `InvalidParameter` before any page is touched
    pub fn new(params: PreprocessParameters) -> Result<Self> {
        params.validate()?;
        let pipeline = Pipeline::new()
            .add_step(Arc::new(GrayscaleStep))
            .add_step(Arc::new(GaussianBlurStep {
                kernel_size: params.blur_kernel_size,
            }))
            .add_step(Arc::new(BinarizeStep {
                mode: params.threshold_mode,
                reference: params.threshold_level(),
            }));
        Ok(Self { params, pipeline })
    }

    pub fn with_debug(mut self, debug: Option<DebugConfig>) -> Self {
        self.pipeline = self.pipeline.with_debug(debug);
        self
    }

    pub fn params(&self) -> &PreprocessParameters {
        &self.params
    }

    pub fn preprocess_page(&self, page: &PageImage) -> Result<GrayImage> {
        self.run(DynamicImage::ImageRgb8(page.image().clone()), &page.name)
    }

    fn run(&self, input: DynamicImage, label: &str) -> Result<GrayImage> {
        let data = self.pipeline.run(input, label)?;
        debug!(
            page = label,
            threshold = data.get_int("threshold"),
            fallback = data.get_bool("threshold_fallback"),
            "Page binarized"
        );
        Ok(data.image.into_luma8())
    }
}

/// Binarize a single raster with `params`
pub fn preprocess(image: &RgbImage, params: &PreprocessParameters) -> Result<GrayImage> {
    Preprocessor::new(*params)?.run(DynamicImage::ImageRgb8(image.clone()), "page")
}

/// Shrink a raster to `percent` of its size with area averaging.
///
/// Preview only; recognition never sees the result.
pub fn downscale(image: &RgbImage, percent: u32) -> Result<RgbImage> {
    if percent == 0 {
        return Err(Error::InvalidParameter(
            "preview scale must be a positive percentage".to_string(),
        ));
    }
    let scale = |v: u32| ((v as u64 * percent as u64 / 100) as u32).max(1);
    Ok(resize::resize_area(image, scale(image.width()), scale(image.height())))
}
