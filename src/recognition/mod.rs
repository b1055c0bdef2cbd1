//! Recognition adapter: upscales a binarized page and hands it to a text
//! recognition engine with a fixed language and mode.

pub mod ocrs_engine;
pub mod tesseract;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::PreprocessParameters;
use crate::preprocess::resize::{resize_area, scaled_dimensions};

pub use ocrs_engine::OcrsEngine;
pub use tesseract::TesseractCli;

/// Engine mode, numbered like tesseract's `--oem`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineMode {
    LegacyOnly,
    LstmOnly,
    LegacyLstm,
    Default,
}

impl EngineMode {
    pub fn oem(&self) -> u8 {
        match self {
            EngineMode::LegacyOnly => 0,
            EngineMode::LstmOnly => 1,
            EngineMode::LegacyLstm => 2,
            EngineMode::Default => 3,
        }
    }
}

/// Layout assumption, numbered like tesseract's `--psm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSegmentation {
    Auto,
    SingleColumn,
    UniformBlock,
    SingleLine,
    SparseText,
}

impl PageSegmentation {
    pub fn psm(&self) -> u8 {
        match self {
            PageSegmentation::Auto => 3,
            PageSegmentation::SingleColumn => 4,
            PageSegmentation::UniformBlock => 6,
            PageSegmentation::SingleLine => 7,
            PageSegmentation::SparseText => 11,
        }
    }
}

/// Operating parameters passed to the engine on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tesseract language code
    pub language: String,
    pub engine_mode: EngineMode,
    pub page_segmentation: PageSegmentation,
}

impl Default for EngineConfig {
    /// French, uniform text block, `--oem 1` (LSTM only). Select
    /// `LegacyLstm` through config for `--oem 2`.
    fn default() -> Self {
        Self {
            language: "fra".to_string(),
            engine_mode: EngineMode::LstmOnly,
            page_segmentation: PageSegmentation::UniformBlock,
        }
    }
}

/// A text recognition engine.
///
/// Implementations must be safe to call from several threads at once and
/// must report failure as `Error::RecognitionUnavailable` instead of
/// returning empty or garbage text.
pub trait RecognitionEngine: Send + Sync {
    fn recognize(&self, image: &GrayImage, config: &EngineConfig) -> Result<String>;

    fn name(&self) -> &str;
}

/// Binds an engine to a fixed configuration
#[derive(Clone)]
pub struct RecognitionAdapter {
    engine: Arc<dyn RecognitionEngine>,
    config: EngineConfig,
}

impl RecognitionAdapter {
    pub fn new(engine: Arc<dyn RecognitionEngine>, config: EngineConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Upscale by `params.scale_factor`, then recognize. No retries.
    pub fn recognize(&self, binary: &GrayImage, params: &PreprocessParameters) -> Result<String> {
        let upscaled = upscale(binary, params.scale_factor);
        debug!(
            engine = self.engine.name(),
            width = upscaled.width(),
            height = upscaled.height(),
            "Running recognition"
        );
        self.engine.recognize(&upscaled, &self.config)
    }
}

/// Area-interpolated upscale of a binarized page
pub fn upscale(binary: &GrayImage, factor: f32) -> GrayImage {
    let (width, height) = scaled_dimensions(binary.width(), binary.height(), factor as f64);
    resize_area(binary, width, height)
}
