use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::recognition::{EngineConfig, RecognitionEngine};

pub const DETECTION_MODEL: &str = "text-detection.rten";
pub const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Standard ocrs model cache (`~/.cache/ocrs`)
pub fn default_model_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| {
            Error::RecognitionUnavailable("cannot locate home directory for ocrs models".into())
        })?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

fn load_engine(model_dir: &Path) -> Result<OcrEngine> {
    let detection_model_path = model_dir.join(DETECTION_MODEL);
    let recognition_model_path = model_dir.join(RECOGNITION_MODEL);

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(Error::RecognitionUnavailable(format!(
            "ocrs models not found. Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        )));
    }

    let unavailable = |e: &dyn std::fmt::Display| Error::RecognitionUnavailable(e.to_string());
    let detection_model = Model::load_file(&detection_model_path).map_err(|e| unavailable(&e))?;
    let recognition_model =
        Model::load_file(&recognition_model_path).map_err(|e| unavailable(&e))?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| unavailable(&e))
}

/// In-process engine backed by `ocrs`.
///
/// Models load on first use and the loaded engine is shared by all callers.
/// ocrs has no language packs or segmentation modes, so `EngineConfig` is
/// accepted but only logged.
pub struct OcrsEngine {
    model_dir: PathBuf,
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsEngine {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            engine: Mutex::new(None),
        }
    }

    pub fn from_default_cache() -> Result<Self> {
        Ok(Self::new(default_model_dir()?))
    }

    fn engine(&self) -> Result<Arc<OcrEngine>> {
        let mut guard = self
            .engine
            .lock()
            .map_err(|_| Error::RecognitionUnavailable("ocrs engine lock poisoned".into()))?;
        if let Some(engine) = guard.as_ref() {
            return Ok(engine.clone());
        }
        info!(dir = %self.model_dir.display(), "Loading ocrs models");
        let engine = Arc::new(load_engine(&self.model_dir)?);
        *guard = Some(engine.clone());
        Ok(engine)
    }
}

impl RecognitionEngine for OcrsEngine {
    fn recognize(&self, image: &GrayImage, config: &EngineConfig) -> Result<String> {
        let engine = self.engine()?;
        debug!(language = %config.language, "ocrs ignores language and layout options");

        let unavailable = |e: &dyn std::fmt::Display| Error::RecognitionUnavailable(e.to_string());
        let rgb = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions()).map_err(|e| unavailable(&e))?;
        let input = engine.prepare_input(source).map_err(|e| unavailable(&e))?;
        engine.get_text(&input).map_err(|e| unavailable(&e))
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}
