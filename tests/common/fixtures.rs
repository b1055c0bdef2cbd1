use bookocr::{
    BatchOptions, BatchRunner, EngineConfig, Error, PageImage, PreprocessParameters,
    RecognitionAdapter, RecognitionEngine, TextNormalizer,
};
use image::{GrayImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Parameters that leave page sizes untouched, so fake engines can tell
/// pages apart by width.
pub fn test_params() -> PreprocessParameters {
    PreprocessParameters {
        scale_factor: 1.0,
        ..Default::default()
    }
}

/// A white page with a dark band, `width` pixels wide.
pub fn make_page(name: &str, width: u32) -> PageImage {
    let img = RgbImage::from_fn(width, 24, |_, y| {
        if (8..16).contains(&y) {
            Rgb([20u8, 20u8, 20u8])
        } else {
            Rgb([250u8, 250u8, 250u8])
        }
    });
    PageImage::from_rgb(name, img)
}

/// Saves a PNG page named `name` into `dir` and returns its path.
pub fn save_test_image(dir: &Path, name: &str, width: u32) -> PathBuf {
    let path = dir.join(name);
    make_page(name, width)
        .image()
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

enum Script {
    Text(String),
    Fail(String),
    Slow(String, Duration),
}

/// Engine answering by image width, counting its calls.
#[derive(Default)]
pub struct ScriptedEngine {
    scripts: HashMap<u32, Script>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, width: u32, text: &str) -> Self {
        self.scripts.insert(width, Script::Text(text.to_string()));
        self
    }

    pub fn fail(mut self, width: u32, reason: &str) -> Self {
        self.scripts.insert(width, Script::Fail(reason.to_string()));
        self
    }

    pub fn slow(mut self, width: u32, text: &str, delay: Duration) -> Self {
        self.scripts
            .insert(width, Script::Slow(text.to_string(), delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn recognize(&self, image: &GrayImage, _config: &EngineConfig) -> bookocr::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(&image.width()) {
            Some(Script::Text(text)) => Ok(text.clone()),
            Some(Script::Fail(reason)) => Err(Error::RecognitionUnavailable(reason.clone())),
            Some(Script::Slow(text, delay)) => {
                std::thread::sleep(*delay);
                Ok(text.clone())
            }
            None => Err(Error::RecognitionUnavailable(format!(
                "no script for width {}",
                image.width()
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Builds a runner around `engine` with the built-in corrections.
pub fn make_runner(engine: Arc<ScriptedEngine>, options: BatchOptions) -> BatchRunner {
    let adapter = RecognitionAdapter::new(engine, EngineConfig::default());
    BatchRunner::new(adapter, TextNormalizer::default()).with_options(options)
}
