use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};

/// Data that flows through the pipeline: one page raster plus whatever the
/// steps learned about it along the way
#[derive(Clone)]
pub struct PipelineData {
    /// The current raster (colour, grayscale or binary depending on the step)
    pub image: DynamicImage,

    /// Metadata recorded by steps (e.g. "threshold", "kernel_size")
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Int(i32),
}

impl PipelineData {
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image,
            metadata: HashMap::new(),
        }
    }

    /// Replace the raster, keeping the metadata gathered so far
    pub fn with_image(mut self, image: DynamicImage) -> Self {
        self.image = image;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Where intermediate rasters are written when debugging a run
#[derive(Clone, Debug)]
pub struct DebugConfig {
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or not exist yet
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(Error::Config(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }
        Ok(Self { output_dir })
    }

    /// One directory per page, named after the full file name so `p1.jpg`
    /// and `p1.png` never share dumps
    fn page_dir(&self, label: &str) -> PathBuf {
        let name = Path::new(label)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| label.to_string());
        self.output_dir.join(name)
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// A single raster transform
pub trait PipelineStep: Send + Sync {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name, also used for debug file names
    fn name(&self) -> &str;
}

/// Ordered list of steps run over one page at a time.
///
/// A pipeline holds no per-page state, so one instance can serve several
/// pages concurrently.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save every step's output under `debug.output_dir/<page>/`
    pub fn with_debug(mut self, debug: Option<DebugConfig>) -> Self {
        self.context.debug = debug;
        self
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order. `label` names the page in logs and debug dumps.
    pub fn run(&self, input: DynamicImage, label: &str) -> Result<PipelineData> {
        self.run_partial(input, label, self.steps.len())
    }

    /// Run only the first `num_steps` steps
    pub fn run_partial(
        &self,
        input: DynamicImage,
        label: &str,
        num_steps: usize,
    ) -> Result<PipelineData> {
        let mut data = PipelineData::from_image(input);
        self.save_debug(label, 0, "input", &data)?;

        for (idx, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!(page = label, step = step.name(), "Running step");
            data = step.process(data, &self.context)?;
            self.save_debug(label, idx + 1, step.name(), &data)?;
        }

        Ok(data)
    }

    fn save_debug(&self, label: &str, idx: usize, step_name: &str, data: &PipelineData) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };

        let page_dir = debug_config.page_dir(label);
        std::fs::create_dir_all(&page_dir)?;
        let filename = format!(
            "{:02}_{}.png",
            idx,
            step_name.to_lowercase().replace(' ', "_")
        );
        data.image.save(page_dir.join(&filename))?;
        debug!(page = label, file = %filename, "Saved debug image");
        Ok(())
    }
}
