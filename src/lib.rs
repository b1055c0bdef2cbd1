pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod models;
pub mod ordering;
pub mod pipeline;
pub mod preprocess;
pub mod preview;
pub mod recognition;
pub mod text;

pub use batch::{BatchOptions, BatchRunner, CancelFlag};
pub use error::{Error, Result};
pub use models::{
    BatchOutput, OcrResult, PageImage, PreprocessParameters, Progress, SplitLines, ThresholdMode,
};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use preprocess::{Preprocessor, downscale, preprocess};
pub use recognition::{EngineConfig, RecognitionAdapter, RecognitionEngine};
pub use text::{CorrectionRule, CorrectionTable, TextNormalizer};
