mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from bookocr for tests
pub use bookocr::{
    BatchOptions, BatchOutput, BatchRunner, EngineConfig, Error, PageImage, PreprocessParameters,
    Progress, RecognitionAdapter, RecognitionEngine, SplitLines, TextNormalizer,
};
