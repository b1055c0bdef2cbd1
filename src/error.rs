use thiserror::Error;

use crate::models::BatchOutput;

/// Errors produced by the page pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Recognition engine unavailable: {0}")]
    RecognitionUnavailable(String),

    #[error("No pages supplied, nothing to process")]
    EmptyBatch,

    #[error("Page index {index} out of range (batch has {len} pages)")]
    PageIndexOutOfRange { index: usize, len: usize },

    #[error("Unsupported input format: {0} (expected JPEG or PNG)")]
    UnsupportedFormat(String),

    #[error("Invalid correction pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// `partial` holds the pages finished before the first unfinished one
    #[error("Batch cancelled after {completed} of {total} pages")]
    Cancelled {
        completed: usize,
        total: usize,
        partial: Box<BatchOutput>,
    },

    #[error("Page worker failed: {0}")]
    Worker(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
