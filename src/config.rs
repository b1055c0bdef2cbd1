//! Run configuration loaded from TOML.
//!
//! ```toml
//! extend_corrections = true
//!
//! [preprocess]
//! blur_kernel_size = 5
//! otsu_threshold = 128
//! scale_factor = 1.5
//! threshold_mode = "otsu"
//!
//! [engine]
//! language = "fra"
//! engine_mode = "lstm-only"
//! page_segmentation = "uniform-block"
//!
//! [batch]
//! jobs = 2
//! page_timeout_secs = 120
//!
//! [[corrections]]
//! pattern = '\bqnand\b'
//! replacement = "quand"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::batch::BatchOptions;
use crate::error::{Error, Result};
use crate::models::PreprocessParameters;
use crate::recognition::EngineConfig;
use crate::text::{CorrectionRule, CorrectionTable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub jobs: Option<usize>,
    pub page_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub preprocess: PreprocessParameters,
    pub engine: EngineConfig,
    pub batch: BatchConfig,
    /// Replace the built-in corrections, or follow them when
    /// `extend_corrections` is set
    pub corrections: Option<Vec<CorrectionRule>>,
    pub extend_corrections: bool,
}

impl RunConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("failed to parse config as TOML: {}", e)))
    }

    /// Compile the configured correction table
    pub fn correction_table(&self) -> Result<CorrectionTable> {
        match (&self.corrections, self.extend_corrections) {
            (None, _) => Ok(CorrectionTable::default()),
            (Some(rules), false) => CorrectionTable::from_rules(rules.iter().cloned()),
            (Some(rules), true) => {
                let mut table = CorrectionTable::default();
                table.extend(rules.iter().cloned())?;
                Ok(table)
            }
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        let defaults = BatchOptions::default();
        BatchOptions {
            jobs: self.batch.jobs.unwrap_or(defaults.jobs).max(1),
            page_timeout: self
                .batch
                .page_timeout_secs
                .map(Duration::from_secs)
                .or(defaults.page_timeout),
        }
    }
}

/// Load a config file; a missing file means defaults
pub fn load_config(path: &Path) -> Result<RunConfig> {
    if !path.exists() {
        return Ok(RunConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    RunConfig::from_toml_str(&contents)
}
