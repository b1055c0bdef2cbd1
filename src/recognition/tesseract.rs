use image::GrayImage;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;
use tempdir::TempDir;
use tracing::debug;

use crate::error::{Error, Result};
use crate::recognition::{EngineConfig, RecognitionEngine};

/// Runs the `tesseract` executable once per page.
///
/// Each call gets its own scratch directory and process, so concurrent calls
/// share nothing.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
        }
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, input: &std::path::Path, config: &EngineConfig) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&config.language)
            .arg("--oem")
            .arg(config.engine_mode.oem().to_string())
            .arg("--psm")
            .arg(config.page_segmentation.psm().to_string())
            // No form feed after the page text
            .arg("-c")
            .arg("page_separator=");
        cmd
    }

    /// Languages the installed engine has data for
    pub fn list_languages(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RecognitionUnavailable(format!(
                "tesseract --list-langs failed: {}",
                stderr.trim()
            )));
        }
        // First line is a "List of available languages" header
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn spawn_error(&self, err: std::io::Error) -> Error {
        if err.kind() == ErrorKind::NotFound {
            Error::RecognitionUnavailable(format!(
                "{} not found (is tesseract installed?)",
                self.binary.display()
            ))
        } else {
            Error::RecognitionUnavailable(format!(
                "failed to run {}: {}",
                self.binary.display(),
                err
            ))
        }
    }
}

impl RecognitionEngine for TesseractCli {
    fn recognize(&self, image: &GrayImage, config: &EngineConfig) -> Result<String> {
        let scratch = TempDir::new("bookocr")?;
        let input = scratch.path().join("page.png");
        image.save(&input)?;

        debug!(
            language = %config.language,
            oem = config.engine_mode.oem(),
            psm = config.page_segmentation.psm(),
            "Invoking tesseract"
        );
        let output = self
            .command(&input, config)
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RecognitionUnavailable(format!(
                "tesseract failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
