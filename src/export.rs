use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::BatchOutput;

/// File name of the unmodified recognized text
pub const RAW_TEXT_FILE: &str = "full_text.txt";
/// File name of the corrected, rejoined text
pub const PROCESSED_TEXT_FILE: &str = "processed_text.txt";

/// Paths written by [`write_artifacts`]
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub raw: PathBuf,
    pub processed: PathBuf,
}

/// Write both text artifacts as UTF-8 into `dir`, creating it if needed
pub fn write_artifacts(dir: &Path, output: &BatchOutput) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(dir)?;
    let paths = ArtifactPaths {
        raw: dir.join(RAW_TEXT_FILE),
        processed: dir.join(PROCESSED_TEXT_FILE),
    };
    std::fs::write(&paths.raw, output.raw_combined.as_bytes())?;
    std::fs::write(&paths.processed, output.normalized_combined.as_bytes())?;
    info!(
        raw = %paths.raw.display(),
        processed = %paths.processed.display(),
        "Wrote text artifacts"
    );
    Ok(paths)
}

/// Browser download link with the text embedded as a base64 data URI
pub fn download_link(text: &str, filename: &str) -> String {
    let b64 = BASE64.encode(text.as_bytes());
    format!(
        r#"<a href="data:file/txt;base64,{}" download="{}">Download {}</a>"#,
        b64, filename, filename
    )
}

/// Links for both artifacts, raw first
pub fn download_links(output: &BatchOutput) -> [String; 2] {
    [
        download_link(&output.raw_combined, RAW_TEXT_FILE),
        download_link(&output.normalized_combined, PROCESSED_TEXT_FILE),
    ]
}
