use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{FrameConfig, CANONICAL_SAMPLE_RATE, DEFAULT_FRAME_LENGTH, DEFAULT_HOP_LENGTH};

/// Upload limit applied when no override is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisSettings,
    pub upload: UploadSettings,
}

/// Sample rate and framing of the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub sample_rate: u32,
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sample_rate: CANONICAL_SAMPLE_RATE,
            frame_length: DEFAULT_FRAME_LENGTH,
            hop_length: DEFAULT_HOP_LENGTH,
        }
    }
}

impl AnalysisSettings {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            frame_length: self.frame_length,
            hop_length: self.hop_length,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.sample_rate > 0, "analysis sample_rate must be positive");
        self.frame_config().validate()
    }
}

/// Limits of the inbound audio boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: ["wav", "mp3", "m4a", "ogg"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl UploadSettings {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_upload_bytes > 0, "max_upload_bytes must be positive");
        ensure!(
            !self.allowed_extensions.is_empty(),
            "allowed_extensions must list at least one container"
        );
        Ok(())
    }
}

impl AppConfig {
    /// Defaults, or the JSON file at `path` when one is given.
    pub fn from_override(path: Option<PathBuf>) -> Result<Self> {
        let config = match path {
            Some(custom) => load_json(&custom)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.upload.validate()
    }
}

fn load_json(path: &Path) -> Result<AppConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config file at {:?}", path))
}
