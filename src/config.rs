//! Runtime configuration for the inspection workflow.
//!
//! Every path the program touches is carried explicitly in [`InspectConfig`]
//! and handed to the session, instead of being read from ambient process
//! state at the point of use. Settings load from an optional TOML file next
//! to the working directory; absent fields fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::TrainOptions;

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "digitscope.toml";
/// Default filename of the persisted model artifact.
pub const MODEL_FILE_NAME: &str = "mnist_model.json";

/// Paths and training settings injected into the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectConfig {
    /// Persisted model artifact; presence decides load vs. train.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Directory holding the four MNIST IDX files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory scanned for user-supplied images.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Directory that receives thresholded 28x28 copies of external images.
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    /// Directory that receives rendered inspection views.
    #[serde(default = "default_render_dir")]
    pub render_dir: PathBuf,
    /// Training hyperparameters used when no artifact exists.
    #[serde(default)]
    pub training: TrainOptions,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            data_dir: default_data_dir(),
            input_dir: default_input_dir(),
            processed_dir: default_processed_dir(),
            render_dir: default_render_dir(),
            training: TrainOptions::default(),
        }
    }
}

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The config file exists but is not valid TOML.
    #[error("Failed to parse config {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl InspectConfig {
    /// Load `digitscope.toml` from `dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml { path, source })
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(MODEL_FILE_NAME)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("processed_input")
}

fn default_render_dir() -> PathBuf {
    PathBuf::from("rendered")
}
