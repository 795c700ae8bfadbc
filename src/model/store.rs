use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::dataset::LabeledSplit;

use super::{EpochProgress, MlpModel, TrainError, TrainOptions, train_mlp};

/// Errors that can occur while persisting or restoring the model artifact.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The artifact exists but no usable model could be restored from it.
    #[error("Model artifact {path} is unusable: {reason}")]
    ModelUnavailable { path: PathBuf, reason: String },
    /// Training a replacement model failed.
    #[error(transparent)]
    Train(#[from] TrainError),
    /// The artifact could not be encoded.
    #[error("Failed to encode model artifact: {0}")]
    Encode(serde_json::Error),
    /// The artifact could not be written.
    #[error("Failed to write model artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where the model handed back by [`load_or_train`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Restored from an existing artifact.
    Loaded,
    /// Freshly trained and saved.
    Trained,
}

/// Restore the model from `path`.
///
/// Any failure to read, decode, or validate the artifact is reported as
/// [`StoreError::ModelUnavailable`] so callers can end the run cleanly
/// instead of crashing on a half-written file.
pub fn load_model(path: &Path) -> Result<MlpModel, StoreError> {
    let unavailable = |reason: String| StoreError::ModelUnavailable {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|err| unavailable(err.to_string()))?;
    let model: MlpModel =
        serde_json::from_slice(&bytes).map_err(|err| unavailable(err.to_string()))?;
    model.validate().map_err(unavailable)?;
    Ok(model)
}

/// Write the model artifact as pretty-printed JSON, via a temp file so a
/// failed write never leaves a half-written artifact behind.
pub fn save_model(path: &Path, model: &MlpModel) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(model).map_err(StoreError::Encode)?;
    let tmp = path.with_extension("tmp");
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

/// Load the artifact at `path` when it exists, otherwise train on `split`
/// and save the result. The presence of the file is the sole signal.
pub fn load_or_train(
    path: &Path,
    split: &LabeledSplit,
    options: &TrainOptions,
    progress: Option<&mut dyn FnMut(EpochProgress)>,
) -> Result<(MlpModel, ModelSource), StoreError> {
    if path.is_file() {
        info!("Found model artifact at {}, loading", path.display());
        return Ok((load_model(path)?, ModelSource::Loaded));
    }
    info!(
        "No model artifact at {}, training a new model",
        path.display()
    );
    let model = train_mlp(split, options, progress)?;
    save_model(path, &model)?;
    Ok((model, ModelSource::Trained))
}
