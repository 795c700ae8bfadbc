//! Digit classifier: model, training, persistence, and evaluation metrics.

pub mod metrics;
mod mlp;
mod store;
mod train;

pub use mlp::{MlpModel, argmax, softmax};
pub use store::{ModelSource, StoreError, load_model, load_or_train, save_model};
pub use train::{EpochProgress, TrainError, TrainOptions, train_mlp};
