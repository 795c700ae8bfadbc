use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::LabeledSplit;

use super::MlpModel;

/// Hyperparameters for training the classifier.
///
/// The defaults mirror the network this tool has always shipped: 784 hidden
/// units with dropout 0.2, plain SGD at 0.001 for 150 epochs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOptions {
    /// Hidden layer width.
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    /// Number of passes over the training split.
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    /// Minibatch size.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// SGD learning rate.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Hidden-layer dropout probability.
    #[serde(default = "default_dropout")]
    pub dropout: f32,
    /// RNG seed for weight init and shuffling.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            hidden_size: default_hidden_size(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            dropout: default_dropout(),
            seed: default_seed(),
        }
    }
}

fn default_hidden_size() -> usize {
    784
}

fn default_epochs() -> usize {
    150
}

fn default_batch_size() -> usize {
    32
}

fn default_learning_rate() -> f32 {
    0.001
}

fn default_dropout() -> f32 {
    0.2
}

fn default_seed() -> u64 {
    42
}

/// Errors that can occur while training.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Image and label row counts differ.
    #[error("Image and label counts differ: {images} vs {labels}")]
    LengthMismatch { images: usize, labels: usize },
    /// The training split holds no samples.
    #[error("Training dataset is empty")]
    EmptyDataset,
    /// A feature row has the wrong length.
    #[error("Image row {index} has length {found}, expected {expected}")]
    BadImageRow {
        index: usize,
        found: usize,
        expected: usize,
    },
    /// A label row has the wrong length.
    #[error("Label row {index} has length {found}, expected {expected}")]
    BadLabelRow {
        index: usize,
        found: usize,
        expected: usize,
    },
}

/// Progress report emitted after each completed epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochProgress {
    /// Completed epoch, 1-based.
    pub epoch: usize,
    /// Total number of epochs.
    pub total: usize,
    /// Mean cross-entropy over the epoch.
    pub mean_loss: f32,
}

/// Train the classifier with minibatch SGD and inverted dropout.
pub fn train_mlp(
    split: &LabeledSplit,
    options: &TrainOptions,
    mut progress: Option<&mut dyn FnMut(EpochProgress)>,
) -> Result<MlpModel, TrainError> {
    if split.images.len() != split.labels.len() {
        return Err(TrainError::LengthMismatch {
            images: split.images.len(),
            labels: split.labels.len(),
        });
    }
    if split.is_empty() {
        return Err(TrainError::EmptyDataset);
    }
    let n = split.len();
    let d = split.images[0].len();
    let n_classes = split.labels[0].len();
    for (index, row) in split.images.iter().enumerate() {
        if row.len() != d {
            return Err(TrainError::BadImageRow {
                index,
                found: row.len(),
                expected: d,
            });
        }
    }
    for (index, row) in split.labels.iter().enumerate() {
        if row.len() != n_classes {
            return Err(TrainError::BadLabelRow {
                index,
                found: row.len(),
                expected: n_classes,
            });
        }
    }

    let hidden = options.hidden_size.max(1);
    let batch_size = options.batch_size.max(1);
    let dropout = options.dropout.clamp(0.0, 0.9);
    let mut rng = StdRng::seed_from_u64(options.seed);

    let mut weights1 = vec![0.0f32; hidden * d];
    let mut bias1 = vec![0.0f32; hidden];
    let mut weights2 = vec![0.0f32; n_classes * hidden];
    let mut bias2 = vec![0.0f32; n_classes];

    for w in &mut weights1 {
        *w = (rng.random::<f32>() - 0.5) * 0.1;
    }
    for w in &mut weights2 {
        *w = (rng.random::<f32>() - 0.5) * 0.1;
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut hidden_pre = vec![0.0f32; hidden];
    let mut hidden_act = vec![0.0f32; hidden];
    let mut logits = vec![0.0f32; n_classes];
    let mut probs = vec![0.0f32; n_classes];

    for epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        let mut epoch_loss = 0.0f32;

        for batch in indices.chunks(batch_size) {
            let mut d_w1 = vec![0.0f32; weights1.len()];
            let mut d_b1 = vec![0.0f32; bias1.len()];
            let mut d_w2 = vec![0.0f32; weights2.len()];
            let mut d_b2 = vec![0.0f32; bias2.len()];

            for &idx in batch {
                let x = &split.images[idx];
                let target = &split.labels[idx];

                for h in 0..hidden {
                    let mut sum = bias1[h];
                    let base = h * d;
                    for i in 0..d {
                        sum += weights1[base + i] * x[i];
                    }
                    hidden_pre[h] = sum;
                    let mut act = sum.max(0.0);
                    if dropout > 0.0 {
                        if rng.random::<f32>() > dropout {
                            act /= 1.0 - dropout;
                        } else {
                            act = 0.0;
                        }
                    }
                    hidden_act[h] = act;
                }

                for c in 0..n_classes {
                    let mut sum = bias2[c];
                    let base = c * hidden;
                    for h in 0..hidden {
                        sum += weights2[base + h] * hidden_act[h];
                    }
                    logits[c] = sum;
                }
                softmax_inplace(&logits, &mut probs);

                for c in 0..n_classes {
                    epoch_loss -= target[c] * probs[c].max(1e-7).ln();
                }

                let mut d_hidden = vec![0.0f32; hidden];
                for c in 0..n_classes {
                    let dz2 = probs[c] - target[c];
                    d_b2[c] += dz2;
                    let base = c * hidden;
                    for h in 0..hidden {
                        d_w2[base + h] += dz2 * hidden_act[h];
                        d_hidden[h] += dz2 * weights2[base + h];
                    }
                }
                for h in 0..hidden {
                    if hidden_pre[h] <= 0.0 {
                        d_hidden[h] = 0.0;
                    }
                    d_b1[h] += d_hidden[h];
                    let base = h * d;
                    for i in 0..d {
                        d_w1[base + i] += d_hidden[h] * x[i];
                    }
                }
            }

            let scale = options.learning_rate / batch.len() as f32;
            for i in 0..weights1.len() {
                weights1[i] -= scale * d_w1[i];
            }
            for i in 0..bias1.len() {
                bias1[i] -= scale * d_b1[i];
            }
            for i in 0..weights2.len() {
                weights2[i] -= scale * d_w2[i];
            }
            for i in 0..bias2.len() {
                bias2[i] -= scale * d_b2[i];
            }
        }

        if let Some(report) = progress.as_deref_mut() {
            report(EpochProgress {
                epoch: epoch + 1,
                total: options.epochs,
                mean_loss: epoch_loss / n as f32,
            });
        }
    }

    Ok(MlpModel {
        model_version: 1,
        input_len: d,
        n_classes,
        hidden_size: hidden,
        weights1,
        bias1,
        weights2,
        bias2,
    })
}

fn softmax_inplace(raw: &[f32], out: &mut [f32]) {
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut sum = 0.0f32;
    for (i, &v) in raw.iter().enumerate() {
        let e = (v - max).exp();
        out[i] = e;
        sum += e;
    }
    if sum == 0.0 {
        let uniform = 1.0 / (raw.len() as f32);
        for v in out.iter_mut() {
            *v = uniform;
        }
        return;
    }
    for v in out.iter_mut() {
        *v /= sum;
    }
}
