use serde::{Deserialize, Serialize};

/// Feed-forward digit classifier with one ReLU hidden layer and a softmax
/// output, stored as flat row-major weight vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpModel {
    /// Artifact format version.
    pub model_version: i64,
    /// Expected feature vector length.
    pub input_len: usize,
    /// Number of output classes.
    pub n_classes: usize,
    /// Hidden layer width.
    pub hidden_size: usize,
    /// Hidden weights, `hidden_size x input_len`.
    pub weights1: Vec<f32>,
    /// Hidden biases.
    pub bias1: Vec<f32>,
    /// Output weights, `n_classes x hidden_size`.
    pub weights2: Vec<f32>,
    /// Output biases.
    pub bias2: Vec<f32>,
}

impl MlpModel {
    /// Check that all stored vector lengths agree with the declared shape.
    pub fn validate(&self) -> Result<(), String> {
        let input = self.input_len;
        let hidden = self.hidden_size;
        let classes = self.n_classes;
        if input == 0 || hidden == 0 || classes == 0 {
            return Err("model shape has a zero dimension".to_string());
        }
        if self.weights1.len() != input * hidden {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != hidden {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != classes * hidden {
            return Err("weights2 length mismatch".to_string());
        }
        if self.bias2.len() != classes {
            return Err("bias2 length mismatch".to_string());
        }
        Ok(())
    }

    /// Per-class probability distribution for one feature row.
    ///
    /// Returns an empty vector when the row length does not match the model
    /// input.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        if features.len() != self.input_len {
            return Vec::new();
        }
        let input = self.input_len;
        let hidden = self.hidden_size;
        let classes = self.n_classes;

        let mut hidden_act = vec![0.0f32; hidden];
        for h in 0..hidden {
            let mut sum = self.bias1[h];
            let base = h * input;
            for i in 0..input {
                sum += self.weights1[base + i] * features[i];
            }
            hidden_act[h] = sum.max(0.0);
        }

        let mut logits = vec![0.0f32; classes];
        for c in 0..classes {
            let mut sum = self.bias2[c];
            let base = c * hidden;
            for h in 0..hidden {
                sum += self.weights2[base + h] * hidden_act[h];
            }
            logits[c] = sum;
        }

        softmax(&logits)
    }

    /// Probability rows for a batch of feature rows.
    pub fn predict_batch(&self, rows: &[Vec<f32>]) -> Vec<Vec<f32>> {
        rows.iter().map(|row| self.predict_proba(row)).collect()
    }

    /// Most likely class for one feature row.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Index of the largest value; the first maximum wins on ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = idx;
        }
    }
    best
}

/// Compute a numerically-stable softmax for a set of logits.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut out = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        out.push(e);
        sum += e;
    }
    if sum == 0.0 {
        let uniform = 1.0 / (raw.len() as f32);
        return vec![uniform; raw.len()];
    }
    for v in &mut out {
        *v /= sum;
    }
    out
}
