//! Evaluation metrics for the classifier.

use super::argmax;

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let mut correct = 0u64;
    let mut total = 0u64;
    for truth in 0..cm.n_classes {
        for predicted in 0..cm.n_classes {
            let v = cm.get(truth, predicted) as u64;
            total += v;
            if truth == predicted {
                correct += v;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        (correct as f32) / (total as f32)
    }
}

/// Accuracy and mean cross-entropy of probability rows against one-hot truth.
///
/// Rows are paired in order; the caller guarantees equal lengths (the
/// partitioning step enforces this for the inspection path).
pub fn evaluate_probabilities(truth: &[Vec<f32>], predictions: &[Vec<f32>]) -> (f32, f32) {
    let n_classes = truth.first().map(Vec::len).unwrap_or(0);
    let mut cm = ConfusionMatrix::new(n_classes);
    let mut loss = 0.0f32;
    for (truth_row, prediction) in truth.iter().zip(predictions.iter()) {
        let actual = argmax(truth_row);
        cm.add(actual, argmax(prediction));
        for (t, p) in truth_row.iter().zip(prediction.iter()) {
            loss -= t * p.max(1e-7).ln();
        }
    }
    let mean_loss = if truth.is_empty() {
        0.0
    } else {
        loss / truth.len() as f32
    };
    (accuracy(&cm), mean_loss)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_the_diagonal() {
        let mut cm = ConfusionMatrix::new(3);
        cm.add(0, 0);
        cm.add(1, 1);
        cm.add(2, 0);
        cm.add(2, 2);
        assert_eq!(cm.get(2, 0), 1);
        assert!((accuracy(&cm) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn evaluate_probabilities_reports_accuracy_and_loss() {
        let truth = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let predictions = vec![vec![0.9, 0.1], vec![0.6, 0.4]];
        let (acc, loss) = evaluate_probabilities(&truth, &predictions);
        assert!((acc - 0.5).abs() < 1e-6);
        let expected = (-(0.9f32.ln()) - 0.4f32.ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn empty_input_is_zeroes() {
        let (acc, loss) = evaluate_probabilities(&[], &[]);
        assert_eq!(acc, 0.0);
        assert_eq!(loss, 0.0);
    }
}
