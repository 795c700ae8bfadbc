use thiserror::Error;

use crate::model::argmax;

/// Which side of the partition to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Samples whose predicted label equals the actual label.
    Correct,
    /// Samples whose predicted label differs from the actual label.
    Incorrect,
}

impl Bucket {
    /// Lowercase adjective for user-facing messages.
    pub fn as_adjective(self) -> &'static str {
        match self {
            Bucket::Correct => "correctly predicted",
            Bucket::Incorrect => "incorrectly predicted",
        }
    }
}

/// Evaluated samples split into correct and incorrect buckets.
///
/// Each bucket is an ordered list of `(sample index, predicted label)` pairs
/// in ascending sample-index order. Every evaluated index lands in exactly
/// one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionPartition {
    /// Samples predicted correctly.
    pub correct: Vec<(usize, usize)>,
    /// Samples predicted incorrectly.
    pub incorrect: Vec<(usize, usize)>,
}

impl PredictionPartition {
    /// Total number of partitioned samples.
    pub fn len(&self) -> usize {
        self.correct.len() + self.incorrect.len()
    }

    /// Whether no samples were partitioned.
    pub fn is_empty(&self) -> bool {
        self.correct.is_empty() && self.incorrect.is_empty()
    }

    /// Borrow one side of the partition.
    pub fn bucket(&self, bucket: Bucket) -> &[(usize, usize)] {
        match bucket {
            Bucket::Correct => &self.correct,
            Bucket::Incorrect => &self.incorrect,
        }
    }
}

/// Errors raised when the partition preconditions do not hold.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// Ground truth and prediction sequences differ in length.
    #[error("Ground truth and prediction counts differ: {truth} vs {predictions}")]
    LengthMismatch { truth: usize, predictions: usize },
    /// A ground-truth row carries no hot entry.
    #[error("Ground-truth row {index} has no hot entry")]
    MissingHotEntry { index: usize },
    /// A prediction row is empty.
    #[error("Prediction row {index} is empty")]
    EmptyPrediction { index: usize },
}

/// Position of the single hot entry in a one-hot row.
pub fn hot_index(row: &[f32]) -> Option<usize> {
    row.iter().position(|&v| v == 1.0)
}

/// Pair each ground-truth row with its prediction row and split the sample
/// indices into correct and incorrect buckets keyed by predicted label.
pub fn partition_predictions(
    truth: &[Vec<f32>],
    predictions: &[Vec<f32>],
) -> Result<PredictionPartition, PartitionError> {
    if truth.len() != predictions.len() {
        return Err(PartitionError::LengthMismatch {
            truth: truth.len(),
            predictions: predictions.len(),
        });
    }

    let mut partition = PredictionPartition::default();
    for (index, (truth_row, prediction)) in truth.iter().zip(predictions.iter()).enumerate() {
        let actual = hot_index(truth_row).ok_or(PartitionError::MissingHotEntry { index })?;
        if prediction.is_empty() {
            return Err(PartitionError::EmptyPrediction { index });
        }
        let predicted = argmax(prediction);
        if actual == predicted {
            partition.correct.push((index, predicted));
        } else {
            partition.incorrect.push((index, predicted));
        }
    }
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_a_toy_two_class_run() {
        let truth = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]];
        let predictions = vec![vec![0.9, 0.1], vec![0.2, 0.8], vec![0.3, 0.7]];

        let partition = partition_predictions(&truth, &predictions).unwrap();
        assert_eq!(partition.correct, vec![(0, 0), (1, 1)]);
        assert_eq!(partition.incorrect, vec![(2, 1)]);
    }

    #[test]
    fn every_index_lands_in_exactly_one_bucket() {
        let truth: Vec<Vec<f32>> = (0..6).map(|i| one_hot_row(i % 3)).collect();
        let predictions: Vec<Vec<f32>> = (0..6).map(|i| prob_row((i + i / 3) % 3)).collect();

        let partition = partition_predictions(&truth, &predictions).unwrap();
        assert_eq!(partition.len(), 6);
        let mut seen: Vec<usize> = partition
            .correct
            .iter()
            .chain(partition.incorrect.iter())
            .map(|(index, _)| *index)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn buckets_keep_ascending_sample_order() {
        let truth: Vec<Vec<f32>> = (0..5).map(|_| one_hot_row(0)).collect();
        let predictions = vec![
            prob_row(0),
            prob_row(1),
            prob_row(0),
            prob_row(2),
            prob_row(0),
        ];

        let partition = partition_predictions(&truth, &predictions).unwrap();
        assert_eq!(partition.correct, vec![(0, 0), (2, 0), (4, 0)]);
        assert_eq!(partition.incorrect, vec![(1, 1), (3, 2)]);
    }

    #[test]
    fn argmax_tie_goes_to_the_first_class() {
        let truth = vec![vec![0.0, 1.0]];
        let predictions = vec![vec![0.5, 0.5]];
        let partition = partition_predictions(&truth, &predictions).unwrap();
        assert_eq!(partition.incorrect, vec![(0, 0)]);
    }

    #[test]
    fn rejects_length_mismatch() {
        let truth = vec![vec![1.0, 0.0]];
        let err = partition_predictions(&truth, &[]).unwrap_err();
        assert!(matches!(
            err,
            PartitionError::LengthMismatch { truth: 1, predictions: 0 }
        ));
    }

    #[test]
    fn rejects_truth_without_hot_entry() {
        let truth = vec![vec![0.0, 0.0]];
        let predictions = vec![vec![0.4, 0.6]];
        let err = partition_predictions(&truth, &predictions).unwrap_err();
        assert!(matches!(err, PartitionError::MissingHotEntry { index: 0 }));
    }

    #[test]
    fn rejects_empty_prediction_row() {
        let truth = vec![vec![1.0, 0.0]];
        let predictions = vec![Vec::new()];
        let err = partition_predictions(&truth, &predictions).unwrap_err();
        assert!(matches!(err, PartitionError::EmptyPrediction { index: 0 }));
    }

    fn one_hot_row(label: usize) -> Vec<f32> {
        let mut row = vec![0.0; 3];
        row[label] = 1.0;
        row
    }

    fn prob_row(label: usize) -> Vec<f32> {
        let mut row = vec![0.1; 3];
        row[label] = 0.8;
        row
    }
}
