//! Prediction inspection workflow: bucketing, selection, and the
//! interactive session that ties them to the classifier and renderer.

mod occurrences;
mod partition;
mod session;

pub use occurrences::{EmptySelection, occurrences_of, pick_random};
pub use partition::{Bucket, PartitionError, PredictionPartition, hot_index, partition_predictions};
pub use session::{Classifier, InspectSession, SessionError, SessionOutcome};
