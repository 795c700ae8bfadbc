use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

/// The requested bucket/label combination matched no samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No occurrences of the requested digit in the chosen bucket")]
pub struct EmptySelection;

/// Collect the sample indices in `bucket` whose predicted label equals
/// `label`, preserving the bucket's ascending order.
pub fn occurrences_of(bucket: &[(usize, usize)], label: usize) -> Vec<usize> {
    bucket
        .iter()
        .filter(|(_, predicted)| *predicted == label)
        .map(|(index, _)| *index)
        .collect()
}

/// Choose one occurrence uniformly at random.
pub fn pick_random<R: Rng + ?Sized>(
    rng: &mut R,
    occurrences: &[usize],
) -> Result<usize, EmptySelection> {
    occurrences.choose(rng).copied().ok_or(EmptySelection)
}
