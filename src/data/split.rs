use anyhow::{ensure, Result};
use rand::Rng;
use tracing::debug;

use crate::data::dataset::Dataset;

/// Train / validation / test partitions of one dataset.
#[derive(Debug, Clone)]
pub struct Partitions<I> {
    pub train: Dataset<I>,
    pub validation: Option<Dataset<I>>,
    pub test: Option<Dataset<I>>,
}

/// Share of the remaining training data held out when no validation size
/// is given.
pub const DEFAULT_VALIDATION_FRACTION: f64 = 0.2;

/// Shuffles `dataset`, holds out the last `test_fraction` as the test set,
/// then holds out the first `validation_size` remaining samples for
/// validation (a fifth of them when `None`). Zero sizes leave the partition
/// out.
///
/// # Errors
/// Fails when the split would leave no training samples.
pub fn partition<I, R: Rng>(
    dataset: Dataset<I>,
    test_fraction: f64,
    validation_size: Option<usize>,
    rng: &mut R,
) -> Result<Partitions<I>> {
    ensure!(
        (0.0..1.0).contains(&test_fraction),
        "test_fraction must lie in [0, 1), got {}", test_fraction
    );
    let total = dataset.len();
    let shuffled = dataset.shuffled(rng);

    let n_test = (total as f64 * test_fraction).round() as usize;
    let (rest, test) = shuffled.split_at(total - n_test);

    let validation_size = validation_size
        .unwrap_or_else(|| (rest.len() as f64 * DEFAULT_VALIDATION_FRACTION).round() as usize);
    ensure!(
        validation_size < rest.len(),
        "validation_size {} leaves no training samples out of {}", validation_size, rest.len()
    );
    let (validation, train) = rest.split_at(validation_size);

    debug!(
        train = train.len(),
        validation = validation.len(),
        test = test.len(),
        "dataset split"
    );

    Ok(Partitions {
        train,
        validation: (!validation.is_empty()).then_some(validation),
        test: (!test.is_empty()).then_some(test),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn items(n: usize) -> Dataset<usize> {
        Dataset::new((0..n).collect(), vec![0; n], 1).unwrap()
    }

    #[test]
    fn sizes_follow_fraction_and_count() {
        let parts = partition(items(100), 0.2, Some(10), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(parts.test.as_ref().map(Dataset::len), Some(20));
        assert_eq!(parts.validation.as_ref().map(Dataset::len), Some(10));
        assert_eq!(parts.train.len(), 70);
    }

    #[test]
    fn all_items_preserved() {
        let parts = partition(items(50), 0.3, Some(5), &mut StdRng::seed_from_u64(2)).unwrap();
        let mut all: Vec<usize> = parts.train.inputs().to_vec();
        all.extend(parts.validation.unwrap().inputs());
        all.extend(parts.test.unwrap().inputs());
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn empty_partitions_are_none() {
        let parts = partition(items(10), 0.0, Some(0), &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(parts.validation.is_none());
        assert!(parts.test.is_none());
        assert_eq!(parts.train.len(), 10);
    }

    #[test]
    fn missing_validation_size_holds_out_a_fifth() {
        let parts = partition(items(150), 0.2, None, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(parts.validation.map(|v| v.len()), Some(24));
        assert_eq!(parts.train.len(), 96);
    }

    #[test]
    fn oversized_validation_is_rejected() {
        assert!(partition(items(10), 0.5, Some(5), &mut StdRng::seed_from_u64(4)).is_err());
        assert!(partition(items(10), 1.0, Some(0), &mut StdRng::seed_from_u64(4)).is_err());
    }
}
