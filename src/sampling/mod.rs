//! Train/test partitioning and class-balanced undersampling
//!
//! Both operations work on row indices and a parallel label vector
//! (`y[i]` is the label of `index[i]`). Results are sorted index values.
//! With a seed the output is reproducible; without one the generator is
//! seeded from OS entropy and results vary between runs.

use crate::error::{BehavError, Result};
use ndarray::Array1;
use rand::seq::{index as rand_index, SliceRandom};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seedable index sampler
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: ChaCha8Rng,
}

impl Sampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }

    /// Stratified split into (train, test) preserving the class ratio.
    ///
    /// Each class contributes `round(count * test_fraction)` rows to the test
    /// partition.
    pub fn split(
        &mut self,
        index: &[usize],
        y: &Array1<f64>,
        test_fraction: f64,
    ) -> Result<(Vec<usize>, Vec<usize>)> {
        check_lengths(index, y)?;
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(BehavError::invalid_parameter(
                "test_split",
                test_fraction,
                "must be within (0, 1)",
            ));
        }

        let (positives, negatives) = partition_by_class(index, y);

        let mut train = Vec::with_capacity(index.len());
        let mut test = Vec::new();
        for mut class in [positives, negatives] {
            class.shuffle(&mut self.rng);
            let n_test = (class.len() as f64 * test_fraction).round() as usize;
            test.extend_from_slice(&class[..n_test]);
            train.extend_from_slice(&class[n_test..]);
        }

        if train.is_empty() || test.is_empty() {
            return Err(BehavError::DataError(format!(
                "split of {} rows at test fraction {} leaves an empty partition",
                index.len(),
                test_fraction
            )));
        }

        train.sort_unstable();
        test.sort_unstable();
        Ok((train, test))
    }

    /// Keep every positive and `round(|positives| / ratio)` random negatives.
    ///
    /// `ratio` is the target positive:negative proportion, so 0.5 keeps twice
    /// as many negatives as positives. Fails with
    /// [`BehavError::InsufficientData`] rather than returning fewer negatives
    /// than requested.
    pub fn undersample(&mut self, index: &[usize], y: &Array1<f64>, ratio: f64) -> Result<Vec<usize>> {
        check_lengths(index, y)?;
        if !(ratio > 0.0) || !ratio.is_finite() {
            return Err(BehavError::invalid_parameter(
                "undersample_ratio",
                ratio,
                "must be a positive number",
            ));
        }

        let (positives, negatives) = partition_by_class(index, y);
        let requested = (positives.len() as f64 / ratio).round() as usize;

        if requested > negatives.len() {
            return Err(BehavError::InsufficientData {
                requested,
                available: negatives.len(),
            });
        }

        let mut kept = positives;
        kept.extend(
            rand_index::sample(&mut self.rng, negatives.len(), requested)
                .into_iter()
                .map(|i| negatives[i]),
        );
        kept.sort_unstable();
        kept.dedup();

        tracing::debug!(
            positives = kept.len() - requested,
            negatives = requested,
            ratio,
            "Undersampled training index"
        );
        Ok(kept)
    }
}

fn check_lengths(index: &[usize], y: &Array1<f64>) -> Result<()> {
    if index.len() != y.len() {
        return Err(BehavError::ShapeError {
            expected: format!("y length = {}", index.len()),
            actual: format!("y length = {}", y.len()),
        });
    }
    Ok(())
}

/// (positive, negative) index values; anything above 0.5 is positive
fn partition_by_class(index: &[usize], y: &Array1<f64>) -> (Vec<usize>, Vec<usize>) {
    index.iter().zip(y.iter()).fold(
        (Vec::new(), Vec::new()),
        |(mut pos, mut neg), (&i, &label)| {
            if label > 0.5 {
                pos.push(i);
            } else {
                neg.push(i);
            }
            (pos, neg)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(n: usize, every: usize) -> (Vec<usize>, Array1<f64>) {
        let index: Vec<usize> = (0..n).collect();
        let y = index
            .iter()
            .map(|&i| if i % every == 0 { 1.0 } else { 0.0 })
            .collect();
        (index, y)
    }

    #[test]
    fn test_split_is_stratified() {
        let (index, y) = labelled(100, 4); // 25 positives
        let mut sampler = Sampler::new(Some(7));
        let (train, test) = sampler.split(&index, &y, 0.2).unwrap();

        assert_eq!(train.len() + test.len(), 100);
        let test_pos = test.iter().filter(|&&i| y[i] == 1.0).count();
        let train_pos = train.iter().filter(|&&i| y[i] == 1.0).count();
        assert_eq!(test_pos, 5);
        assert_eq!(train_pos, 20);
        assert!(train.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_split_reproducible_with_seed() {
        let (index, y) = labelled(50, 3);
        let a = Sampler::new(Some(11)).split(&index, &y, 0.3).unwrap();
        let b = Sampler::new(Some(11)).split(&index, &y, 0.3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let (index, y) = labelled(10, 2);
        assert!(Sampler::new(None).split(&index, &y, 1.0).is_err());
        assert!(Sampler::new(None).split(&index, &y, 0.0).is_err());
    }

    #[test]
    fn test_undersample_keeps_all_positives() {
        let (index, y) = labelled(100, 10); // 10 positives, 90 negatives
        let kept = Sampler::new(Some(3)).undersample(&index, &y, 0.5).unwrap();

        let pos: Vec<usize> = kept.iter().copied().filter(|&i| y[i] == 1.0).collect();
        let neg = kept.len() - pos.len();
        assert_eq!(pos.len(), 10);
        assert_eq!(neg, 20);
        assert!(kept.iter().all(|i| index.contains(i)));
    }

    #[test]
    fn test_undersample_insufficient_negatives() {
        let (index, y) = labelled(20, 2); // 10 positives, 10 negatives
        let result = Sampler::new(Some(3)).undersample(&index, &y, 0.5);
        assert!(matches!(
            result,
            Err(BehavError::InsufficientData { requested: 20, available: 10 })
        ));
    }

    #[test]
    fn test_undersample_on_sub_index() {
        let index = vec![3, 8, 10, 15, 21, 40];
        let y = Array1::from(vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let kept = Sampler::new(Some(1)).undersample(&index, &y, 1.0).unwrap();
        assert_eq!(kept.len(), 4);
        assert!(kept.contains(&3) && kept.contains(&15));
        assert!(kept.iter().all(|i| index.contains(i)));
    }
}
