//! Random forest behaviour classifier

use super::decision_tree::DecisionTree;
use super::{
    accuracy, check_fit_params, check_inputs, gather, holdout, log_loss, save_artifact, Classifier,
    ClassifierType, EpochMetrics, TrainingHistory,
};
use crate::error::{BehavError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Strategy for max features
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::All => n_features,
        }
        .clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    /// Default decision threshold
    pub pcutoff: f64,
    pub random_state: Option<u64>,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            max_depth: Some(12),
            min_samples_leaf: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            pcutoff: 0.5,
            random_state: Some(42),
        }
    }
}

/// Bagged decision trees; probability is the mean leaf positive fraction.
///
/// Trees are grown in a single pass, so `fit` ignores `batch_size` and
/// `epochs` and reports one history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    config: RandomForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn probabilities(&self, x: &Array2<f64>, rows: &[usize]) -> Array1<f64> {
        let n_trees = self.trees.len().max(1) as f64;
        rows.iter()
            .map(|&i| {
                let row = x.row(i);
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees
            })
            .collect()
    }
}

impl Classifier for RandomForestClassifier {
    fn clf_type(&self) -> ClassifierType {
        ClassifierType::RandomForest
    }

    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        index: &[usize],
        batch_size: usize,
        epochs: usize,
        val_split: f64,
    ) -> Result<TrainingHistory> {
        check_inputs(x, Some(y), index)?;
        check_fit_params(batch_size, epochs, val_split)?;
        if self.config.n_estimators == 0 {
            return Err(BehavError::invalid_parameter("n_estimators", 0, "must be positive"));
        }

        self.n_features = x.ncols();
        let max_features = self.config.max_features.resolve(self.n_features);

        let base_seed = match self.config.random_state {
            Some(seed) => seed,
            None => rand::thread_rng().next_u64(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
        let (train_idx, val_idx) = holdout(index, val_split, &mut rng);

        self.trees = (0..self.config.n_estimators)
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64 + 1));

                let rows: Vec<usize> = if self.config.bootstrap {
                    (0..train_idx.len())
                        .map(|_| train_idx[rng.gen_range(0..train_idx.len())])
                        .collect()
                } else {
                    train_idx.clone()
                };

                let mut tree = DecisionTree::new()
                    .with_max_depth(self.config.max_depth)
                    .with_min_samples_leaf(self.config.min_samples_leaf)
                    .with_max_features(max_features);
                tree.fit(x, y, &rows, &mut rng);
                tree
            })
            .collect();

        let p_train = self.probabilities(x, &train_idx);
        let y_train = gather(y, &train_idx);
        let (val_loss, val_accuracy) = if val_idx.is_empty() {
            (None, None)
        } else {
            let p_val = self.probabilities(x, &val_idx);
            let y_val = gather(y, &val_idx);
            (Some(log_loss(&y_val, &p_val)), Some(accuracy(&y_val, &p_val)))
        };

        let mut history = TrainingHistory::default();
        history.push(EpochMetrics {
            epoch: 0,
            loss: log_loss(&y_train, &p_train),
            accuracy: accuracy(&y_train, &p_train),
            val_loss,
            val_accuracy,
        });

        tracing::debug!(trees = self.trees.len(), max_features, "Grew random forest");
        Ok(history)
    }

    fn predict(&self, x: &Array2<f64>, index: &[usize], _batch_size: usize) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(BehavError::NotFitted("RandomForest classifier".to_string()));
        }
        check_inputs(x, None, index)?;
        if x.ncols() != self.n_features {
            return Err(BehavError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(self.probabilities(x, index))
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn default_pcutoff(&self) -> f64 {
        self.config.pcutoff
    }

    fn save(&self, path: &Path) -> Result<()> {
        save_artifact(ClassifierType::RandomForest, self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::test_data::separable;

    #[test]
    fn test_forest_learns_separable_data() {
        let (x, y) = separable(200);
        let index: Vec<usize> = (0..200).collect();

        let mut rf = RandomForestClassifier::new(RandomForestConfig {
            n_estimators: 20,
            ..Default::default()
        });
        let history = rf.fit(&x, &y, &index, 32, 1, 0.25).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.epochs[0].val_accuracy.unwrap() > 0.8);
        assert_eq!(rf.n_trees(), 20);

        let p = rf.predict(&x, &index, 32).unwrap();
        assert!(p.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(accuracy(&y, &p) > 0.9);
    }

    #[test]
    fn test_seeded_forest_is_reproducible() {
        let (x, y) = separable(80);
        let index: Vec<usize> = (0..80).collect();

        let fit = || {
            let mut rf = RandomForestClassifier::new(RandomForestConfig {
                n_estimators: 5,
                random_state: Some(9),
                ..Default::default()
            });
            rf.fit(&x, &y, &index, 1, 1, 0.0).unwrap();
            rf.predict(&x, &index, 1).unwrap()
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = separable(10);
        let rf = RandomForestClassifier::new(RandomForestConfig::default());
        assert!(matches!(rf.predict(&x, &[0], 1), Err(BehavError::NotFitted(_))));
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(16), 4);
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(10), 5);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
    }
}
