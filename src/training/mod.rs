//! Classifier contract and variants
//!
//! Every variant is a trainable probability estimator for one binary
//! behaviour:
//! - [`MlpClassifier`] - feed-forward network (`Mlp`, `MlpDeep` templates)
//! - [`RandomForestClassifier`] - bagged Gini trees (`RandomForest`)
//!
//! Variants are selected by a [`ClassifierType`] tag. Artifacts are JSON
//! envelopes carrying the tag, so [`load_classifier`] can dispatch to the
//! right deserializer.

pub mod decision_tree;
pub mod neural_network;
pub mod random_forest;

pub use decision_tree::{DecisionTree, TreeNode};
pub use neural_network::{Activation, MlpClassifier, MlpConfig};
pub use random_forest::{MaxFeatures, RandomForestClassifier, RandomForestConfig};

use crate::error::{BehavError, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Classifier variant tag, stored in the model config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierType {
    /// Single hidden layer network
    Mlp,
    /// Three hidden layer network
    MlpDeep,
    /// Bagged decision trees
    RandomForest,
}

impl Default for ClassifierType {
    fn default() -> Self {
        Self::Mlp
    }
}

impl ClassifierType {
    /// Every template, in training order
    pub fn all() -> [ClassifierType; 3] {
        [Self::Mlp, Self::MlpDeep, Self::RandomForest]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mlp => "Mlp",
            Self::MlpDeep => "MlpDeep",
            Self::RandomForest => "RandomForest",
        }
    }

    /// Fresh, unfitted classifier for this template
    pub fn build(&self, seed: Option<u64>) -> Box<dyn Classifier> {
        match self {
            Self::Mlp => Box::new(MlpClassifier::new(
                *self,
                MlpConfig {
                    hidden_layers: vec![64],
                    random_state: seed,
                    ..Default::default()
                },
            )),
            Self::MlpDeep => Box::new(MlpClassifier::new(
                *self,
                MlpConfig {
                    hidden_layers: vec![128, 64, 32],
                    random_state: seed,
                    ..Default::default()
                },
            )),
            Self::RandomForest => Box::new(RandomForestClassifier::new(RandomForestConfig {
                random_state: seed,
                ..Default::default()
            })),
        }
    }
}

impl fmt::Display for ClassifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassifierType {
    type Err = BehavError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                BehavError::invalid_parameter("clf_struct", s, "unknown classifier type")
            })
    }
}

/// Metrics recorded after one training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Per-epoch training metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn push(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

/// A trainable binary probability estimator
pub trait Classifier: fmt::Debug + Send + Sync {
    fn clf_type(&self) -> ClassifierType;

    /// Train on rows `index` of `x`/`y`, holding out the last `val_split`
    /// fraction of the shuffled rows for monitoring
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        index: &[usize],
        batch_size: usize,
        epochs: usize,
        val_split: f64,
    ) -> Result<TrainingHistory>;

    /// Behaviour probability for rows `index` of `x`
    fn predict(&self, x: &Array2<f64>, index: &[usize], batch_size: usize) -> Result<Array1<f64>>;

    fn is_fitted(&self) -> bool;

    /// Threshold used when the configured pcutoff defers to the model
    fn default_pcutoff(&self) -> f64;

    /// Persist the full trainable state
    fn save(&self, path: &Path) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct ArtifactEnvelope<T> {
    clf_type: ClassifierType,
    saved_at: DateTime<Utc>,
    model: T,
}

pub(crate) fn save_artifact<T: Serialize>(clf_type: ClassifierType, model: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let envelope = ArtifactEnvelope {
        clf_type,
        saved_at: Utc::now(),
        model,
    };
    fs::write(path, serde_json::to_string(&envelope)?)?;
    Ok(())
}

/// Load a classifier artifact; `None` when nothing has been saved yet
pub fn load_classifier(path: &Path) -> Result<Option<Box<dyn Classifier>>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    #[derive(Deserialize)]
    struct Header {
        clf_type: ClassifierType,
    }
    let header: Header = serde_json::from_str(&content)?;

    let clf: Box<dyn Classifier> = match header.clf_type {
        ClassifierType::Mlp | ClassifierType::MlpDeep => Box::new(parse_model::<MlpClassifier>(&content)?),
        ClassifierType::RandomForest => Box::new(parse_model::<RandomForestClassifier>(&content)?),
    };
    Ok(Some(clf))
}

fn parse_model<T: DeserializeOwned>(content: &str) -> Result<T> {
    let envelope: ArtifactEnvelope<T> = serde_json::from_str(content)?;
    Ok(envelope.model)
}

/// Check `fit`/`predict` inputs against each other
pub(crate) fn check_inputs(x: &Array2<f64>, y: Option<&Array1<f64>>, index: &[usize]) -> Result<()> {
    if let Some(y) = y {
        if y.len() != x.nrows() {
            return Err(BehavError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
    }
    if index.is_empty() {
        return Err(BehavError::DataError("empty row index".to_string()));
    }
    if let Some(&bad) = index.iter().find(|&&i| i >= x.nrows()) {
        return Err(BehavError::ShapeError {
            expected: format!("row index < {}", x.nrows()),
            actual: format!("row index {}", bad),
        });
    }
    Ok(())
}

pub(crate) fn check_fit_params(batch_size: usize, epochs: usize, val_split: f64) -> Result<()> {
    if batch_size == 0 {
        return Err(BehavError::invalid_parameter("batch_size", batch_size, "must be positive"));
    }
    if epochs == 0 {
        return Err(BehavError::invalid_parameter("epochs", epochs, "must be positive"));
    }
    if !(0.0..1.0).contains(&val_split) {
        return Err(BehavError::invalid_parameter("val_split", val_split, "must be within [0, 1)"));
    }
    Ok(())
}

/// Shuffle `index` and split off the trailing `val_split` fraction
pub(crate) fn holdout<R: Rng>(index: &[usize], val_split: f64, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut shuffled = index.to_vec();
    shuffled.shuffle(rng);
    let n_val = ((shuffled.len() as f64) * val_split) as usize;
    let n_val = n_val.min(shuffled.len().saturating_sub(1));
    let val = shuffled.split_off(shuffled.len() - n_val);
    (shuffled, val)
}

/// Mean binary cross-entropy
pub(crate) fn log_loss(y: &Array1<f64>, p: &Array1<f64>) -> f64 {
    const EPS: f64 = 1e-15;
    let n = y.len().max(1) as f64;
    y.iter()
        .zip(p.iter())
        .map(|(&t, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum::<f64>()
        / n
}

/// Accuracy at a 0.5 decision threshold
pub(crate) fn accuracy(y: &Array1<f64>, p: &Array1<f64>) -> f64 {
    let n = y.len().max(1) as f64;
    let correct = y
        .iter()
        .zip(p.iter())
        .filter(|(&t, &p)| (p > 0.5) == (t > 0.5))
        .count();
    correct as f64 / n
}

pub(crate) fn gather(y: &Array1<f64>, index: &[usize]) -> Array1<f64> {
    y.select(Axis(0), index)
}

#[cfg(test)]
pub(crate) mod test_data {
    use ndarray::{Array1, Array2};

    /// Two noisy-free blobs: label 1 where f0 + f1 > 1
    pub fn separable(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            let t = i as f64 / n as f64;
            if j == 0 { t } else { ((i * 7) % n) as f64 / n as f64 }
        });
        let y = x
            .rows()
            .into_iter()
            .map(|r| if r[0] + r[1] > 1.0 { 1.0 } else { 0.0 })
            .collect();
        (x, y)
    }
}
