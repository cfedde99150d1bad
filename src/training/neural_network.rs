//! Neural network (multi-layer perceptron) behaviour classifier
//!
//! A feedforward network with a single sigmoid output unit, trained with
//! binary cross-entropy by mini-batch gradient descent with momentum.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    accuracy, check_fit_params, check_inputs, gather, holdout, log_loss, save_artifact, Classifier,
    ClassifierType, EpochMetrics, TrainingHistory,
};
use crate::error::{BehavError, Result};

/// Activation function for hidden layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    /// Rectified Linear Unit
    ReLU,
    /// Sigmoid
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Self::ReLU
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
    /// Activation function for hidden layers
    pub activation: Activation,
    /// Learning rate
    pub learning_rate: f64,
    /// Momentum
    pub momentum: f64,
    /// L2 regularization
    pub alpha: f64,
    /// Default decision threshold
    pub pcutoff: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![64],
            activation: Activation::ReLU,
            learning_rate: 0.01,
            momentum: 0.9,
            alpha: 0.0001,
            pcutoff: 0.5,
            random_state: Some(42),
        }
    }
}

/// Multi-layer perceptron producing a behaviour probability per row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    clf_type: ClassifierType,
    config: MlpConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    is_fitted: bool,
}

impl MlpClassifier {
    pub fn new(clf_type: ClassifierType, config: MlpConfig) -> Self {
        Self {
            clf_type,
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    fn rng(&self) -> Xoshiro256PlusPlus {
        match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        }
    }

    fn initialize_weights<R: Rng>(&mut self, rng: &mut R) {
        self.weights.clear();
        self.biases.clear();

        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(1);

        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);

            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let w = Array2::from_shape_fn((n_in, n_out), |_| rng.gen::<f64>() * 2.0 * scale - scale);

            self.weights.push(w);
            self.biases.push(Array1::zeros(n_out));
        }
    }

    /// Layer activations (input first, output last) and pre-activations
    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let n_layers = self.weights.len();
        let mut activations = vec![x.clone()];
        let mut z_values = Vec::with_capacity(n_layers);

        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = activations[i].dot(w) + b;
            let a = if i + 1 < n_layers {
                activate(&z, self.config.activation)
            } else {
                activate(&z, Activation::Sigmoid)
            };
            z_values.push(z);
            activations.push(a);
        }

        (activations, z_values)
    }

    fn backward(
        &self,
        y: &Array1<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y.len() as f64;
        let mut gradients = Vec::with_capacity(self.weights.len());

        // Cross-entropy gradient with sigmoid output
        let y_2d = y.clone().insert_axis(Axis(1));
        let mut delta = (&activations[activations.len() - 1] - &y_2d) / n;

        for i in (0..self.weights.len()).rev() {
            let a_prev = &activations[i];
            gradients.push((a_prev.t().dot(&delta), delta.sum_axis(Axis(0))));

            if i > 0 {
                delta = delta.dot(&self.weights[i].t()) * activate_derivative(&z_values[i - 1], self.config.activation);
            }
        }

        gradients.reverse();
        gradients
    }

    fn probabilities(&self, x: &Array2<f64>) -> Array1<f64> {
        let (activations, _) = self.forward(x);
        activations[activations.len() - 1].column(0).to_owned()
    }

    fn evaluate(&self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> (f64, f64) {
        let p = self.probabilities(&x.select(Axis(0), rows));
        let t = gather(y, rows);
        (log_loss(&t, &p), accuracy(&t, &p))
    }
}

impl Classifier for MlpClassifier {
    fn clf_type(&self) -> ClassifierType {
        self.clf_type
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

        self.n_features = x.ncols();
        let mut rng = self.rng();
        self.initialize_weights(&mut rng);

        let (train_idx, val_idx) = holdout(index, val_split, &mut rng);

        let mut velocities_w: Vec<Array2<f64>> = self.weights.iter().map(|w| Array2::zeros(w.raw_dim())).collect();
        let mut velocities_b: Vec<Array1<f64>> = self.biases.iter().map(|b| Array1::zeros(b.len())).collect();

        let mut history = TrainingHistory::default();
        let mut order = train_idx.clone();

        for epoch in 0..epochs {
            order.shuffle(&mut rng);

            for batch in order.chunks(batch_size) {
                let x_batch = x.select(Axis(0), batch);
                let y_batch = gather(y, batch);

                let (activations, z_values) = self.forward(&x_batch);
                let gradients = self.backward(&y_batch, &activations, &z_values);

                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    velocities_w[i] = &velocities_w[i] * self.config.momentum - &grad_w * self.config.learning_rate;
                    velocities_b[i] = &velocities_b[i] * self.config.momentum - &grad_b * self.config.learning_rate;

                    self.weights[i] = &self.weights[i] + &velocities_w[i];
                    self.biases[i] = &self.biases[i] + &velocities_b[i];

                    // L2 regularization
                    self.weights[i] *= 1.0 - self.config.alpha * self.config.learning_rate;
                }
            }

            let (loss, acc) = self.evaluate(x, y, &train_idx);
            let (val_loss, val_accuracy) = if val_idx.is_empty() {
                (None, None)
            } else {
                let (l, a) = self.evaluate(x, y, &val_idx);
                (Some(l), Some(a))
            };

            tracing::debug!(epoch, loss, accuracy = acc, ?val_loss, "Finished epoch");
            history.push(EpochMetrics {
                epoch,
                loss,
                accuracy: acc,
                val_loss,
                val_accuracy,
            });
        }

        self.is_fitted = true;
        Ok(history)
    }

    fn predict(&self, x: &Array2<f64>, index: &[usize], batch_size: usize) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(BehavError::NotFitted(format!("{} classifier", self.clf_type)));
        }
        check_inputs(x, None, index)?;
        if x.ncols() != self.n_features {
            return Err(BehavError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let mut out = Vec::with_capacity(index.len());
        for batch in index.chunks(batch_size.max(1)) {
            out.extend(self.probabilities(&x.select(Axis(0), batch)));
        }
        Ok(Array1::from(out))
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn default_pcutoff(&self) -> f64 {
        self.config.pcutoff
    }

    fn save(&self, path: &Path) -> Result<()> {
        save_artifact(self.clf_type, self, path)
    }
}

fn activate(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| v.max(0.0)),
        Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Tanh => z.mapv(|v| v.tanh()),
    }
}

fn activate_derivative(z: &Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
        Activation::Sigmoid => {
            let sig = activate(z, Activation::Sigmoid);
            &sig * &(1.0 - &sig)
        }
        Activation::Tanh => {
            let t = z.mapv(|v| v.tanh());
            1.0 - &t * &t
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::test_data::separable;

    #[test]
    fn test_mlp_learns_separable_data() {
        let (x, y) = separable(200);
        let index: Vec<usize> = (0..200).collect();

        let mut mlp = MlpClassifier::new(
            ClassifierType::Mlp,
            MlpConfig {
                hidden_layers: vec![16],
                learning_rate: 0.1,
                ..Default::default()
            },
        );
        let history = mlp.fit(&x, &y, &index, 16, 60, 0.2).unwrap();
        assert_eq!(history.len(), 60);
        assert!(history.last().unwrap().val_loss.is_some());

        let first = &history.epochs[0];
        let last = history.last().unwrap();
        assert!(last.loss < first.loss, "loss should fall: {} -> {}", first.loss, last.loss);

        let p = mlp.predict(&x, &index, 32).unwrap();
        assert!(accuracy(&y, &p) > 0.8, "accuracy {}", accuracy(&y, &p));
    }

    #[test]
    fn test_predict_is_probability_per_indexed_row() {
        let (x, y) = separable(50);
        let index: Vec<usize> = (0..50).collect();
        let mut mlp = MlpClassifier::new(ClassifierType::Mlp, MlpConfig::default());
        mlp.fit(&x, &y, &index, 8, 2, 0.0).unwrap();

        let p = mlp.predict(&x, &[3, 7, 9], 2).unwrap();
        assert_eq!(p.len(), 3);
        assert!(p.iter().all(|&v| (0.0..=1.0).contains(&v)));

        // pure: repeated calls agree
        assert_eq!(p, mlp.predict(&x, &[3, 7, 9], 2).unwrap());
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = separable(10);
        let mlp = MlpClassifier::new(ClassifierType::Mlp, MlpConfig::default());
        assert!(matches!(mlp.predict(&x, &[0], 4), Err(BehavError::NotFitted(_))));
    }

    #[test]
    fn test_activation_functions() {
        let z = Array2::from_shape_vec((2, 3), vec![-1.0, 0.0, 1.0, -2.0, 0.5, 2.0]).unwrap();

        let relu = activate(&z, Activation::ReLU);
        assert_eq!(relu[[0, 0]], 0.0);
        assert_eq!(relu[[0, 2]], 1.0);

        let sigmoid = activate(&z, Activation::Sigmoid);
        assert!((sigmoid[[0, 1]] - 0.5).abs() < 0.001);
    }
}
