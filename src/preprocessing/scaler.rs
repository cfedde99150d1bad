//! Min-max feature scaling

use crate::error::{BehavError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted min-max scaler: (x - min) / (max - min)
///
/// Constant columns get a scale of 1 so they map to 0. Values outside the
/// fitted range are not clipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Array1<f64>,
    scales: Array1<f64>,
}

impl MinMaxScaler {
    /// Fit per-column min and range, ignoring NaN
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(BehavError::DataError("cannot fit scaler on zero rows".to_string()));
        }

        let mut mins = Array1::zeros(x.ncols());
        let mut scales = Array1::ones(x.ncols());

        for (j, col) in x.axis_iter(Axis(1)).enumerate() {
            let (min, max) = col
                .iter()
                .filter(|v| !v.is_nan())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

            if min.is_finite() {
                mins[j] = min;
                let range = max - min;
                scales[j] = if range == 0.0 { 1.0 } else { range };
            }
        }

        Ok(Self { mins, scales })
    }

    pub fn n_features(&self) -> usize {
        self.mins.len()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(BehavError::ShapeError {
                expected: format!("{} columns", self.n_features()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok((x - &self.mins) / &self.scales)
    }
}
