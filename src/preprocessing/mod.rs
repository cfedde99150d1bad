//! Feature preprocessing
//!
//! A [`Preprocessor`] selects the derived feature columns (everything after a
//! fixed prefix of raw positional columns) and min-max scales them. Fitting
//! produces a [`FittedPreprocessor`] that is persisted next to the classifier
//! it was fitted for and reused unchanged at inference.

mod scaler;

pub use scaler::MinMaxScaler;

use crate::constants::RAW_COLUMN_PREFIX;
use crate::error::{BehavError, Result};
use crate::table::FeatureTable;
use chrono::{DateTime, Utc};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Unfitted preprocessing settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Leading raw columns excluded from the model input
    pub skip_columns: usize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            skip_columns: RAW_COLUMN_PREFIX,
        }
    }
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_columns(mut self, skip_columns: usize) -> Self {
        self.skip_columns = skip_columns;
        self
    }

    /// Fit column selection and scaling on the given features
    pub fn fit(&self, x: &FeatureTable) -> Result<FittedPreprocessor> {
        if x.ncols() <= self.skip_columns {
            return Err(BehavError::ShapeError {
                expected: format!("more than {} feature columns", self.skip_columns),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let selected = x.values().slice(s![.., self.skip_columns..]).to_owned();
        let scaler = MinMaxScaler::fit(&selected)?;

        tracing::debug!(
            skipped = self.skip_columns,
            selected = scaler.n_features(),
            rows = x.nrows(),
            "Fitted preprocessor"
        );

        Ok(FittedPreprocessor {
            skip_columns: self.skip_columns,
            feature_names: x.columns()[self.skip_columns..].to_vec(),
            scaler,
            fitted_at: Utc::now(),
        })
    }
}

/// Persisted preprocessing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    skip_columns: usize,
    feature_names: Vec<String>,
    scaler: MinMaxScaler,
    fitted_at: DateTime<Utc>,
}

impl FittedPreprocessor {
    /// Names of the columns fed to the classifier
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features_in(&self) -> usize {
        self.skip_columns + self.feature_names.len()
    }

    /// Apply the fitted selection and scaling. No clipping: values beyond the
    /// fitted range map outside [0, 1].
    pub fn transform(&self, x: &FeatureTable) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features_in() {
            return Err(BehavError::ShapeError {
                expected: format!("{} feature columns", self.n_features_in()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let names = &x.columns()[self.skip_columns..];
        if names != self.feature_names.as_slice() {
            return Err(BehavError::DataError(
                "feature columns differ from those the preprocessor was fitted on".to_string(),
            ));
        }

        let selected = x.values().slice(s![.., self.skip_columns..]).to_owned();
        self.scaler.transform(&selected)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Load persisted state; a missing file means nothing was fitted yet
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BehavError::NotFitted(format!(
                "no fitted preprocessor at {}",
                path.display()
            )),
            _ => BehavError::IoError(e),
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RowKey;
    use ndarray::array;
    use tempfile::TempDir;

    fn table() -> FeatureTable {
        let keys = (0..3).map(|i| RowKey::new("exp1", i)).collect();
        FeatureTable::new(
            keys,
            vec!["x".into(), "y".into(), "speed".into(), "dist".into()],
            array![
                [100.0, 50.0, 2.0, 10.0],
                [120.0, 55.0, 4.0, 30.0],
                [110.0, 52.0, 6.0, 20.0]
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_transform_selects_and_scales() {
        let x = table();
        let fitted = Preprocessor::new().with_skip_columns(2).fit(&x).unwrap();
        assert_eq!(fitted.feature_names(), &["speed".to_string(), "dist".to_string()]);

        let t = fitted.transform(&x).unwrap();
        assert_eq!(t.ncols(), 2);
        assert_eq!(t.column(0).to_vec(), vec![0.0, 0.5, 1.0]);
        assert_eq!(t.column(1).to_vec(), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_fit_requires_columns_after_prefix() {
        let x = table();
        let result = Preprocessor::new().with_skip_columns(4).fit(&x);
        assert!(matches!(result, Err(BehavError::ShapeError { .. })));
    }

    #[test]
    fn test_load_missing_is_not_fitted() {
        let dir = TempDir::new().unwrap();
        let result = FittedPreprocessor::load(&dir.path().join("preproc.json"));
        assert!(matches!(result, Err(BehavError::NotFitted(_))));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model").join("preproc.json");

        let x = table();
        let fitted = Preprocessor::new().with_skip_columns(2).fit(&x).unwrap();
        fitted.save(&path).unwrap();

        let loaded = FittedPreprocessor::load(&path).unwrap();
        assert_eq!(loaded.transform(&x).unwrap(), fitted.transform(&x).unwrap());
    }
}
