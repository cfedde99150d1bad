//! Persisted model and classification configuration

use crate::constants::{FEATURES_DIR, PCUTOFF_DEFER, RAW_COLUMN_PREFIX, SCORED_BEHAVS_DIR};
use crate::error::{BehavError, Result};
use crate::training::ClassifierType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of one (project, behaviour) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Project root the training tables are read from
    pub proj_dir: PathBuf,
    pub behav_name: String,
    /// Active classifier variant
    pub clf_struct: ClassifierType,
    /// Decision threshold in [0, 1], or -1 to use the classifier default
    pub pcutoff: f64,
    /// Target positive:negative proportion after undersampling
    pub undersample_ratio: f64,
    pub test_split: f64,
    pub val_split: f64,
    pub batch_size: usize,
    pub epochs: usize,
    /// Seed for splitting, undersampling and classifier initialisation.
    /// Runs without one are not reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Undetermined (-1) labels count as non-behaviour in training and metrics
    #[serde(default = "default_true")]
    pub undetermined_as_negative: bool,
    /// Leading raw columns skipped by the preprocessor
    #[serde(default = "default_raw_column_prefix")]
    pub raw_column_prefix: usize,
}

fn default_true() -> bool {
    true
}

fn default_raw_column_prefix() -> usize {
    RAW_COLUMN_PREFIX
}

impl ModelConfig {
    pub fn new(proj_dir: impl Into<PathBuf>, behav_name: impl Into<String>) -> Self {
        Self {
            proj_dir: proj_dir.into(),
            behav_name: behav_name.into(),
            clf_struct: ClassifierType::default(),
            pcutoff: PCUTOFF_DEFER,
            undersample_ratio: 0.1,
            test_split: 0.2,
            val_split: 0.2,
            batch_size: 256,
            epochs: 50,
            seed: None,
            undetermined_as_negative: true,
            raw_column_prefix: RAW_COLUMN_PREFIX,
        }
    }

    pub fn with_classifier(mut self, clf_struct: ClassifierType) -> Self {
        self.clf_struct = clf_struct;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Directory of per-experiment feature tables
    pub fn features_dir(&self) -> PathBuf {
        self.proj_dir.join(FEATURES_DIR)
    }

    /// Directory of per-experiment scored label tables
    pub fn labels_dir(&self) -> PathBuf {
        self.proj_dir.join(SCORED_BEHAVS_DIR)
    }

    /// Read a config; `None` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| BehavError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Ok(Some(config))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.behav_name.is_empty() {
            return Err(BehavError::ConfigError("behav_name is empty".to_string()));
        }
        if self.pcutoff != PCUTOFF_DEFER && !(0.0..=1.0).contains(&self.pcutoff) {
            return Err(BehavError::InvalidThreshold { value: self.pcutoff });
        }
        if !(self.undersample_ratio > 0.0 && self.undersample_ratio.is_finite()) {
            return Err(BehavError::invalid_parameter(
                "undersample_ratio",
                self.undersample_ratio,
                "must be a positive number",
            ));
        }
        if !(self.test_split > 0.0 && self.test_split < 1.0) {
            return Err(BehavError::invalid_parameter("test_split", self.test_split, "must be within (0, 1)"));
        }
        if !(0.0..1.0).contains(&self.val_split) {
            return Err(BehavError::invalid_parameter("val_split", self.val_split, "must be within [0, 1)"));
        }
        if self.batch_size == 0 {
            return Err(BehavError::invalid_parameter("batch_size", 0, "must be positive"));
        }
        if self.epochs == 0 {
            return Err(BehavError::invalid_parameter("epochs", 0, "must be positive"));
        }
        Ok(())
    }
}

/// Where a model lives: its directory, or a (project, behaviour) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelLocation {
    Dir { model_dir: PathBuf },
    Project { proj_dir: PathBuf, behaviour: String },
}

/// One model to run during classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    #[serde(flatten)]
    pub location: ModelLocation,
    /// Overrides the model's pcutoff; -1 keeps the model's own
    #[serde(default = "default_pcutoff")]
    pub pcutoff: f64,
    /// Negative runs shorter than this are filled
    #[serde(default)]
    pub min_window_frames: usize,
    /// User-defined sub-behaviour columns, added zero-filled
    #[serde(default)]
    pub user_behavs: Vec<String>,
}

fn default_pcutoff() -> f64 {
    PCUTOFF_DEFER
}

impl ModelRef {
    pub fn new(location: ModelLocation) -> Self {
        Self {
            location,
            pcutoff: PCUTOFF_DEFER,
            min_window_frames: 0,
            user_behavs: Vec::new(),
        }
    }
}

/// Models applied to an experiment's features
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    pub models: Vec<ModelRef>,
}

impl ClassifyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BehavError::NotFound { path: path.to_path_buf() },
            _ => BehavError::IoError(e),
        })?;
        serde_json::from_str(&content).map_err(|e| BehavError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configs.json");
        assert!(ModelConfig::load(&path).unwrap().is_none());

        let config = ModelConfig::new(dir.path(), "groom")
            .with_classifier(ClassifierType::RandomForest)
            .with_seed(3);
        config.save(&path).unwrap();

        let loaded = ModelConfig::load(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.features_dir(), dir.path().join(FEATURES_DIR));
    }

    #[test]
    fn test_config_defaults_for_missing_fields() {
        let json = r#"{
            "proj_dir": "/proj", "behav_name": "rear", "clf_struct": "MlpDeep",
            "pcutoff": 0.4, "undersample_ratio": 0.5, "test_split": 0.3,
            "val_split": 0.1, "batch_size": 32, "epochs": 5
        }"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.clf_struct, ClassifierType::MlpDeep);
        assert_eq!(config.seed, None);
        assert!(config.undetermined_as_negative);
        assert_eq!(config.raw_column_prefix, RAW_COLUMN_PREFIX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = ModelConfig::new("/proj", "groom");
        assert!(base.validate().is_ok());

        let mut c = base.clone();
        c.pcutoff = 1.5;
        assert!(matches!(c.validate(), Err(BehavError::InvalidThreshold { .. })));

        let mut c = base.clone();
        c.undersample_ratio = 0.0;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.test_split = 1.0;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.val_split = 1.0;
        assert!(c.validate().is_err());

        let mut c = base;
        c.epochs = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_classify_config_parses_both_locations() {
        let json = r#"{"models": [
            {"model_dir": "/proj/behav_models/groom", "pcutoff": 0.7, "min_window_frames": 5},
            {"proj_dir": "/proj", "behaviour": "rear", "user_behavs": ["left", "right"]}
        ]}"#;
        let config: ClassifyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.models.len(), 2);
        assert_eq!(
            config.models[0].location,
            ModelLocation::Dir { model_dir: PathBuf::from("/proj/behav_models/groom") }
        );
        assert_eq!(config.models[0].min_window_frames, 5);
        assert_eq!(config.models[1].pcutoff, PCUTOFF_DEFER);
        assert_eq!(config.models[1].user_behavs, vec!["left", "right"]);
    }

    #[test]
    fn test_classify_config_missing() {
        let dir = TempDir::new().unwrap();
        let err = ClassifyConfig::load(&dir.path().join("none.json")).unwrap_err();
        assert!(err.is_not_found());
    }
}
