//! Model directory layout
//!
//! ```text
//! <proj_dir>/behav_models/<behaviour>/
//!     configs.json
//!     classifiers/<clf_type>/
//!         classifier.json
//!         preproc.json
//!         evaluation/
//! ```

use crate::constants::{CLASSIFIERS_DIR, CLASSIFIER_FILE, CONFIGS_FILE, EVALUATION_DIR, MODELS_DIR, PREPROC_FILE};
use crate::training::ClassifierType;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    model_dir: PathBuf,
}

impl ModelPaths {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn for_behaviour(proj_dir: &Path, behaviour: &str) -> Self {
        Self::new(proj_dir.join(MODELS_DIR).join(behaviour))
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn configs(&self) -> PathBuf {
        self.model_dir.join(CONFIGS_FILE)
    }

    pub fn clfs_dir(&self) -> PathBuf {
        self.model_dir.join(CLASSIFIERS_DIR)
    }

    pub fn clf_dir(&self, clf_type: ClassifierType) -> PathBuf {
        self.clfs_dir().join(clf_type.name())
    }

    pub fn classifier(&self, clf_type: ClassifierType) -> PathBuf {
        self.clf_dir(clf_type).join(CLASSIFIER_FILE)
    }

    pub fn preproc(&self, clf_type: ClassifierType) -> PathBuf {
        self.clf_dir(clf_type).join(PREPROC_FILE)
    }

    pub fn eval_dir(&self, clf_type: ClassifierType) -> PathBuf {
        self.clf_dir(clf_type).join(EVALUATION_DIR)
    }
}
