//! Behaviour classification pipeline
//!
//! Trains and runs per-frame binary classifiers for scored animal behaviours
//! (grooming, rearing, ...) from numeric feature tables, and evaluates them
//! with frame-level and bout-level metrics.
//!
//! # Modules
//!
//! ## Data
//! - [`table`] - Keyed feature/label/prediction tables, alignment, Parquet storage
//! - [`labels`] - Label wrangling and value normalization
//! - [`preprocessing`] - Persisted column selection and min-max scaling
//! - [`sampling`] - Stratified split and class-balanced undersampling
//!
//! ## Models
//! - [`training`] - Classifier contract and variants (MLP, random forest)
//! - [`postprocessing`] - pcutoff decisions and bout gap filling
//! - [`evaluation`] - Reports, confusion matrices, threshold sweeps, bout accuracy
//! - [`model`] - Per-behaviour orchestration and batch runs
//!
//! ## Interfaces
//! - [`cli`] - Command-line interface

// Core error handling
pub mod constants;
pub mod error;

// Data
pub mod labels;
pub mod preprocessing;
pub mod sampling;
pub mod table;

// Models
pub mod evaluation;
pub mod model;
pub mod postprocessing;
pub mod training;

// Interfaces
pub mod cli;

pub use error::{BehavError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{BehavError, Result};

    // Tables
    pub use crate::table::{align, ColumnGroup, FeatureTable, KeyedTable, LabelTable, PredictionTable, RowKey};

    // Preprocessing and sampling
    pub use crate::preprocessing::{FittedPreprocessor, Preprocessor};
    pub use crate::sampling::Sampler;

    // Training
    pub use crate::training::{load_classifier, Classifier, ClassifierType, TrainingHistory};

    // Postprocessing and evaluation
    pub use crate::evaluation::{bout_accuracy, classification_report, confusion_matrix, threshold_sweep, EvaluationBundle};
    pub use crate::postprocessing::{decide, merge_short_gaps, resolve_pcutoff};

    // Orchestration
    pub use crate::model::{BehaviorModel, ClassifyConfig, ModelConfig, ModelRef, TrainingResult};
}
