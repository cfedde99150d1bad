//! Behaviour model lifecycle: config, artifacts, training and inference

mod batch;
mod behavior_model;
mod config;
mod paths;

pub use batch::{classify_behaviours, train_behaviours, BatchOutcome};
pub use behavior_model::{BehaviorModel, TrainingResult};
pub use config::{ClassifyConfig, ModelConfig, ModelLocation, ModelRef};
pub use paths::ModelPaths;
