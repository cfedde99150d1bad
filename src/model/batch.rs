//! Multi-behaviour runs
//!
//! Behaviours are independent, so a failure in one is logged and skipped
//! rather than aborting the batch.

use super::behavior_model::{BehaviorModel, TrainingResult};
use super::config::{ClassifyConfig, ModelLocation, ModelRef};
use crate::error::{BehavError, Result};
use crate::postprocessing::{decide, merge_short_gaps, resolve_pcutoff};
use crate::table::io::{read_feature_table, write_prediction_table};
use crate::table::{ColumnGroup, FeatureTable, PredictionTable};
use ndarray::Array1;
use rayon::prelude::*;
use std::path::Path;
use tracing::{error, info, warn};

/// Per-behaviour results of a batch training run
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub trained: Vec<(String, TrainingResult)>,
    pub failed: Vec<(String, BehavError)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Train the active classifier of every behaviour scored in the project,
/// one behaviour per rayon worker
pub fn train_behaviours(proj_dir: &Path) -> Result<BatchOutcome> {
    let behaviours = BehaviorModel::project_behaviours(proj_dir)?;
    info!(behaviours = behaviours.len(), "Training behaviour models");

    // opening a model validates its config, so that runs per worker too
    let results: Vec<(String, Result<TrainingResult>)> = behaviours
        .into_par_iter()
        .map(|behaviour| {
            let result = BehaviorModel::new(proj_dir, &behaviour).and_then(|mut model| model.train());
            (behaviour, result)
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for (behaviour, result) in results {
        match result {
            Ok(trained) => outcome.trained.push((behaviour, trained)),
            Err(e) => {
                error!(behaviour = %behaviour, error = %e, "Training failed, skipping behaviour");
                outcome.failed.push((behaviour, e));
            }
        }
    }
    Ok(outcome)
}

/// Classify one experiment's features with every configured model and write
/// the combined prediction table. Returns a description of the outcome.
pub fn classify_behaviours(
    features_path: &Path,
    out_path: &Path,
    config: &ClassifyConfig,
    overwrite: bool,
) -> Result<String> {
    if !overwrite && out_path.exists() {
        warn!(path = %out_path.display(), "Output exists, not overwriting");
        return Ok(format!(
            "Output file, {}, already exists - not overwriting file.\nTo overwrite, specify `overwrite=true`.\n",
            out_path.display()
        ));
    }

    let experiment = features_path.file_stem().and_then(|s| s.to_str());
    let features = read_feature_table(features_path, experiment)?;

    let mut outcome = String::new();
    let mut tables = Vec::with_capacity(config.models.len());
    for model_ref in &config.models {
        match classify_one(&features, model_ref) {
            Ok((behaviour, table)) => {
                outcome.push_str(&format!("Completed {} classification.\n", behaviour));
                tables.push(table);
            }
            Err(e) => {
                error!(model = ?model_ref.location, error = %e, "Classification failed, skipping model");
                outcome.push_str(&format!("Failed classification with {:?}: {}\n", model_ref.location, e));
            }
        }
    }

    if tables.is_empty() {
        return Ok(outcome);
    }
    let combined = PredictionTable::hconcat(tables)?;
    write_prediction_table(&combined, out_path)?;
    info!(path = %out_path.display(), columns = combined.ncols(), "Wrote behaviour predictions");
    Ok(outcome)
}

fn classify_one(features: &FeatureTable, model_ref: &ModelRef) -> Result<(String, PredictionTable)> {
    let model = match &model_ref.location {
        ModelLocation::Dir { model_dir } => BehaviorModel::open(model_dir)?,
        ModelLocation::Project { proj_dir, behaviour } => BehaviorModel::load(proj_dir, behaviour)?,
    };
    let behaviour = model.behaviour().to_string();
    let pcutoff = resolve_pcutoff(model_ref.pcutoff, model.pcutoff()?)?;

    let mut table = model.infer(features)?;
    let probs = table.require_column(&ColumnGroup::prob(&behaviour))?;
    let preds = merge_short_gaps(&decide(&probs, pcutoff), model_ref.min_window_frames);
    table.set_column(ColumnGroup::pred(&behaviour), preds)?;
    for user_behav in &model_ref.user_behavs {
        table.set_column(ColumnGroup::new(behaviour.as_str(), user_behav.as_str()), Array1::zeros(table.nrows()))?;
    }
    Ok((behaviour, table))
}
