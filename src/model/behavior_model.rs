//! Per-behaviour model orchestration
//!
//! Training runs strictly in order: align, wrangle, fit the preprocessor,
//! split, undersample, fit, evaluate, persist. Artifacts are only written
//! once every step has succeeded.

use super::config::ModelConfig;
use super::paths::ModelPaths;
use crate::constants::SCORED_BEHAVS_DIR;
use crate::error::{BehavError, Result};
use crate::evaluation::{save_history, EvaluationBundle};
use crate::labels::{behaviour_labels, behaviours, wrangle};
use crate::postprocessing::{decide, resolve_pcutoff};
use crate::preprocessing::{FittedPreprocessor, Preprocessor};
use crate::sampling::Sampler;
use crate::table::io::{combine_feature_dir, combine_label_dir};
use crate::table::{align, ColumnGroup, FeatureTable, PredictionTable, RowKey};
use crate::training::{load_classifier, Classifier, ClassifierType, TrainingHistory};
use ndarray::{Array1, Array2, Axis};
use std::path::Path;
use tracing::{info, info_span, warn};

/// Outcome of one training run
#[derive(Debug, Clone)]
pub struct TrainingResult {
    pub clf_type: ClassifierType,
    pub history: TrainingHistory,
    pub train: EvaluationBundle,
    pub test: EvaluationBundle,
}

/// Model inputs after alignment and preprocessing
struct TrainingData {
    keys: Vec<RowKey>,
    x: Array2<f64>,
    y: Array1<f64>,
    train: Vec<usize>,
    test: Vec<usize>,
    preproc: FittedPreprocessor,
}

/// Classifier for one behaviour of one project
#[derive(Debug)]
pub struct BehaviorModel {
    paths: ModelPaths,
    config: ModelConfig,
    clf: Box<dyn Classifier>,
}

impl BehaviorModel {
    /// Open the model for `behaviour`, creating its config on first use
    pub fn new(proj_dir: &Path, behaviour: &str) -> Result<Self> {
        let paths = ModelPaths::for_behaviour(proj_dir, behaviour);
        let config = match ModelConfig::load(&paths.configs())? {
            Some(config) => config,
            None => {
                let config = ModelConfig::new(proj_dir, behaviour);
                config.save(&paths.configs())?;
                info!(behaviour, "Created model config");
                config
            }
        };
        Self::with_config(paths, config)
    }

    /// Open an existing model; fails with `NotFound` if it has no config
    pub fn load(proj_dir: &Path, behaviour: &str) -> Result<Self> {
        Self::open(ModelPaths::for_behaviour(proj_dir, behaviour).model_dir())
    }

    /// Open an existing model from its directory
    pub fn open(model_dir: &Path) -> Result<Self> {
        let paths = ModelPaths::new(model_dir);
        let config = ModelConfig::load(&paths.configs())?.ok_or_else(|| BehavError::NotFound {
            path: paths.configs(),
        })?;
        Self::with_config(paths, config)
    }

    /// Behaviours scored in the project's label tables
    pub fn project_behaviours(proj_dir: &Path) -> Result<Vec<String>> {
        let labels = wrangle(&combine_label_dir(&proj_dir.join(SCORED_BEHAVS_DIR))?)?;
        Ok(behaviours(&labels))
    }

    /// One model per behaviour scored in the project's label tables
    pub fn create_from_project(proj_dir: &Path) -> Result<Vec<Self>> {
        Self::project_behaviours(proj_dir)?
            .iter()
            .map(|behaviour| Self::new(proj_dir, behaviour))
            .collect()
    }

    fn with_config(paths: ModelPaths, config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let clf = load_or_build(&paths, &config)?;
        Ok(Self { paths, config, clf })
    }

    pub fn behaviour(&self) -> &str {
        &self.config.behav_name
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn paths(&self) -> &ModelPaths {
        &self.paths
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.clf.as_ref()
    }

    /// Replace the config (validated) and persist it
    pub fn update_config(&mut self, config: ModelConfig) -> Result<()> {
        config.validate()?;
        let clf_changed = config.clf_struct != self.config.clf_struct;
        self.config = config;
        if clf_changed {
            self.clf = load_or_build(&self.paths, &self.config)?;
        }
        self.config.save(&self.paths.configs())
    }

    /// Switch the active classifier variant, keeping the config in lockstep
    pub fn set_classifier(&mut self, clf_type: ClassifierType) -> Result<()> {
        self.config.clf_struct = clf_type;
        self.clf = load_or_build(&self.paths, &self.config)?;
        self.config.save(&self.paths.configs())
    }

    /// pcutoff to decide with: the configured one, or the classifier default
    pub fn pcutoff(&self) -> Result<f64> {
        resolve_pcutoff(self.config.pcutoff, self.clf.default_pcutoff())
    }

    /// Train the active classifier variant on the project's tables
    pub fn train(&mut self) -> Result<TrainingResult> {
        let span = info_span!(
            "behav_model",
            behaviour = %self.config.behav_name,
            clf = %self.config.clf_struct
        );
        let _enter = span.enter();

        self.config.validate()?;
        let clf_type = self.config.clf_struct;
        info!("Training classifier");

        let data = self.prepare_training()?;
        let mut clf = clf_type.build(self.config.seed);
        let history = clf.fit(
            &data.x,
            &data.y,
            &data.train,
            self.config.batch_size,
            self.config.epochs,
            self.config.val_split,
        )?;
        if let Some(last) = history.last() {
            info!(epochs = history.len(), loss = last.loss, accuracy = last.accuracy, "Fitted classifier");
        }

        let pcutoff = resolve_pcutoff(self.config.pcutoff, clf.default_pcutoff())?;
        let train = self.evaluate(clf.as_ref(), &data, &data.train, "train", pcutoff)?;
        let test = self.evaluate(clf.as_ref(), &data, &data.test, "test", pcutoff)?;

        let eval_dir = self.paths.eval_dir(clf_type);
        save_history(&history, &eval_dir)?;
        train.save(&eval_dir)?;
        test.save(&eval_dir)?;
        data.preproc.save(&self.paths.preproc(clf_type))?;
        clf.save(&self.paths.classifier(clf_type))?;
        info!(dir = %self.paths.clf_dir(clf_type).display(), "Saved classifier");

        self.clf = clf;
        Ok(TrainingResult {
            clf_type,
            history,
            train,
            test,
        })
    }

    /// Make `clf_type` the active variant and train it
    pub fn train_variant(&mut self, clf_type: ClassifierType) -> Result<TrainingResult> {
        self.set_classifier(clf_type)?;
        self.train()
    }

    /// Train every variant, then restore the previously active one
    pub fn train_all_variants(&mut self) -> Result<Vec<TrainingResult>> {
        let previous = self.config.clf_struct;
        let results = ClassifierType::all()
            .into_iter()
            .map(|clf_type| self.train_variant(clf_type))
            .collect::<Result<Vec<_>>>();
        self.set_classifier(previous)?;
        results
    }

    /// Behaviour probabilities and decisions for raw features
    pub fn infer(&self, features: &FeatureTable) -> Result<PredictionTable> {
        let span = info_span!(
            "behav_model",
            behaviour = %self.config.behav_name,
            clf = %self.config.clf_struct
        );
        let _enter = span.enter();

        if !self.clf.is_fitted() {
            return Err(BehavError::NotFitted(format!(
                "no trained {} classifier for '{}'",
                self.config.clf_struct, self.config.behav_name
            )));
        }
        let preproc = FittedPreprocessor::load(&self.paths.preproc(self.config.clf_struct))?;
        let x = preproc.transform(features)?;
        let index: Vec<usize> = (0..x.nrows()).collect();

        let probs = if index.is_empty() {
            warn!("No rows to classify");
            Array1::zeros(0)
        } else {
            self.clf.predict(&x, &index, self.config.batch_size)?
        };
        let preds = decide(&probs, self.pcutoff()?);

        let behaviour = &self.config.behav_name;
        let mut out = PredictionTable::empty(features.keys().to_vec())?;
        out.set_column(ColumnGroup::prob(behaviour), probs)?;
        out.set_column(ColumnGroup::pred(behaviour), preds)?;
        info!(rows = out.nrows(), "Classified features");
        Ok(out)
    }

    fn prepare_training(&self) -> Result<TrainingData> {
        let features = combine_feature_dir(&self.config.features_dir())?;
        let labels = combine_label_dir(&self.config.labels_dir())?;
        let (features, labels) = align(&features, &labels)?;

        let labels = wrangle(&labels)?;
        let y = behaviour_labels(&labels, &self.config.behav_name)?;

        let preproc = Preprocessor::new()
            .with_skip_columns(self.config.raw_column_prefix)
            .fit(&features)?;
        let x = preproc.transform(&features)?;

        let mut sampler = Sampler::new(self.config.seed);
        let index: Vec<usize> = (0..x.nrows()).collect();
        let (train, test) = sampler.split(&index, &y, self.config.test_split)?;
        let train = sampler.undersample(&train, &y.select(Axis(0), &train), self.config.undersample_ratio)?;

        info!(
            rows = x.nrows(),
            features = x.ncols(),
            train = train.len(),
            test = test.len(),
            "Prepared training data"
        );
        Ok(TrainingData {
            keys: features.keys().to_vec(),
            x,
            y,
            train,
            test,
            preproc,
        })
    }

    fn evaluate(
        &self,
        clf: &dyn Classifier,
        data: &TrainingData,
        rows: &[usize],
        split: &str,
        pcutoff: f64,
    ) -> Result<EvaluationBundle> {
        let y_prob = clf.predict(&data.x, rows, self.config.batch_size)?;
        let y_true = data.y.select(Axis(0), rows);
        let keys = rows.iter().map(|&i| data.keys[i].clone()).collect();
        EvaluationBundle::compute(split, &self.config.behav_name, keys, &y_true, &y_prob, pcutoff)
    }
}

/// Saved classifier for the configured variant, or a fresh unfitted one
fn load_or_build(paths: &ModelPaths, config: &ModelConfig) -> Result<Box<dyn Classifier>> {
    match load_classifier(&paths.classifier(config.clf_struct))? {
        Some(clf) => Ok(clf),
        None => {
            info!(
                behaviour = %config.behav_name,
                clf = %config.clf_struct,
                "No saved classifier, constructing a fresh one"
            );
            Ok(config.clf_struct.build(config.seed))
        }
    }
}
