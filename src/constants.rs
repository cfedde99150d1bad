//! Shared constants: artifact layout, column naming, sentinels

/// Directory (under the project root) holding every behaviour model
pub const MODELS_DIR: &str = "behav_models";
/// Directory (under the project root) with extracted feature tables
pub const FEATURES_DIR: &str = "5_features_extracted";
/// Directory (under the project root) with scored label tables
pub const SCORED_BEHAVS_DIR: &str = "7_scored_behavs";

pub const CONFIGS_FILE: &str = "configs.json";
pub const CLASSIFIERS_DIR: &str = "classifiers";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const PREPROC_FILE: &str = "preproc.json";
pub const EVALUATION_DIR: &str = "evaluation";

/// Extension of persisted tables
pub const TABLE_EXT: &str = "parquet";

/// Key column names in persisted tables
pub const EXPERIMENT_COL: &str = "experiment";
pub const FRAME_COL: &str = "frame";
pub const INDIVIDUAL_COL: &str = "individual";

/// Separator between a column group and its sub-column in flat storage
pub const GROUP_SEP: &str = "::";
/// Separator for wrangled `{behaviour}__{outcome}` names
pub const OUTCOME_SEP: &str = "__";

/// Outcome sub-column names
pub const ACTUAL: &str = "actual";
pub const PRED: &str = "pred";
pub const PROB: &str = "prob";

/// Raw positional columns ahead of the derived features:
/// 2 individuals * 8 body points * 3 coordinates (x, y, likelihood)
pub const RAW_COLUMN_PREFIX: usize = 48;

/// pcutoff meaning "use the classifier's own default"
pub const PCUTOFF_DEFER: f64 = -1.0;

/// Number of thresholds in a pcutoff sweep (0.00, 0.01, ..., 1.00)
pub const SWEEP_STEPS: usize = 101;

/// Label values
pub const UNDETERMINED: f64 = -1.0;
pub const NON_BEHAV: f64 = 0.0;
pub const BEHAV: f64 = 1.0;

/// Class names for reports, in class order
pub const CLASS_NAMES: [&str; 2] = ["nil", "behav"];
