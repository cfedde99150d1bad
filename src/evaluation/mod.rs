//! Evaluation suite
//!
//! Frame-level metrics ([`classification_report`], [`confusion_matrix`]),
//! threshold-dependent views ([`threshold_sweep`], [`logistic_curve`]) and
//! bout-level accuracy ([`bout_accuracy`]). [`EvaluationBundle`] collects
//! all of them for one data split and persists them as JSON next to the
//! classifier artifact.
//!
//! Labels are binary: anything above 0.5 is the behaviour class.

mod bouts;
mod bundle;
mod metrics;
mod sweep;

pub use bouts::{bout_accuracy, BoutAccuracy};
pub use bundle::{save_history, EvaluationBundle};
pub use metrics::{classification_report, confusion_matrix, ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use sweep::{logistic_curve, sweep_thresholds, threshold_sweep, LogisticCurve, ThresholdMetrics};

use crate::error::{BehavError, Result};
use ndarray::Array1;

fn check_same_len(y_true: &Array1<f64>, other: &Array1<f64>) -> Result<()> {
    if y_true.len() != other.len() {
        return Err(BehavError::ShapeError {
            expected: format!("{} values", y_true.len()),
            actual: format!("{} values", other.len()),
        });
    }
    Ok(())
}

#[inline]
fn is_positive(v: f64) -> bool {
    v > 0.5
}
