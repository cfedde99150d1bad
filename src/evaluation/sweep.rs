use super::{check_same_len, classification_report, is_positive};
use crate::constants::SWEEP_STEPS;
use crate::error::Result;
use crate::postprocessing::decide;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Behaviour-class metrics at one pcutoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMetrics {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
}

/// Logistic curve as data: the share of probabilities below each threshold,
/// plus the raw (probability, actual) points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticCurve {
    pub thresholds: Vec<f64>,
    pub proportion_below: Vec<f64>,
    pub points: Vec<(f64, f64)>,
}

/// 0.00, 0.01, ..., 1.00
pub fn sweep_thresholds() -> Vec<f64> {
    let last = (SWEEP_STEPS - 1) as f64;
    (0..SWEEP_STEPS).map(|i| i as f64 / last).collect()
}

/// Decide at every sweep threshold and report the behaviour-class metrics
pub fn threshold_sweep(y_true: &Array1<f64>, y_prob: &Array1<f64>) -> Result<Vec<ThresholdMetrics>> {
    check_same_len(y_true, y_prob)?;
    sweep_thresholds()
        .into_iter()
        .map(|threshold| {
            let report = classification_report(y_true, &decide(y_prob, threshold))?;
            Ok(ThresholdMetrics {
                threshold,
                precision: report.behav.precision,
                recall: report.behav.recall,
                f1: report.behav.f1_score,
                accuracy: report.accuracy,
            })
        })
        .collect()
}

pub fn logistic_curve(y_true: &Array1<f64>, y_prob: &Array1<f64>) -> Result<LogisticCurve> {
    check_same_len(y_true, y_prob)?;
    let n = y_prob.len().max(1) as f64;
    let thresholds = sweep_thresholds();
    let proportion_below = thresholds
        .iter()
        .map(|&t| y_prob.iter().filter(|&&p| p < t).count() as f64 / n)
        .collect();
    let points = y_prob
        .iter()
        .zip(y_true.iter())
        .map(|(&p, &t)| (p, if is_positive(t) { 1.0 } else { 0.0 }))
        .collect();

    Ok(LogisticCurve {
        thresholds,
        proportion_below,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sweep_thresholds_grid() {
        let t = sweep_thresholds();
        assert_eq!(t.len(), 101);
        assert_eq!(t[0], 0.0);
        assert_eq!(t[50], 0.5);
        assert_eq!(t[100], 1.0);
    }

    #[test]
    fn test_sweep_all_positive_truth() {
        let y_true = array![1.0, 1.0, 1.0];
        let y_prob = array![0.2, 0.6, 0.9];
        let sweep = threshold_sweep(&y_true, &y_prob).unwrap();

        let first = sweep[0];
        assert_eq!(first.recall, 1.0);
        assert_eq!(first.precision, 1.0);
        assert_eq!(first.accuracy, 1.0);

        let last = sweep[100];
        assert_eq!(last.recall, 0.0);
        assert_eq!(last.precision, 0.0);
        assert_eq!(last.accuracy, 0.0);

        assert!(sweep.windows(2).all(|w| w[0].recall >= w[1].recall));
    }

    #[test]
    fn test_sweep_all_negative_truth() {
        let y_true = array![0.0, 0.0];
        let y_prob = array![0.3, 0.7];
        let sweep = threshold_sweep(&y_true, &y_prob).unwrap();

        assert_eq!(sweep[0].accuracy, 0.0);
        assert_eq!(sweep[100].accuracy, 1.0);
        assert!(sweep.iter().all(|m| m.recall == 0.0 && m.precision == 0.0));
    }

    #[test]
    fn test_logistic_curve() {
        let y_true = array![0.0, 1.0, 1.0, 0.0];
        let y_prob = array![0.1, 0.8, 0.6, 0.3];
        let curve = logistic_curve(&y_true, &y_prob).unwrap();

        assert_eq!(curve.proportion_below[0], 0.0);
        assert_eq!(curve.proportion_below[50], 0.5);
        assert_eq!(curve.proportion_below[100], 1.0);
        assert_eq!(curve.points[1], (0.8, 1.0));
    }
}
