use super::{check_same_len, is_positive};
use crate::error::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Rows are true classes, columns predicted classes, order (nil, behav)
pub type ConfusionMatrix = [[usize; 2]; 2];

/// Precision/recall/F1 for one class (or an average over classes)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Two-class report, serialized with the conventional report keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub nil: ClassMetrics,
    pub behav: ClassMetrics,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

pub fn confusion_matrix(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<ConfusionMatrix> {
    check_same_len(y_true, y_pred)?;
    let mut matrix = [[0usize; 2]; 2];
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        matrix[is_positive(t) as usize][is_positive(p) as usize] += 1;
    }
    Ok(matrix)
}

/// Per-class metrics over {non-behaviour, behaviour}; zero division gives 0
pub fn classification_report(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<ClassificationReport> {
    let cm = confusion_matrix(y_true, y_pred)?;

    let class = |c: usize| {
        let tp = cm[c][c] as f64;
        let support = cm[c][0] + cm[c][1];
        let predicted = cm[0][c] + cm[1][c];
        let precision = ratio(tp, predicted as f64);
        let recall = ratio(tp, support as f64);
        ClassMetrics {
            precision,
            recall,
            f1_score: ratio(2.0 * precision * recall, precision + recall),
            support,
        }
    };
    let nil = class(0);
    let behav = class(1);

    let total = nil.support + behav.support;
    let macro_avg = ClassMetrics {
        precision: (nil.precision + behav.precision) / 2.0,
        recall: (nil.recall + behav.recall) / 2.0,
        f1_score: (nil.f1_score + behav.f1_score) / 2.0,
        support: total,
    };
    let weighted = |a: f64, b: f64| {
        ratio(a * nil.support as f64 + b * behav.support as f64, total as f64)
    };
    let weighted_avg = ClassMetrics {
        precision: weighted(nil.precision, behav.precision),
        recall: weighted(nil.recall, behav.recall),
        f1_score: weighted(nil.f1_score, behav.f1_score),
        support: total,
    };

    Ok(ClassificationReport {
        nil,
        behav,
        accuracy: ratio((cm[0][0] + cm[1][1]) as f64, total as f64),
        macro_avg,
        weighted_avg,
    })
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_matrix_layout() {
        let y_true = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 1.0, 0.0, 1.0];
        let cm = confusion_matrix(&y_true, &y_pred).unwrap();
        assert_eq!(cm, [[1, 1], [1, 2]]);
    }

    #[test]
    fn test_report_values() {
        let y_true = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 1.0, 0.0, 1.0];
        let report = classification_report(&y_true, &y_pred).unwrap();

        assert_eq!(report.behav.support, 3);
        assert!((report.behav.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.behav.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.nil.precision - 0.5).abs() < 1e-12);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert_eq!(report.macro_avg.support, 5);
        let expected_weighted = (0.5 * 2.0 + (2.0 / 3.0) * 3.0) / 5.0;
        assert!((report.weighted_avg.precision - expected_weighted).abs() < 1e-12);
    }

    #[test]
    fn test_report_zero_division() {
        let y_true = array![0.0, 0.0];
        let y_pred = array![0.0, 0.0];
        let report = classification_report(&y_true, &y_pred).unwrap();
        assert_eq!(report.behav, ClassMetrics::default());
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn test_report_json_keys() {
        let report = classification_report(&array![0.0, 1.0], &array![0.0, 1.0]).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("macro avg").is_some());
        assert!(json.get("weighted avg").is_some());
        assert_eq!(json["behav"]["f1-score"], 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(confusion_matrix(&array![0.0], &array![0.0, 1.0]).is_err());
    }
}
