use super::{
    bout_accuracy, classification_report, confusion_matrix, logistic_curve, threshold_sweep, BoutAccuracy,
    ClassificationReport, ConfusionMatrix, LogisticCurve, ThresholdMetrics,
};
use crate::error::Result;
use crate::postprocessing::decide;
use crate::table::io::write_prediction_table;
use crate::table::{ColumnGroup, PredictionTable, RowKey};
use crate::training::TrainingHistory;
use ndarray::Array1;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Everything computed when evaluating a classifier on one data split
#[derive(Debug, Clone)]
pub struct EvaluationBundle {
    /// Split name, e.g. "train" or "test"
    pub split: String,
    pub pcutoff: f64,
    /// Prediction table with the `actual` outcome appended
    pub eval: PredictionTable,
    pub report: ClassificationReport,
    pub confusion: ConfusionMatrix,
    pub pcutoffs: Vec<ThresholdMetrics>,
    pub logc: LogisticCurve,
    pub bouts: Vec<BoutAccuracy>,
}

impl EvaluationBundle {
    /// Evaluate probabilities for `behaviour` against normalized labels
    pub fn compute(
        split: &str,
        behaviour: &str,
        keys: Vec<RowKey>,
        y_true: &Array1<f64>,
        y_prob: &Array1<f64>,
        pcutoff: f64,
    ) -> Result<Self> {
        let y_pred = decide(y_prob, pcutoff);

        let mut eval = PredictionTable::empty(keys)?;
        eval.set_column(ColumnGroup::prob(behaviour), y_prob.clone())?;
        eval.set_column(ColumnGroup::pred(behaviour), y_pred.clone())?;
        eval.set_column(ColumnGroup::actual(behaviour), y_true.clone())?;

        let bundle = Self {
            split: split.to_string(),
            pcutoff,
            report: classification_report(y_true, &y_pred)?,
            confusion: confusion_matrix(y_true, &y_pred)?,
            pcutoffs: threshold_sweep(y_true, y_prob)?,
            logc: logistic_curve(y_true, y_prob)?,
            bouts: bout_accuracy(y_true, &y_pred)?,
            eval,
        };

        tracing::info!(
            split,
            rows = y_true.len(),
            accuracy = bundle.report.accuracy,
            f1 = bundle.report.behav.f1_score,
            "Evaluated classifier"
        );
        Ok(bundle)
    }

    /// Write `{split}_eval.parquet` and the `{split}_*.json` artifacts
    pub fn save(&self, eval_dir: &Path) -> Result<()> {
        fs::create_dir_all(eval_dir)?;
        let path = |suffix: &str| eval_dir.join(format!("{}_{}", self.split, suffix));

        write_prediction_table(&self.eval, &path("eval.parquet"))?;
        write_json(&path("report.json"), &self.report)?;
        write_json(&path("confm.json"), &self.confusion)?;
        write_json(&path("pcutoffs.json"), &self.pcutoffs)?;
        write_json(&path("logc.json"), &self.logc)?;
        write_json(&path("bouts.json"), &self.bouts)?;
        Ok(())
    }
}

pub fn save_history(history: &TrainingHistory, eval_dir: &Path) -> Result<()> {
    fs::create_dir_all(eval_dir)?;
    write_json(&eval_dir.join("history.json"), history)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    fn keys(n: usize) -> Vec<RowKey> {
        (0..n).map(|i| RowKey::new("exp1", i as i64)).collect()
    }

    #[test]
    fn test_compute_and_save() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_prob = array![0.1, 0.6, 0.7, 0.4];
        let bundle = EvaluationBundle::compute("test", "groom", keys(4), &y_true, &y_prob, 0.5).unwrap();

        assert_eq!(bundle.confusion, [[1, 1], [1, 1]]);
        assert_eq!(bundle.eval.ncols(), 3);
        assert_eq!(bundle.eval.column(&ColumnGroup::pred("groom")).unwrap()[1], 1.0);
        assert_eq!(bundle.pcutoffs.len(), 101);

        let dir = TempDir::new().unwrap();
        bundle.save(dir.path()).unwrap();
        for name in ["eval.parquet", "report.json", "confm.json", "pcutoffs.json", "logc.json", "bouts.json"] {
            assert!(dir.path().join(format!("test_{}", name)).exists(), "missing {}", name);
        }

        let confm: ConfusionMatrix =
            serde_json::from_str(&fs::read_to_string(dir.path().join("test_confm.json")).unwrap()).unwrap();
        assert_eq!(confm, bundle.confusion);
    }

    #[test]
    fn test_save_history() {
        let dir = TempDir::new().unwrap();
        save_history(&TrainingHistory::default(), &dir.path().join("evaluation")).unwrap();
        assert!(dir.path().join("evaluation").join("history.json").exists());
    }
}
