use super::{check_same_len, is_positive};
use crate::error::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// How well one true bout was predicted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoutAccuracy {
    /// Bout id: running count of changes in the true labels
    pub id: usize,
    /// Share of the bout's frames predicted correctly
    pub proportion: f64,
    /// Mean true label over the bout (0 or 1)
    pub actual_bout: f64,
    pub bout_len: usize,
}

/// Per-bout accuracy over runs of constant `y_true`, worst bouts first.
///
/// The sort is stable, so equal proportions keep their order in the sequence.
pub fn bout_accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Vec<BoutAccuracy>> {
    check_same_len(y_true, y_pred)?;

    // (correct, truth sum, length) per bout
    let mut acc: Vec<(usize, f64, usize)> = Vec::new();
    let mut prev: Option<f64> = None;
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        if prev != Some(t) {
            acc.push((0, 0.0, 0));
            prev = Some(t);
        }
        if let Some(bout) = acc.last_mut() {
            bout.0 += (is_positive(t) == is_positive(p)) as usize;
            bout.1 += t;
            bout.2 += 1;
        }
    }

    let mut bouts: Vec<BoutAccuracy> = acc
        .into_iter()
        .enumerate()
        .map(|(i, (correct, truth, len))| BoutAccuracy {
            id: i + 1,
            proportion: correct as f64 / len as f64,
            actual_bout: truth / len as f64,
            bout_len: len,
        })
        .collect();
    bouts.sort_by(|a, b| a.proportion.total_cmp(&b.proportion));
    Ok(bouts)
}
