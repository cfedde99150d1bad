//! Label wrangling
//!
//! Scored label tables carry one column group per behaviour with an
//! `actual` outcome, an optional `pred` outcome (copied from an earlier
//! model run) and any number of user-defined outcome tags. Wrangling keeps
//! the ground truth only and flattens the names:
//!
//! - `(groom, actual)` becomes `groom`
//! - `(groom, {outcome})` becomes `groom__{outcome}`
//! - `(groom, pred)` is dropped
//!
//! Values are -1 (undetermined), 0 (non-behaviour) or 1 (behaviour).
//! [`normalize_values`] collapses missing and undetermined to 0 before any
//! numeric use.

use crate::constants::{ACTUAL, BEHAV, NON_BEHAV, OUTCOME_SEP, PRED, UNDETERMINED};
use crate::error::{BehavError, Result};
use crate::table::{KeyedTable, LabelTable};
use ndarray::Array1;

/// Labels with flat `behaviour` / `behaviour__outcome` column names
pub type WrangledLabels = KeyedTable<String>;

/// Drop predicted columns and flatten (behaviour, outcome) names
pub fn wrangle(labels: &LabelTable) -> Result<WrangledLabels> {
    validate_values(labels)?;

    let keep: Vec<usize> = labels
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.outcome != PRED)
        .map(|(i, _)| i)
        .collect();

    let names: Vec<String> = keep
        .iter()
        .map(|&i| {
            let col = &labels.columns()[i];
            if col.outcome == ACTUAL {
                col.group.clone()
            } else {
                format!("{}{}{}", col.group, OUTCOME_SEP, col.outcome)
            }
        })
        .collect();

    let values = labels.values().select(ndarray::Axis(1), &keep);
    KeyedTable::new(labels.keys().to_vec(), names, values)
}

/// Names of the scored behaviours (the flat columns without an outcome suffix)
pub fn behaviours(wrangled: &WrangledLabels) -> Vec<String> {
    wrangled
        .columns()
        .iter()
        .filter(|c| !c.contains(OUTCOME_SEP))
        .cloned()
        .collect()
}

/// Missing values become 0, then undetermined (-1) becomes 0
pub fn normalize_values(y: &Array1<f64>) -> Array1<f64> {
    y.mapv(|v| if v.is_nan() { NON_BEHAV } else { v.max(NON_BEHAV) })
}

/// Wrangled, normalized label vector for one behaviour
pub fn behaviour_labels(wrangled: &WrangledLabels, behaviour: &str) -> Result<Array1<f64>> {
    let raw = wrangled.require_column(&behaviour.to_string())?;
    Ok(normalize_values(&raw))
}

fn validate_values(labels: &LabelTable) -> Result<()> {
    for (col, data) in labels.columns().iter().zip(labels.values().columns()) {
        if let Some(bad) = data
            .iter()
            .find(|&&v| !(v.is_nan() || v == UNDETERMINED || v == NON_BEHAV || v == BEHAV))
        {
            return Err(BehavError::DataError(format!(
                "label column '{}' has value {} (expected -1, 0 or 1)",
                col, bad
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnGroup, RowKey};
    use ndarray::array;

    fn scored() -> LabelTable {
        let keys = (0..3).map(|i| RowKey::new("exp1", i)).collect();
        LabelTable::new(
            keys,
            vec![
                ColumnGroup::actual("groom"),
                ColumnGroup::pred("groom"),
                ColumnGroup::new("groom", "face"),
                ColumnGroup::actual("rear"),
            ],
            array![
                [1.0, 1.0, 0.0, -1.0],
                [0.0, 1.0, 1.0, 1.0],
                [-1.0, 0.0, 0.0, f64::NAN]
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_wrangle_flattens_and_drops_pred() {
        let w = wrangle(&scored()).unwrap();
        assert_eq!(
            w.columns(),
            &["groom".to_string(), "groom__face".to_string(), "rear".to_string()]
        );
        assert_eq!(behaviours(&w), vec!["groom".to_string(), "rear".to_string()]);
        assert_eq!(w.values()[[1, 1]], 1.0);
    }

    #[test]
    fn test_normalize_values_collapses_missing_and_undetermined() {
        let y = array![1.0, 0.0, -1.0, f64::NAN];
        assert_eq!(normalize_values(&y), array![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_behaviour_labels() {
        let w = wrangle(&scored()).unwrap();
        assert_eq!(behaviour_labels(&w, "rear").unwrap(), array![0.0, 1.0, 0.0]);
        assert!(behaviour_labels(&w, "sniff").is_err());
    }

    #[test]
    fn test_invalid_label_value_rejected() {
        let keys = vec![RowKey::new("exp1", 0)];
        let labels = LabelTable::new(keys, vec![ColumnGroup::actual("groom")], array![[2.0]]).unwrap();
        assert!(matches!(wrangle(&labels), Err(BehavError::DataError(_))));
    }

    #[test]
    fn test_only_pred_outcome_is_dropped() {
        let keys = vec![RowKey::new("exp1", 0), RowKey::new("exp1", 1)];
        let labels = LabelTable::new(
            keys.clone(),
            vec![ColumnGroup::actual("groom"), ColumnGroup::prob("groom")],
            array![[1.0, 1.0], [0.0, 0.0]],
        )
        .unwrap();
        let w = wrangle(&labels).unwrap();
        assert_eq!(w.columns(), &["groom".to_string(), "groom__prob".to_string()]);

        // a probability is not a label value
        let labels = LabelTable::new(
            keys,
            vec![ColumnGroup::actual("groom"), ColumnGroup::prob("groom")],
            array![[1.0, 0.8], [0.0, 0.1]],
        )
        .unwrap();
        assert!(matches!(wrangle(&labels), Err(BehavError::DataError(_))));
    }
}
