//! Keyed numeric tables
//!
//! Feature, label and prediction tables share one in-memory shape: a list of
//! row keys (experiment, frame, individual), a list of column identifiers and
//! a dense `f64` matrix. Missing values are `NaN`.
//!
//! - [`FeatureTable`] - flat column names, numeric derived measurements
//! - [`LabelTable`] - (behaviour, outcome) column groups
//! - [`PredictionTable`] - (behaviour, prob/pred/actual) column groups

mod align;
pub mod io;

pub use align::align;

use crate::constants::{ACTUAL, GROUP_SEP, PRED, PROB};
use crate::error::{BehavError, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Composite row identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub experiment: String,
    pub frame: i64,
    pub individual: Option<String>,
}

impl RowKey {
    pub fn new(experiment: impl Into<String>, frame: i64) -> Self {
        Self {
            experiment: experiment.into(),
            frame,
            individual: None,
        }
    }

    pub fn with_individual(mut self, individual: impl Into<String>) -> Self {
        self.individual = Some(individual.into());
        self
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.individual {
            Some(ind) => write!(f, "({}, {}, {})", self.experiment, self.frame, ind),
            None => write!(f, "({}, {})", self.experiment, self.frame),
        }
    }
}

/// A (group, outcome) column identifier, e.g. ("grooming", "actual")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub group: String,
    pub outcome: String,
}

impl ColumnGroup {
    pub fn new(group: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            outcome: outcome.into(),
        }
    }

    /// Parse the flat `"{group}::{outcome}"` storage form
    pub fn parse(flat: &str) -> Result<Self> {
        flat.split_once(GROUP_SEP)
            .map(|(group, outcome)| Self::new(group, outcome))
            .ok_or_else(|| {
                BehavError::DataError(format!(
                    "column '{}' is not of the form '<behaviour>{}<outcome>'",
                    flat, GROUP_SEP
                ))
            })
    }

    pub fn prob(behaviour: &str) -> Self {
        Self::new(behaviour, PROB)
    }

    pub fn pred(behaviour: &str) -> Self {
        Self::new(behaviour, PRED)
    }

    pub fn actual(behaviour: &str) -> Self {
        Self::new(behaviour, ACTUAL)
    }
}

impl fmt::Display for ColumnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.group, GROUP_SEP, self.outcome)
    }
}

/// Rows keyed by [`RowKey`] with named numeric columns
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedTable<C> {
    keys: Vec<RowKey>,
    columns: Vec<C>,
    values: Array2<f64>,
}

/// Derived per-frame measurements
pub type FeatureTable = KeyedTable<String>;
/// Scored behaviours, one column group per behaviour
pub type LabelTable = KeyedTable<ColumnGroup>;
/// Model output, one column group per behaviour
pub type PredictionTable = KeyedTable<ColumnGroup>;

impl<C> KeyedTable<C>
where
    C: Clone + PartialEq + fmt::Display,
{
    /// Build a table, checking shapes and key uniqueness
    pub fn new(keys: Vec<RowKey>, columns: Vec<C>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != keys.len() || values.ncols() != columns.len() {
            return Err(BehavError::ShapeError {
                expected: format!("({}, {})", keys.len(), columns.len()),
                actual: format!("({}, {})", values.nrows(), values.ncols()),
            });
        }

        let mut seen = HashSet::with_capacity(keys.len());
        if let Some(dup) = keys.iter().find(|k| !seen.insert(*k)) {
            return Err(BehavError::DataError(format!("duplicate row key {}", dup)));
        }

        for (i, col) in columns.iter().enumerate() {
            if columns[..i].contains(col) {
                return Err(BehavError::DataError(format!("duplicate column '{}'", col)));
            }
        }

        Ok(Self { keys, columns, values })
    }

    /// Table with keys only, for appending columns
    pub fn empty(keys: Vec<RowKey>) -> Result<Self> {
        let n = keys.len();
        Self::new(keys, Vec::new(), Array2::zeros((n, 0)))
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.keys.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn column_index(&self, column: &C) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn column(&self, column: &C) -> Option<ArrayView1<'_, f64>> {
        self.column_index(column).map(|i| self.values.column(i))
    }

    /// Column values, failing with the column name when absent
    pub fn require_column(&self, column: &C) -> Result<Array1<f64>> {
        self.column(column)
            .map(|c| c.to_owned())
            .ok_or_else(|| BehavError::DataError(format!("column '{}' not found", column)))
    }

    /// Rows at the given positions, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            keys: rows.iter().map(|&i| self.keys[i].clone()).collect(),
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }

    /// Columns at the given positions, in the given order
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        Self {
            keys: self.keys.clone(),
            columns: cols.iter().map(|&i| self.columns[i].clone()).collect(),
            values: self.values.select(Axis(1), cols),
        }
    }

    /// Append a column, or overwrite it if it already exists
    pub fn set_column(&mut self, column: C, data: Array1<f64>) -> Result<()> {
        if data.len() != self.nrows() {
            return Err(BehavError::ShapeError {
                expected: format!("column length {}", self.nrows()),
                actual: format!("column length {}", data.len()),
            });
        }

        match self.column_index(&column) {
            Some(i) => self.values.column_mut(i).assign(&data),
            None => {
                self.values.push_column(data.view())?;
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// Concatenate columns of tables sharing the same row keys
    pub fn hconcat(tables: Vec<Self>) -> Result<Self> {
        let mut iter = tables.into_iter();
        let mut out = iter
            .next()
            .ok_or_else(|| BehavError::DataError("no tables to concatenate".to_string()))?;

        for table in iter {
            if table.keys != out.keys {
                return Err(BehavError::DataError(
                    "cannot concatenate columns of tables with different row keys".to_string(),
                ));
            }
            for (col, data) in table.columns.into_iter().zip(table.values.columns()) {
                out.set_column(col, data.to_owned())?;
            }
        }
        Ok(out)
    }

    /// Concatenate rows of tables sharing the same columns
    pub fn vconcat(tables: Vec<Self>) -> Result<Self> {
        let first = tables
            .first()
            .ok_or_else(|| BehavError::DataError("no tables to concatenate".to_string()))?;
        let columns = first.columns.clone();

        if let Some(bad) = tables.iter().find(|t| t.columns != columns) {
            return Err(BehavError::DataError(format!(
                "cannot concatenate rows of tables with different columns ({} vs {} columns)",
                columns.len(),
                bad.columns.len()
            )));
        }

        let views: Vec<_> = tables.iter().map(|t| t.values.view()).collect();
        let values = concatenate(Axis(0), &views)?;
        let keys = tables.iter().flat_map(|t| t.keys.iter().cloned()).collect();
        Self::new(keys, columns, values)
    }
}

impl PredictionTable {
    /// Behaviour names, in column order
    pub fn behaviours(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for col in &self.columns {
            if !out.contains(&col.group) {
                out.push(col.group.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<RowKey> {
        (0..n).map(|i| RowKey::new("exp1", i as i64)).collect()
    }

    #[test]
    fn test_new_rejects_duplicate_keys() {
        let mut k = keys(3);
        k[2] = k[0].clone();
        let result = FeatureTable::new(k, vec!["a".to_string()], Array2::zeros((3, 1)));
        assert!(matches!(result, Err(BehavError::DataError(_))));
    }

    #[test]
    fn test_new_rejects_bad_shape() {
        let result = FeatureTable::new(keys(3), vec!["a".to_string()], Array2::zeros((2, 1)));
        assert!(matches!(result, Err(BehavError::ShapeError { .. })));
    }

    #[test]
    fn test_individual_distinguishes_keys() {
        let k = vec![
            RowKey::new("exp1", 0).with_individual("mouse1"),
            RowKey::new("exp1", 0).with_individual("mouse2"),
        ];
        assert!(FeatureTable::new(k, vec!["a".to_string()], Array2::zeros((2, 1))).is_ok());
    }

    #[test]
    fn test_set_column_appends_then_overwrites() {
        let mut t = PredictionTable::empty(keys(2)).unwrap();
        t.set_column(ColumnGroup::prob("groom"), Array1::from(vec![0.2, 0.8])).unwrap();
        t.set_column(ColumnGroup::pred("groom"), Array1::from(vec![0.0, 1.0])).unwrap();
        t.set_column(ColumnGroup::pred("groom"), Array1::from(vec![1.0, 1.0])).unwrap();

        assert_eq!(t.ncols(), 2);
        assert_eq!(t.column(&ColumnGroup::pred("groom")).unwrap()[0], 1.0);
        assert_eq!(t.behaviours(), vec!["groom".to_string()]);
    }

    #[test]
    fn test_vconcat_and_select() {
        let a = FeatureTable::new(keys(2), vec!["x".to_string()], Array2::from_elem((2, 1), 1.0)).unwrap();
        let b_keys = vec![RowKey::new("exp2", 0)];
        let b = FeatureTable::new(b_keys, vec!["x".to_string()], Array2::from_elem((1, 1), 2.0)).unwrap();

        let all = FeatureTable::vconcat(vec![a, b]).unwrap();
        assert_eq!(all.nrows(), 3);

        let picked = all.select_rows(&[2, 0]);
        assert_eq!(picked.keys()[0].experiment, "exp2");
        assert_eq!(picked.values()[[0, 0]], 2.0);
    }

    #[test]
    fn test_column_group_parse() {
        let c = ColumnGroup::parse("rearing::actual").unwrap();
        assert_eq!(c, ColumnGroup::actual("rearing"));
        assert_eq!(c.to_string(), "rearing::actual");
        assert!(ColumnGroup::parse("rearing").is_err());
    }
}
