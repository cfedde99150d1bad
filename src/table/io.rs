//! Parquet storage for keyed tables
//!
//! Key columns are `experiment` (string, optional in per-experiment files),
//! `frame` (integer) and `individual` (string, optional). Every other column
//! must be numeric. Grouped columns are stored flat as `"{group}::{outcome}"`.

use super::{ColumnGroup, FeatureTable, KeyedTable, LabelTable, PredictionTable, RowKey};
use crate::constants::{EXPERIMENT_COL, FRAME_COL, INDIVIDUAL_COL, TABLE_EXT};
use crate::error::{BehavError, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::fmt;
use std::fs::{self, File};
use std::path::Path;

/// Read a feature table. `experiment` keys the rows when the file has no
/// `experiment` column.
pub fn read_feature_table(path: &Path, experiment: Option<&str>) -> Result<FeatureTable> {
    read_keyed(path, experiment, |name| Ok(name.to_string()))
}

/// Read a label table with `"{behaviour}::{outcome}"` columns
pub fn read_label_table(path: &Path, experiment: Option<&str>) -> Result<LabelTable> {
    read_keyed(path, experiment, ColumnGroup::parse)
}

pub fn read_prediction_table(path: &Path) -> Result<PredictionTable> {
    read_keyed(path, None, ColumnGroup::parse)
}

/// Combine every feature file in `dir`, keyed by file stem
pub fn combine_feature_dir(dir: &Path) -> Result<FeatureTable> {
    combine_dir(dir, |path, name| read_feature_table(path, Some(name)))
}

/// Combine every label file in `dir`, keyed by file stem
pub fn combine_label_dir(dir: &Path) -> Result<LabelTable> {
    combine_dir(dir, |path, name| read_label_table(path, Some(name)))
}

pub fn write_feature_table(table: &FeatureTable, path: &Path) -> Result<()> {
    write_keyed(table, path)
}

pub fn write_label_table(table: &LabelTable, path: &Path) -> Result<()> {
    write_keyed(table, path)
}

pub fn write_prediction_table(table: &PredictionTable, path: &Path) -> Result<()> {
    write_keyed(table, path)
}

fn combine_dir<C, F>(dir: &Path, read: F) -> Result<KeyedTable<C>>
where
    C: Clone + PartialEq + fmt::Display,
    F: Fn(&Path, &str) -> Result<KeyedTable<C>>,
{
    if !dir.is_dir() {
        return Err(BehavError::NotFound { path: dir.to_path_buf() });
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == TABLE_EXT))
        .collect();
    paths.sort();

    let tables = paths
        .iter()
        .map(|p| {
            let name = p.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            read(p, name)
        })
        .collect::<Result<Vec<_>>>()?;

    if tables.is_empty() {
        return Err(BehavError::DataError(format!(
            "no .{} tables found in {}",
            TABLE_EXT,
            dir.display()
        )));
    }

    tracing::debug!(dir = %dir.display(), files = tables.len(), "Combining tables");
    KeyedTable::vconcat(tables)
}

fn read_keyed<C, F>(path: &Path, experiment: Option<&str>, parse: F) -> Result<KeyedTable<C>>
where
    C: Clone + PartialEq + fmt::Display,
    F: Fn(&str) -> Result<C>,
{
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BehavError::NotFound { path: path.to_path_buf() },
        _ => BehavError::IoError(e),
    })?;
    let df = ParquetReader::new(file).finish()?;

    let keys = read_keys(&df, experiment)?;

    let value_cols: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|c| !is_key_column(c.name().as_str()))
        .collect();

    let mut columns = Vec::with_capacity(value_cols.len());
    let mut values = Array2::<f64>::zeros((df.height(), value_cols.len()));

    for (j, col) in value_cols.iter().enumerate() {
        let name = col.name().as_str();
        let dtype = col.dtype();
        if !(dtype.is_float() || dtype.is_integer() || matches!(dtype, DataType::Boolean)) {
            return Err(BehavError::DataError(format!(
                "column '{}' in {} has non-numeric dtype {}",
                name,
                path.display(),
                dtype
            )));
        }

        let series = col.as_materialized_series().cast(&DataType::Float64)?;
        let ca = series.f64()?;
        for (i, v) in ca.into_iter().enumerate() {
            values[[i, j]] = v.unwrap_or(f64::NAN);
        }
        columns.push(parse(name)?);
    }

    KeyedTable::new(keys, columns, values)
}

fn read_keys(df: &DataFrame, experiment: Option<&str>) -> Result<Vec<RowKey>> {
    let n = df.height();

    let experiments: Vec<String> = match df.column(EXPERIMENT_COL) {
        Ok(col) => col
            .as_materialized_series()
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect(),
        Err(_) => {
            let name = experiment.ok_or_else(|| {
                BehavError::DataError(format!(
                    "table has no '{}' column and no experiment name was given",
                    EXPERIMENT_COL
                ))
            })?;
            vec![name.to_string(); n]
        }
    };

    let frame_series = df
        .column(FRAME_COL)
        .map_err(|_| BehavError::DataError(format!("table has no '{}' column", FRAME_COL)))?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let frames = frame_series
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| BehavError::DataError(format!("missing frame number at row {}", i))))
        .collect::<Result<Vec<i64>>>()?;

    let individuals: Vec<Option<String>> = match df.column(INDIVIDUAL_COL) {
        Ok(col) => col
            .as_materialized_series()
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        Err(_) => vec![None; n],
    };

    Ok(experiments
        .into_iter()
        .zip(frames)
        .zip(individuals)
        .map(|((experiment, frame), individual)| RowKey { experiment, frame, individual })
        .collect())
}

fn write_keyed<C>(table: &KeyedTable<C>, path: &Path) -> Result<()>
where
    C: Clone + PartialEq + fmt::Display,
{
    let experiments: Vec<&str> = table.keys().iter().map(|k| k.experiment.as_str()).collect();
    let frames: Vec<i64> = table.keys().iter().map(|k| k.frame).collect();

    let mut cols: Vec<Column> = vec![
        Column::new(EXPERIMENT_COL.into(), experiments),
        Column::new(FRAME_COL.into(), frames),
    ];

    if table.keys().iter().any(|k| k.individual.is_some()) {
        let individuals: Vec<Option<&str>> = table.keys().iter().map(|k| k.individual.as_deref()).collect();
        cols.push(Column::new(INDIVIDUAL_COL.into(), individuals));
    }

    for (col, data) in table.columns().iter().zip(table.values().columns()) {
        let name = col.to_string();
        cols.push(Column::new(name.as_str().into(), data.to_vec()));
    }

    let mut df = DataFrame::new(cols)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    ParquetWriter::new(file).finish(&mut df)?;
    Ok(())
}

fn is_key_column(name: &str) -> bool {
    name == EXPERIMENT_COL || name == FRAME_COL || name == INDIVIDUAL_COL
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_prediction_table_parquet_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preds.parquet");

        let keys = vec![RowKey::new("exp1", 0), RowKey::new("exp1", 1)];
        let table = PredictionTable::new(
            keys,
            vec![ColumnGroup::prob("groom"), ColumnGroup::pred("groom")],
            array![[0.2, 0.0], [0.9, 1.0]],
        )
        .unwrap();

        write_prediction_table(&table, &path).unwrap();
        let back = read_prediction_table(&path).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_non_numeric_column_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.parquet");

        let mut df = df!(
            "frame" => &[0i64, 1],
            "speed" => &["fast", "slow"]
        )
        .unwrap();
        ParquetWriter::new(File::create(&path).unwrap()).finish(&mut df).unwrap();

        let result = read_feature_table(&path, Some("exp1"));
        assert!(matches!(result, Err(BehavError::DataError(_))));
    }

    #[test]
    fn test_combine_dir_keys_by_file_stem() {
        let dir = TempDir::new().unwrap();
        for name in ["b", "a"] {
            let mut df = df!(
                "frame" => &[0i64, 1, 2],
                "speed" => &[1.0, 2.0, 3.0]
            )
            .unwrap();
            let path = dir.path().join(format!("{}.parquet", name));
            ParquetWriter::new(File::create(&path).unwrap()).finish(&mut df).unwrap();
        }

        let table = combine_feature_dir(dir.path()).unwrap();
        assert_eq!(table.nrows(), 6);
        assert_eq!(table.keys()[0], RowKey::new("a", 0));
        assert_eq!(table.keys()[3], RowKey::new("b", 0));
        assert_eq!(table.columns(), &["speed".to_string()]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = read_feature_table(Path::new("/nonexistent/x.parquet"), Some("x"));
        assert!(matches!(result, Err(BehavError::NotFound { .. })));
    }
}
