//! Row alignment of feature and label tables

use super::{KeyedTable, RowKey};
use crate::error::{BehavError, Result};
use std::collections::HashMap;
use std::fmt;

/// Restrict both tables to their shared row keys.
///
/// Row order follows the feature table. Fails with [`BehavError::Alignment`]
/// when the tables share no keys.
pub fn align<A, B>(features: &KeyedTable<A>, labels: &KeyedTable<B>) -> Result<(KeyedTable<A>, KeyedTable<B>)>
where
    A: Clone + PartialEq + fmt::Display,
    B: Clone + PartialEq + fmt::Display,
{
    let label_pos: HashMap<&RowKey, usize> = labels
        .keys()
        .iter()
        .enumerate()
        .map(|(i, k)| (k, i))
        .collect();

    let (feature_rows, label_rows): (Vec<usize>, Vec<usize>) = features
        .keys()
        .iter()
        .enumerate()
        .filter_map(|(i, k)| label_pos.get(k).map(|&j| (i, j)))
        .unzip();

    if feature_rows.is_empty() {
        return Err(BehavError::Alignment);
    }

    tracing::debug!(
        features = features.nrows(),
        labels = labels.nrows(),
        shared = feature_rows.len(),
        "Aligned feature and label tables"
    );

    Ok((features.select_rows(&feature_rows), labels.select_rows(&label_rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnGroup, FeatureTable, LabelTable};
    use ndarray::{array, Array2};

    #[test]
    fn test_align_intersects_in_feature_order() {
        let fkeys = vec![RowKey::new("a", 2), RowKey::new("a", 0), RowKey::new("a", 1)];
        let features = FeatureTable::new(
            fkeys,
            vec!["x".to_string()],
            array![[2.0], [0.0], [1.0]],
        )
        .unwrap();

        let lkeys = vec![RowKey::new("a", 0), RowKey::new("a", 1), RowKey::new("a", 5)];
        let labels = LabelTable::new(
            lkeys,
            vec![ColumnGroup::actual("groom")],
            array![[10.0], [11.0], [15.0]],
        )
        .unwrap();

        let (f, l) = align(&features, &labels).unwrap();
        assert_eq!(f.nrows(), l.nrows());
        assert_eq!(f.keys(), l.keys());
        assert_eq!(f.keys()[0], RowKey::new("a", 0));
        assert_eq!(f.values()[[1, 0]], 1.0);
        assert_eq!(l.values()[[1, 0]], 11.0);
    }

    #[test]
    fn test_align_empty_intersection_fails() {
        let features = FeatureTable::new(
            vec![RowKey::new("a", 0)],
            vec!["x".to_string()],
            Array2::zeros((1, 1)),
        )
        .unwrap();
        let labels = LabelTable::new(
            vec![RowKey::new("b", 0)],
            vec![ColumnGroup::actual("groom")],
            Array2::zeros((1, 1)),
        )
        .unwrap();

        assert!(matches!(align(&features, &labels), Err(BehavError::Alignment)));
    }
}
