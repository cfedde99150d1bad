//! Binary decision tree with Gini splits and probability leaves

use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the positive-class fraction
    Leaf { value: f64, n_samples: usize },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Decision tree estimating P(behaviour) per row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (all when None)
    pub max_features: Option<usize>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Grow the tree on rows `rows` (repeats allowed, for bootstrap samples)
    pub fn fit<R: Rng>(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize], rng: &mut R) {
        self.root = Some(self.build(x, y, rows, 0, rng));
    }

    /// Positive-class fraction of the leaf `row` falls into
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = match &self.root {
            Some(root) => root,
            None => return 0.0,
        };
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn build<R: Rng>(&self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize], depth: usize, rng: &mut R) -> TreeNode {
        let n_samples = rows.len();
        let n_pos = rows.iter().filter(|&&i| y[i] > 0.5).count();
        let leaf = TreeNode::Leaf {
            value: if n_samples == 0 { 0.0 } else { n_pos as f64 / n_samples as f64 },
            n_samples,
        };

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || n_pos == 0
            || n_pos == n_samples;
        if should_stop {
            return leaf;
        }

        let Some((feature_idx, threshold)) = self.best_split(x, y, rows, n_pos, rng) else {
            return leaf;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&i| x[[i, feature_idx]] <= threshold);

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build(x, y, &left_rows, depth + 1, rng)),
            right: Box::new(self.build(x, y, &right_rows, depth + 1, rng)),
            n_samples,
        }
    }

    /// Sorted sweep over candidate features; returns the split with the
    /// largest Gini decrease
    fn best_split<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        n_pos: usize,
        rng: &mut R,
    ) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        if n_features == 0 {
            return None;
        }
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features);
        let features = sample(rng, n_features, n_try);

        let n = rows.len() as f64;
        let parent = gini(n_pos as f64, n);
        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in features.iter() {
            let mut sorted: Vec<(f64, bool)> = rows
                .iter()
                .map(|&i| (x[[i, feature_idx]], y[i] > 0.5))
                .filter(|(v, _)| !v.is_nan())
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0.0;
            for k in 0..sorted.len().saturating_sub(1) {
                if sorted[k].1 {
                    left_pos += 1.0;
                }
                let (v, next) = (sorted[k].0, sorted[k + 1].0);
                if v == next {
                    continue;
                }

                let n_left = (k + 1) as f64;
                let n_right = n - n_left;
                if (k + 1) < self.min_samples_leaf || (n_right as usize) < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left * gini(left_pos, n_left) + n_right * gini(n_pos as f64 - left_pos, n_right)) / n;
                let gain = parent - weighted;
                if gain > best.map_or(0.0, |b| b.2) {
                    best = Some((feature_idx, (v + next) / 2.0, gain));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }
}

fn gini(n_pos: f64, n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let p = n_pos / n;
    2.0 * p * (1.0 - p)
}
