//! CART regression trees
//!
//! Binary trees grown by variance reduction: at each node the split that
//! removes the most squared error is chosen among all feature/threshold
//! candidates, scanning each feature in sorted order with prefix sums.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Growth limits for one tree
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Fit a tree on the given row subset
    ///
    /// `importance` accumulates the squared-error reduction of every split,
    /// indexed by feature.
    pub fn fit(
        x: ArrayView2<f64>,
        y: &[f64],
        rows: &[usize],
        config: &TreeConfig,
        importance: &mut [f64],
    ) -> Self {
        let mut rows = rows.to_vec();
        let root = build_node(x, y, &mut rows, 0, config, importance);
        Self { root }
    }

    /// Predict one feature vector
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn mean(y: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64
}

/// Sum of squared errors around the subset mean
fn sse(y: &[f64], rows: &[usize]) -> f64 {
    let m = mean(y, rows);
    rows.iter().map(|&r| (y[r] - m) * (y[r] - m)).sum()
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

fn build_node(
    x: ArrayView2<f64>,
    y: &[f64],
    rows: &mut Vec<usize>,
    depth: usize,
    config: &TreeConfig,
    importance: &mut [f64],
) -> Node {
    let node_mean = mean(y, rows);
    if depth >= config.max_depth || rows.len() < config.min_samples_split {
        return Node::Leaf { value: node_mean };
    }

    let parent_sse = sse(y, rows);
    if parent_sse <= f64::EPSILON {
        // Already pure
        return Node::Leaf { value: node_mean };
    }

    let best = match find_best_split(x, y, rows, parent_sse, config.min_samples_leaf) {
        Some(best) => best,
        None => return Node::Leaf { value: node_mean },
    };

    importance[best.feature] += best.gain;

    let (mut left_rows, mut right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .copied()
        .partition(|&r| x[[r, best.feature]] <= best.threshold);

    let left = build_node(x, y, &mut left_rows, depth + 1, config, importance);
    let right = build_node(x, y, &mut right_rows, depth + 1, config, importance);

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Scan every feature for the threshold with the largest SSE reduction
fn find_best_split(
    x: ArrayView2<f64>,
    y: &[f64],
    rows: &[usize],
    parent_sse: f64,
    min_leaf: usize,
) -> Option<BestSplit> {
    let n = rows.len();
    let mut best: Option<BestSplit> = None;

    for feature in 0..x.ncols() {
        // Sort the subset by this feature's value
        let mut order: Vec<usize> = rows.to_vec();
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let total_sum: f64 = order.iter().map(|&r| y[r]).sum();
        let total_sq: f64 = order.iter().map(|&r| y[r] * y[r]).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for i in 1..n {
            let prev = order[i - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            // No threshold separates equal values
            if x[[prev, feature]] == x[[order[i], feature]] {
                continue;
            }
            if i < min_leaf || n - i < min_leaf {
                continue;
            }

            let left_n = i as f64;
            let right_n = (n - i) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;

            let left_sse = left_sq - left_sum * left_sum / left_n;
            let right_sse = right_sq - right_sum * right_sum / right_n;
            let gain = parent_sse - (left_sse + right_sse);

            if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                let threshold = (x[[prev, feature]] + x[[order[i], feature]]) / 2.0;
                best = Some(BestSplit {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}
