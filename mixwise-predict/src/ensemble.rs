//! Tree-ensemble regressors
//!
//! Two families behind one interface: a bagged forest (bootstrap-resampled
//! trees, averaged) and a boosted ensemble (shallow trees fitted to the
//! running residual with shrinkage).

use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tree::{RegressionTree, TreeConfig};

/// Which regressor family to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "random_forest" => Some(ModelKind::RandomForest),
            "gradient_boosting" => Some(ModelKind::GradientBoosting),
            _ => None,
        }
    }
}

/// Bagged forest: 200 deep trees on bootstrap samples
const FOREST_TREES: usize = 200;
const FOREST_CONFIG: TreeConfig = TreeConfig {
    max_depth: 15,
    min_samples_split: 5,
    min_samples_leaf: 2,
};

/// Boosted ensemble: 150 depth-8 trees with 0.1 shrinkage
const BOOST_ROUNDS: usize = 150;
const BOOST_LEARNING_RATE: f64 = 0.1;
const BOOST_CONFIG: TreeConfig = TreeConfig {
    max_depth: 8,
    min_samples_split: 2,
    min_samples_leaf: 1,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    trees: Vec<RegressionTree>,
    importance: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedModel {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    importance: Vec<f64>,
}

/// A fitted regressor of either family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Regressor {
    RandomForest(ForestModel),
    GradientBoosting(BoostedModel),
}

impl Regressor {
    /// Fit the requested family on already-normalized features
    pub fn fit(kind: ModelKind, x: ArrayView2<f64>, y: &[f64], rng: &mut StdRng) -> Self {
        match kind {
            ModelKind::RandomForest => Self::RandomForest(fit_forest(x, y, rng)),
            ModelKind::GradientBoosting => Self::GradientBoosting(fit_boosted(x, y)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Regressor::RandomForest(_) => ModelKind::RandomForest,
            Regressor::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    /// Predict one feature vector
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            Regressor::RandomForest(model) => {
                if model.trees.is_empty() {
                    return 0.0;
                }
                model.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
                    / model.trees.len() as f64
            }
            Regressor::GradientBoosting(model) => {
                let boost: f64 = model.trees.iter().map(|t| t.predict_row(row)).sum();
                model.base + model.learning_rate * boost
            }
        }
    }

    /// Per-feature importance, normalized to sum to 1 (all zero when the
    /// ensemble never split)
    pub fn feature_importance(&self) -> Vec<f64> {
        let raw = match self {
            Regressor::RandomForest(model) => &model.importance,
            Regressor::GradientBoosting(model) => &model.importance,
        };
        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            raw.iter().map(|&v| v / total).collect()
        } else {
            raw.clone()
        }
    }

    /// Number of features the ensemble was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            Regressor::RandomForest(model) => model.importance.len(),
            Regressor::GradientBoosting(model) => model.importance.len(),
        }
    }
}

fn fit_forest(x: ArrayView2<f64>, y: &[f64], rng: &mut StdRng) -> ForestModel {
    let n = x.nrows();
    let mut importance = vec![0.0; x.ncols()];
    let mut trees = Vec::with_capacity(FOREST_TREES);

    for _ in 0..FOREST_TREES {
        let rows: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
        trees.push(RegressionTree::fit(
            x,
            y,
            &rows,
            &FOREST_CONFIG,
            &mut importance,
        ));
    }
    debug!(trees = trees.len(), "fitted bagged forest");

    ForestModel { trees, importance }
}

fn fit_boosted(x: ArrayView2<f64>, y: &[f64]) -> BoostedModel {
    let n = x.nrows();
    let base = if n > 0 {
        y.iter().sum::<f64>() / n as f64
    } else {
        0.0
    };

    let rows: Vec<usize> = (0..n).collect();
    let mut residuals: Vec<f64> = y.iter().map(|&v| v - base).collect();
    let mut importance = vec![0.0; x.ncols()];
    let mut trees = Vec::with_capacity(BOOST_ROUNDS);

    for _ in 0..BOOST_ROUNDS {
        let tree = RegressionTree::fit(x, &residuals, &rows, &BOOST_CONFIG, &mut importance);
        for (i, residual) in residuals.iter_mut().enumerate() {
            let row: Vec<f64> = x.row(i).to_vec();
            *residual -= BOOST_LEARNING_RATE * tree.predict_row(&row);
        }
        trees.push(tree);
    }
    debug!(rounds = trees.len(), "fitted boosted ensemble");

    BoostedModel {
        base,
        learning_rate: BOOST_LEARNING_RATE,
        trees,
        importance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::SeedableRng;

    /// y is a clean linear function of the first feature
    fn linear_data(n: usize) -> (Array2<f64>, Vec<f64>) {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| match j {
            0 => i as f64 / n as f64,
            1 => ((i * 31) % 7) as f64,
            _ => 1.0,
        });
        let y: Vec<f64> = (0..n).map(|i| 10.0 * i as f64 / n as f64).collect();
        (x, y)
    }

    #[test]
    fn test_forest_fits_monotone_target() {
        let (x, y) = linear_data(60);
        let mut rng = StdRng::seed_from_u64(42);
        let model = Regressor::fit(ModelKind::RandomForest, x.view(), &y, &mut rng);

        let low = model.predict_row(&[0.05, 3.0, 1.0]);
        let high = model.predict_row(&[0.95, 3.0, 1.0]);
        assert!(low < 3.0, "low prediction {low}");
        assert!(high > 7.0, "high prediction {high}");
        assert_eq!(model.kind(), ModelKind::RandomForest);
    }

    #[test]
    fn test_boosting_fits_monotone_target() {
        let (x, y) = linear_data(60);
        let mut rng = StdRng::seed_from_u64(42);
        let model = Regressor::fit(ModelKind::GradientBoosting, x.view(), &y, &mut rng);

        let low = model.predict_row(&[0.05, 3.0, 1.0]);
        let high = model.predict_row(&[0.95, 3.0, 1.0]);
        assert!(low < 3.0, "low prediction {low}");
        assert!(high > 7.0, "high prediction {high}");
    }

    #[test]
    fn test_importance_favors_informative_feature() {
        let (x, y) = linear_data(60);
        let mut rng = StdRng::seed_from_u64(7);
        for kind in [ModelKind::RandomForest, ModelKind::GradientBoosting] {
            let model = Regressor::fit(kind, x.view(), &y, &mut rng);
            let importance = model.feature_importance();
            assert_eq!(importance.len(), 3);
            assert!(
                importance[0] > importance[1] && importance[0] > importance[2],
                "importance {importance:?}"
            );
            let total: f64 = importance.iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fit_is_reproducible_with_seed() {
        let (x, y) = linear_data(40);
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = Regressor::fit(ModelKind::RandomForest, x.view(), &y, &mut rng_a);
        let b = Regressor::fit(ModelKind::RandomForest, x.view(), &y, &mut rng_b);
        let row = [0.4, 2.0, 1.0];
        assert_eq!(a.predict_row(&row), b.predict_row(&row));
    }
}
