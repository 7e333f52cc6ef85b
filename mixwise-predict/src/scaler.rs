//! Feature normalization

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance scaler fitted on training data only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations
    ///
    /// Zero-variance columns scale by 1.0 so constant features pass through
    /// centered instead of exploding.
    pub fn fit(x: ArrayView2<f64>) -> Self {
        let rows = x.nrows().max(1) as f64;
        let cols = x.ncols();

        let mut mean = vec![0.0; cols];
        let mut std = vec![0.0; cols];

        for j in 0..cols {
            let column = x.column(j);
            let m: f64 = column.sum() / rows;
            let var: f64 = column.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / rows;
            mean[j] = m;
            let s = var.sqrt();
            std[j] = if s > 0.0 { s } else { 1.0 };
        }

        Self { mean, std }
    }

    /// Number of features this scaler was fitted on
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Scale a whole matrix
    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.mean[j]) / self.std[j];
            }
        }
        out
    }

    /// Scale a single feature vector
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, &v)| (v - self.mean[j]) / self.std[j])
            .collect()
    }
}
