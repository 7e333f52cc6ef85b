//! Quality predictor: train, predict, and improvement analysis

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::{Array2, Axis};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ensemble::{ModelKind, Regressor};
use crate::error::PredictError;
use crate::scaler::StandardScaler;

/// The fixed feature vocabulary, in training order
pub const FEATURE_NAMES: [&str; 11] = [
    "spectral_centroid",
    "spectral_rolloff",
    "rms_energy",
    "dynamic_range",
    "bass_energy",
    "mid_energy",
    "high_energy",
    "stereo_width",
    "loudness_lufs",
    "crest_factor",
    "frequency_spread",
];

/// Fixed split/sampling seed so retraining on the same data reproduces
const SPLIT_SEED: u64 = 42;

/// Documented placeholder, not a calibrated uncertainty estimate
const PREDICTION_CONFIDENCE: f64 = 0.85;

/// One immutable trained snapshot: regressor, fitted scaler, and the exact
/// feature ordering they were trained with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub kind: ModelKind,
    pub regressor: Regressor,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
}

/// Metrics reported by a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub train_r2: f64,
    pub validation_r2: f64,
    pub validation_mae: f64,
    pub validation_rmse: f64,
    /// (feature, share of impurity reduction), sorted descending
    pub feature_importance: Vec<(String, f64)>,
}

/// Coarse quality label derived from the 0-1 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCategory {
    Professional,
    Good,
    NeedsWork,
    RequiresMajorImprovement,
}

impl QualityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityCategory::Professional => "professional",
            QualityCategory::Good => "good",
            QualityCategory::NeedsWork => "needs_work",
            QualityCategory::RequiresMajorImprovement => "requires_major_improvement",
        }
    }

    fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            QualityCategory::Professional
        } else if score >= 0.6 {
            QualityCategory::Good
        } else if score >= 0.4 {
            QualityCategory::NeedsWork
        } else {
            QualityCategory::RequiresMajorImprovement
        }
    }
}

/// A quality verdict for one mix
#[derive(Debug, Clone, Serialize)]
pub struct QualityPrediction {
    /// Predicted quality in [0, 1]
    pub overall_quality: f64,
    /// Same verdict on the 0-10 rating scale
    pub predicted_rating: f64,
    pub confidence: f64,
    pub quality_category: QualityCategory,
    /// Tags derived from raw feature values, independent of the model
    pub improvement_areas: Vec<String>,
}

/// Trains and serves mix-quality predictions
///
/// The trained state is a single snapshot behind an RwLock: `train` builds
/// the whole model off to the side and swaps it in with one write, so a
/// concurrent `predict` sees either the old pair or the new one, never a
/// mix of both.
pub struct QualityPredictor {
    kind: ModelKind,
    model: RwLock<Option<Arc<TrainedModel>>>,
}

impl Default for QualityPredictor {
    fn default() -> Self {
        Self::new(ModelKind::RandomForest)
    }
}

impl QualityPredictor {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            model: RwLock::new(None),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_some()
    }

    /// The current trained snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    /// Install an externally built model (e.g. loaded from disk)
    pub fn install(&self, model: TrainedModel) {
        *self.model.write() = Some(Arc::new(model));
    }

    /// Fit the regressor on a feature matrix and 0-10 ratings
    ///
    /// Columns must follow `FEATURE_NAMES`. The scaler is fitted on the
    /// training split only; validation rows are scaled with it.
    pub fn train(
        &self,
        x: &Array2<f64>,
        y: &[f64],
        validation_split: f64,
    ) -> Result<TrainingReport, PredictError> {
        if x.nrows() == 0 {
            return Err(PredictError::EmptyTrainingSet);
        }
        if x.nrows() != y.len() {
            return Err(PredictError::DimensionMismatch {
                rows: x.nrows(),
                targets: y.len(),
            });
        }
        if x.ncols() != FEATURE_NAMES.len() {
            return Err(PredictError::FeatureCountMismatch {
                expected: FEATURE_NAMES.len(),
                got: x.ncols(),
            });
        }
        if !(0.0..1.0).contains(&validation_split) || validation_split <= 0.0 {
            return Err(PredictError::InvalidSplit(validation_split));
        }

        let n = x.nrows();
        let n_val = ((n as f64 * validation_split).round() as usize).max(1);
        let n_train = n.saturating_sub(n_val);
        if n_train < 2 {
            return Err(PredictError::TooFewSamples { needed: 3, got: n });
        }

        let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let (train_idx, val_idx) = indices.split_at(n_train);

        let x_train = x.select(Axis(0), train_idx);
        let x_val = x.select(Axis(0), val_idx);
        let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();
        let y_val: Vec<f64> = val_idx.iter().map(|&i| y[i]).collect();

        let scaler = StandardScaler::fit(x_train.view());
        let x_train_scaled = scaler.transform(x_train.view());
        let x_val_scaled = scaler.transform(x_val.view());

        let regressor = Regressor::fit(self.kind, x_train_scaled.view(), &y_train, &mut rng);

        let pred_train: Vec<f64> = x_train_scaled
            .rows()
            .into_iter()
            .map(|row| regressor.predict_row(&row.to_vec()))
            .collect();
        let pred_val: Vec<f64> = x_val_scaled
            .rows()
            .into_iter()
            .map(|row| regressor.predict_row(&row.to_vec()))
            .collect();

        let mut feature_importance: Vec<(String, f64)> = FEATURE_NAMES
            .iter()
            .map(|&name| name.to_string())
            .zip(regressor.feature_importance())
            .collect();
        feature_importance.sort_by(|a, b| b.1.total_cmp(&a.1));

        let report = TrainingReport {
            train_r2: r2_score(&y_train, &pred_train),
            validation_r2: r2_score(&y_val, &pred_val),
            validation_mae: mean_absolute_error(&y_val, &pred_val),
            validation_rmse: root_mean_squared_error(&y_val, &pred_val),
            feature_importance,
        };

        info!(
            kind = self.kind.as_str(),
            train_r2 = report.train_r2,
            validation_r2 = report.validation_r2,
            "training complete"
        );

        // Atomic snapshot swap: readers see the old or the new model whole
        *self.model.write() = Some(Arc::new(TrainedModel {
            kind: self.kind,
            regressor,
            scaler,
            feature_names: FEATURE_NAMES.iter().map(|&s| s.to_string()).collect(),
        }));

        Ok(report)
    }

    /// Predict mix quality from a named feature mapping
    ///
    /// Missing features default to 0.0; extra keys are ignored. Fails with
    /// `NotTrained` until a train or model load succeeds.
    pub fn predict(
        &self,
        features: &BTreeMap<String, f64>,
    ) -> Result<QualityPrediction, PredictError> {
        let model = self.snapshot().ok_or(PredictError::NotTrained)?;

        let vector: Vec<f64> = model
            .feature_names
            .iter()
            .map(|name| features.get(name).copied().unwrap_or(0.0))
            .collect();
        let scaled = model.scaler.transform_row(&vector);
        let raw_rating = model.regressor.predict_row(&scaled);

        let overall_quality = (raw_rating / 10.0).clamp(0.0, 1.0);

        Ok(QualityPrediction {
            overall_quality,
            predicted_rating: overall_quality * 10.0,
            confidence: PREDICTION_CONFIDENCE,
            quality_category: QualityCategory::from_score(overall_quality),
            improvement_areas: improvement_areas(features),
        })
    }
}

/// Tag likely problem areas from raw (non-normalized) feature values
pub fn improvement_areas(features: &BTreeMap<String, f64>) -> Vec<String> {
    let get = |name: &str| features.get(name).copied().unwrap_or(0.0);
    let mut issues = Vec::new();

    let bass = get("bass_energy");
    let high = get("high_energy");
    let total = bass + get("mid_energy") + high;
    if total > 0.0 {
        let bass_share = bass / total;
        if bass_share < 0.1 {
            issues.push("insufficient_low_end".to_string());
        } else if bass_share > 0.45 {
            issues.push("excessive_bass".to_string());
        }
        if high / total < 0.05 {
            issues.push("lacks_brightness".to_string());
        }
    }

    let dynamic_range = get("dynamic_range");
    if dynamic_range < 0.1 {
        issues.push("over_compressed".to_string());
    } else if dynamic_range > 0.9 {
        issues.push("needs_compression".to_string());
    }

    let stereo_width = features.get("stereo_width").copied().unwrap_or(0.5);
    if stereo_width < 0.2 {
        issues.push("too_narrow".to_string());
    } else if stereo_width > 0.9 {
        issues.push("too_wide".to_string());
    }

    let rms = get("rms_energy");
    if rms < 0.1 {
        issues.push("too_quiet".to_string());
    } else if rms > 0.8 {
        issues.push("too_loud".to_string());
    }

    issues
}

fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|&a| (a - mean) * (a - mean)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| (a - p) * (a - p))
        .sum();
    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    (actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| (a - p) * (a - p))
        .sum::<f64>()
        / actual.len() as f64)
        .sqrt()
}
