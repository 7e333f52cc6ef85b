//! Quality prediction for Mixwise
//!
//! Trains a tree-ensemble regressor mapping a fixed-order feature vector to
//! a 0-10 professional-quality rating, then serves 0-1 quality scores with
//! improvement-area tags. A separate, model-independent rule set suggests
//! concrete processing parameters.
//!
//! The trained model (regressor + fitted scaler + feature ordering) is one
//! immutable snapshot swapped atomically on retrain, so concurrent readers
//! never observe a half-updated pair.

mod ensemble;
mod error;
mod persist;
mod predictor;
mod scaler;
mod suggest;
mod tree;

pub use ensemble::{ModelKind, Regressor};
pub use error::PredictError;
pub use persist::{load_model, save_model};
pub use predictor::{
    improvement_areas, QualityCategory, QualityPrediction, QualityPredictor, TrainedModel,
    TrainingReport, FEATURE_NAMES,
};
pub use scaler::StandardScaler;
pub use suggest::{
    suggest_processing_parameters, CompressionSuggestion, EqSuggestions, HighPassSuggestion,
    ProcessingSuggestions, ShelfSuggestion, StereoSuggestion,
};
pub use tree::{RegressionTree, TreeConfig};
