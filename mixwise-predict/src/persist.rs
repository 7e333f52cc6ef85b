//! Model persistence
//!
//! One JSON artifact bundles the regressor, the fitted scaler, the ordered
//! feature-name list, and the model-family tag. Loading validates that the
//! three agree on feature count before the model can serve predictions.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::PredictError;
use crate::predictor::TrainedModel;

/// Write a trained model to disk
pub fn save_model(model: &TrainedModel, path: &Path) -> Result<(), PredictError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string(model)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "saved model artifact");
    Ok(())
}

/// Load a model artifact and validate its internal consistency
pub fn load_model(path: &Path) -> Result<TrainedModel, PredictError> {
    let json = fs::read_to_string(path)?;
    let model: TrainedModel = serde_json::from_str(&json)?;

    let names = model.feature_names.len();
    if model.scaler.len() != names {
        return Err(PredictError::FeatureCountMismatch {
            expected: names,
            got: model.scaler.len(),
        });
    }
    if model.regressor.n_features() != names {
        return Err(PredictError::FeatureCountMismatch {
            expected: names,
            got: model.regressor.n_features(),
        });
    }

    info!(path = %path.display(), features = names, "loaded model artifact");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::ModelKind;
    use crate::predictor::{QualityPredictor, FEATURE_NAMES};
    use ndarray::Array2;
    use std::collections::BTreeMap;

    fn trained_predictor() -> QualityPredictor {
        let n = 30;
        let x = Array2::from_shape_fn((n, FEATURE_NAMES.len()), |(i, j)| {
            (i as f64 + 1.0) * (j as f64 + 1.0) % 7.0
        });
        let y: Vec<f64> = (0..n).map(|i| (i % 10) as f64).collect();
        let predictor = QualityPredictor::new(ModelKind::GradientBoosting);
        predictor.train(&x, &y, 0.2).unwrap();
        predictor
    }

    #[test]
    fn test_model_round_trip() {
        let predictor = trained_predictor();
        let model = predictor.snapshot().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_model(&model, &path).unwrap();

        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded.kind, model.kind);
        assert_eq!(loaded.feature_names, model.feature_names);

        // A fresh predictor serving the loaded artifact agrees with the
        // original on the same input
        let restored = QualityPredictor::new(loaded.kind);
        restored.install(loaded);

        let mut features = BTreeMap::new();
        features.insert("rms_energy".to_string(), 0.4);
        features.insert("bass_energy".to_string(), 0.3);
        let a = predictor.predict(&features).unwrap();
        let b = restored.predict(&features).unwrap();
        assert!((a.overall_quality - b.overall_quality).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_inconsistent_artifact() {
        let predictor = trained_predictor();
        let mut model = (*predictor.snapshot().unwrap()).clone();
        // Corrupt the feature list length
        model.feature_names.push("bogus_feature".to_string());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_model(&model, &path).unwrap();

        assert!(matches!(
            load_model(&path),
            Err(PredictError::FeatureCountMismatch { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            load_model(Path::new("/nonexistent/model.json")),
            Err(PredictError::Io(_))
        ));
    }
}
