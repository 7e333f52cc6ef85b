//! Model-independent processing-parameter suggestions
//!
//! Continuous-valued rules: the further a feature sits past its threshold,
//! the stronger the suggested correction. Works whether or not a quality
//! model is trained.

use std::collections::BTreeMap;

use serde::Serialize;

/// Suggested shelving move
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShelfSuggestion {
    pub frequency_hz: f64,
    pub gain_db: f64,
    pub q: f64,
}

/// Suggested high-pass corner
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HighPassSuggestion {
    pub frequency_hz: f64,
    pub q: f64,
}

/// EQ moves, at most one per slot
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EqSuggestions {
    pub low_shelf: Option<ShelfSuggestion>,
    pub high_pass: Option<HighPassSuggestion>,
    pub high_shelf: Option<ShelfSuggestion>,
}

/// Suggested dynamics treatment
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CompressionSuggestion {
    /// Conventional downward compression for overly dynamic material
    Downward {
        threshold_db: f64,
        ratio: f64,
        attack_ms: f64,
        release_ms: f64,
        knee_db: f64,
    },
    /// Parallel blend to restore life to over-compressed material
    Parallel {
        blend_percent: f64,
        threshold_db: f64,
        ratio: f64,
    },
}

/// Suggested stereo-field treatment
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StereoSuggestion {
    pub width_multiplier: f64,
    /// Keep content below this frequency mono
    pub bass_mono_below_hz: f64,
}

/// Full suggestion set plus the order issues should be tackled in
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingSuggestions {
    pub eq: EqSuggestions,
    pub compression: Option<CompressionSuggestion>,
    pub stereo: Option<StereoSuggestion>,
    pub priority_order: Vec<String>,
}

impl ProcessingSuggestions {
    pub fn is_empty(&self) -> bool {
        self.priority_order.is_empty()
    }
}

/// Derive concrete parameter suggestions from a raw feature mapping
pub fn suggest_processing_parameters(features: &BTreeMap<String, f64>) -> ProcessingSuggestions {
    let get = |name: &str| features.get(name).copied().unwrap_or(0.0);
    let mut suggestions = ProcessingSuggestions::default();

    let bass = get("bass_energy");
    let mid = get("mid_energy");
    let high = get("high_energy");
    let total = bass + mid + high;

    if total > 0.0 {
        let bass_ratio = bass / total;
        let high_ratio = high / total;

        if bass_ratio < 0.15 {
            suggestions.eq.low_shelf = Some(ShelfSuggestion {
                frequency_hz: 100.0,
                gain_db: (4.0f64).min((0.15 - bass_ratio) * 20.0),
                q: 0.7,
            });
            suggestions.priority_order.push("bass_boost".to_string());
        } else if bass_ratio > 0.4 {
            suggestions.eq.high_pass = Some(HighPassSuggestion {
                frequency_hz: 60.0 + (bass_ratio - 0.4) * 200.0,
                q: 0.8,
            });
            suggestions.priority_order.push("bass_reduction".to_string());
        }

        if high_ratio < 0.08 {
            suggestions.eq.high_shelf = Some(ShelfSuggestion {
                frequency_hz: 8000.0,
                gain_db: (3.0f64).min((0.08 - high_ratio) * 30.0),
                q: 0.6,
            });
            suggestions.priority_order.push("brightness".to_string());
        }
    }

    let dynamic_range = get("dynamic_range");
    let rms = get("rms_energy");
    if dynamic_range > 0.8 && rms > 0.1 {
        suggestions.compression = Some(CompressionSuggestion::Downward {
            threshold_db: -18.0 + (dynamic_range - 0.8) * 20.0,
            ratio: 2.5 + (2.0f64).min((dynamic_range - 0.8) * 5.0),
            attack_ms: 15.0,
            release_ms: 100.0,
            knee_db: 2.0,
        });
        suggestions.priority_order.push("compression".to_string());
    } else if dynamic_range < 0.15 {
        suggestions.compression = Some(CompressionSuggestion::Parallel {
            blend_percent: 30.0,
            threshold_db: -25.0,
            ratio: 1.5,
        });
        suggestions
            .priority_order
            .push("dynamic_restoration".to_string());
    }

    let stereo_width = features.get("stereo_width").copied().unwrap_or(0.5);
    if stereo_width < 0.3 {
        suggestions.stereo = Some(StereoSuggestion {
            width_multiplier: 1.2 + (0.3 - stereo_width),
            bass_mono_below_hz: 120.0,
        });
        suggestions.priority_order.push("stereo_width".to_string());
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_thin_bass_gets_scaled_shelf() {
        let f = features(&[
            ("bass_energy", 0.05),
            ("mid_energy", 0.75),
            ("high_energy", 0.2),
        ]);
        let s = suggest_processing_parameters(&f);
        let shelf = s.eq.low_shelf.expect("expected a low-shelf suggestion");
        assert!((shelf.frequency_hz - 100.0).abs() < f64::EPSILON);
        // (0.15 - 0.05) * 20 = 2 dB
        assert!((shelf.gain_db - 2.0).abs() < 1e-9);
        assert_eq!(s.priority_order, vec!["bass_boost".to_string()]);
    }

    #[test]
    fn test_shelf_gain_is_capped() {
        let f = features(&[
            ("bass_energy", 0.0),
            ("mid_energy", 0.5),
            ("high_energy", 0.5),
        ]);
        let s = suggest_processing_parameters(&f);
        assert!(s.eq.low_shelf.unwrap().gain_db <= 4.0);
    }

    #[test]
    fn test_bass_heavy_mix_gets_moving_high_pass() {
        let f = features(&[
            ("bass_energy", 0.6),
            ("mid_energy", 0.3),
            ("high_energy", 0.1),
        ]);
        let s = suggest_processing_parameters(&f);
        let hp = s.eq.high_pass.expect("expected a high-pass suggestion");
        // 60 + (0.6 - 0.4) * 200 = 100 Hz
        assert!((hp.frequency_hz - 100.0).abs() < 1e-9);
        assert!(s.priority_order.contains(&"bass_reduction".to_string()));
    }

    #[test]
    fn test_dynamic_mix_gets_downward_compression() {
        let f = features(&[
            ("bass_energy", 0.25),
            ("mid_energy", 0.55),
            ("high_energy", 0.2),
            ("dynamic_range", 0.95),
            ("rms_energy", 0.3),
        ]);
        let s = suggest_processing_parameters(&f);
        match s.compression.expect("expected compression") {
            CompressionSuggestion::Downward {
                threshold_db,
                ratio,
                knee_db,
                ..
            } => {
                // -18 + 0.15 * 20 = -15 dB; 2.5 + min(2, 0.75) = 3.25
                assert!((threshold_db - (-15.0)).abs() < 1e-9);
                assert!((ratio - 3.25).abs() < 1e-9);
                assert!((knee_db - 2.0).abs() < f64::EPSILON);
            }
            other => panic!("expected downward compression, got {other:?}"),
        }
    }

    #[test]
    fn test_squashed_mix_gets_parallel_compression() {
        let f = features(&[
            ("bass_energy", 0.25),
            ("mid_energy", 0.55),
            ("high_energy", 0.2),
            ("dynamic_range", 0.05),
            ("rms_energy", 0.3),
        ]);
        let s = suggest_processing_parameters(&f);
        assert!(matches!(
            s.compression,
            Some(CompressionSuggestion::Parallel { .. })
        ));
        assert!(s
            .priority_order
            .contains(&"dynamic_restoration".to_string()));
    }

    #[test]
    fn test_narrow_mix_gets_widening() {
        let f = features(&[
            ("bass_energy", 0.25),
            ("mid_energy", 0.55),
            ("high_energy", 0.2),
            ("stereo_width", 0.1),
        ]);
        let s = suggest_processing_parameters(&f);
        let stereo = s.stereo.expect("expected a stereo suggestion");
        assert!((stereo.width_multiplier - 1.4).abs() < 1e-9);
        assert!((stereo.bass_mono_below_hz - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_healthy_mix_needs_nothing() {
        let f = features(&[
            ("bass_energy", 0.25),
            ("mid_energy", 0.55),
            ("high_energy", 0.2),
            ("dynamic_range", 0.5),
            ("rms_energy", 0.3),
            ("stereo_width", 0.6),
        ]);
        let s = suggest_processing_parameters(&f);
        assert!(s.is_empty());
        assert!(s.compression.is_none());
        assert!(s.stereo.is_none());
    }
}
