//! Balance scoring and qualitative mix assessment
//!
//! Reporting helpers layered on top of a feature record: per-band closeness
//! to an ideal energy distribution, a coarse style recommendation, and
//! human-readable level/balance advice. These inform display output; the
//! decision engine applies its own rule set when building a chain.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::features::{ExtractorKind, FeatureRecord};

/// Ideal energy share per band for a neutral, professional-sounding mix
const IDEAL_RATIOS: &[(&str, f32)] = &[
    ("bass", 0.25),
    ("low_mids", 0.20),
    ("mids", 0.30),
    ("high_mids", 0.15),
    ("highs", 0.10),
];

fn ideal_ratio(band: &str) -> f32 {
    IDEAL_RATIOS
        .iter()
        .find(|(name, _)| *name == band)
        .map(|(_, ratio)| *ratio)
        .unwrap_or(0.2)
}

/// Score each band by closeness to its ideal share
///
/// Scores are in [0, 1], 1 meaning the band sits exactly at its ideal ratio.
/// A silent record (zero total energy) scores every band 0.
pub fn balance_scores(record: &FeatureRecord) -> BTreeMap<String, f32> {
    let total = record.total_band_energy();
    record
        .frequency_balance
        .iter()
        .map(|(band, &ratio)| {
            let score = if total > 0.0 {
                let ideal = ideal_ratio(band);
                (1.0 - (ratio - ideal).abs() / ideal).max(0.0)
            } else {
                0.0
            };
            (band.clone(), score)
        })
        .collect()
}

/// Qualitative character label for display purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleHint {
    Bright,
    Warm,
    #[default]
    Balanced,
}

impl StyleHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleHint::Bright => "bright",
            StyleHint::Warm => "warm",
            StyleHint::Balanced => "balanced",
        }
    }
}

/// Threshold below which dynamics count as over-compressed, per unit
fn flat_dynamics_threshold(kind: ExtractorKind) -> f32 {
    match kind {
        ExtractorKind::FullFidelity => 0.2,
        // Crest-factor units: a sine sits at ~1.41, heavy limiting below 2.0
        ExtractorKind::Lightweight => 2.0,
    }
}

/// Recommend an enhancement character from the record alone
///
/// Kept deliberately close to the decision engine's thresholds but allowed
/// to diverge: this feeds reports, not processing.
pub fn recommend_style(record: &FeatureRecord) -> StyleHint {
    if record.total_band_energy() <= 0.0 {
        return StyleHint::Balanced;
    }

    let bass = record.band_ratio("bass");
    let highs = record.band_ratio("highs");

    if highs < 0.05 {
        return StyleHint::Bright;
    }
    if bass > 0.4 {
        return StyleHint::Balanced;
    }
    if record.dynamic_range < flat_dynamics_threshold(record.extractor) {
        return StyleHint::Warm;
    }

    let scores = balance_scores(record);
    let avg = scores.values().sum::<f32>() / scores.len().max(1) as f32;
    if avg < 0.6 {
        StyleHint::Balanced
    } else {
        StyleHint::Warm
    }
}

/// Plain-language observations about a mix
#[derive(Debug, Clone, Serialize)]
pub struct MixAdvice {
    pub suggestions: Vec<String>,
    pub assessment: String,
}

/// Derive level/balance/dynamics advice strings from a record
pub fn quick_advice(record: &FeatureRecord) -> MixAdvice {
    let mut suggestions = Vec::new();

    if record.rms_energy < 0.1 {
        suggestions.push("Track seems quiet - consider raising the level".to_string());
    } else if record.rms_energy > 0.7 {
        suggestions.push("Track seems loud - consider lowering the level".to_string());
    }

    let bass = record.band_ratio("bass");
    if bass < 0.1 {
        suggestions.push("Low bass content - consider a bass boost".to_string());
    } else if bass > 0.5 {
        suggestions.push("Heavy bass content - consider a high-pass filter".to_string());
    }

    let highs = record.band_ratio("highs");
    if highs < 0.05 {
        suggestions.push("Limited high frequencies - consider brightness enhancement".to_string());
    } else if highs > 0.3 {
        suggestions.push("Bright mix - might be harsh".to_string());
    }

    let (flat, wild) = match record.extractor {
        ExtractorKind::FullFidelity => (0.2, 0.8),
        ExtractorKind::Lightweight => (2.0, 10.0),
    };
    if record.dynamic_range < flat {
        suggestions.push("Heavily compressed - consider restoring dynamics".to_string());
    } else if record.dynamic_range > wild {
        suggestions.push("Very dynamic - might need compression for consistency".to_string());
    }

    MixAdvice {
        assessment: overall_assessment(record),
        suggestions,
    }
}

fn overall_assessment(record: &FeatureRecord) -> String {
    let mut issues = 0;

    if record.rms_energy < 0.05 || record.rms_energy > 0.8 {
        issues += 1;
    }
    let bass = record.band_ratio("bass");
    if bass < 0.08 || bass > 0.6 {
        issues += 1;
    }
    let highs = record.band_ratio("highs");
    if highs < 0.03 || highs > 0.4 {
        issues += 1;
    }
    let (low, high) = match record.extractor {
        ExtractorKind::FullFidelity => (0.15, 0.85),
        ExtractorKind::Lightweight => (1.5, 15.0),
    };
    if record.dynamic_range < low || record.dynamic_range > high {
        issues += 1;
    }

    match issues {
        0 => "Mix sounds well-balanced".to_string(),
        1 | 2 => "Mix has minor issues that could be improved".to_string(),
        _ => "Mix needs significant improvement".to_string(),
    }
}
