//! Decision engine: feature record -> processing chain
//!
//! Pure and deterministic. All mix-engineering heuristics live here; the
//! processing engine just executes what this module decides.

use std::fmt;
use std::str::FromStr;

use mixwise_analysis::FeatureRecord;
use serde::{Deserialize, Serialize};

use crate::chain::{
    CompressorParams, EqSettings, HighPassParams, ProcessingChain, ProcessingStep,
    SaturationMode, SaturationParams, ShelfParams, StyleTarget,
};

/// Target mix character requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStyle {
    #[default]
    Balanced,
    Bright,
    Warm,
    Vintage,
}

impl TargetStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStyle::Balanced => "balanced",
            TargetStyle::Bright => "bright",
            TargetStyle::Warm => "warm",
            TargetStyle::Vintage => "vintage",
        }
    }

    /// Styles whose point is added warmth/color
    fn wants_saturation(&self) -> bool {
        matches!(self, TargetStyle::Warm | TargetStyle::Vintage)
    }

    /// Styles that care about top-end presence
    fn wants_brightness(&self) -> bool {
        matches!(self, TargetStyle::Bright | TargetStyle::Balanced)
    }
}

impl fmt::Display for TargetStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanced" => Ok(TargetStyle::Balanced),
            "bright" => Ok(TargetStyle::Bright),
            "warm" => Ok(TargetStyle::Warm),
            "vintage" => Ok(TargetStyle::Vintage),
            other => Err(format!(
                "unknown style '{other}' (expected balanced, bright, warm, or vintage)"
            )),
        }
    }
}

/// Low-shelf boost applied when the bass share falls below 15%
const LOW_SHELF_BOOST: ShelfParams = ShelfParams { freq_hz: 100.0, gain_db: 2.5, q: 0.7 };

/// High-pass applied when the bass share exceeds 35%
const BASS_TRIM_HIGH_PASS: HighPassParams = HighPassParams { freq_hz: 60.0, q: 0.7 };

/// High-shelf boost applied when the top end lacks energy
const HIGH_SHELF_BOOST: ShelfParams = ShelfParams { freq_hz: 10000.0, gain_db: 1.8, q: 0.7 };

/// Compression engaged above this dynamic-range reading (signal-spread units)
const COMPRESSION_THRESHOLD: f32 = 0.7;

/// Below this, the source reads as over-compressed
const OVER_COMPRESSED_THRESHOLD: f32 = 0.2;

const COMPRESSOR: CompressorParams = CompressorParams {
    threshold_db: -15.0,
    ratio: 3.5,
    attack_ms: 15.0,
    release_ms: 120.0,
};

const WARMTH_SATURATION: SaturationParams = SaturationParams {
    drive: 0.15,
    mode: SaturationMode::Soft,
};

/// Build an adaptive processing chain for a mix
///
/// EQ sub-adjustments combine into a single step; the bass boost and the
/// bass-trim high-pass are mutually exclusive per call. Compression and
/// saturation decisions are independent of the EQ outcome.
pub fn decide(features: &FeatureRecord, style: TargetStyle) -> ProcessingChain {
    let mut steps = Vec::new();

    let total = features.total_band_energy();
    let mut eq = EqSettings::default();
    if total > 0.0 {
        let bass_ratio = features.band_ratio("bass") / total;
        if bass_ratio < 0.15 {
            eq.low_shelf = Some(LOW_SHELF_BOOST);
        } else if bass_ratio > 0.35 {
            eq.high_pass = Some(BASS_TRIM_HIGH_PASS);
        }

        let highs_ratio = features.band_ratio("highs") / total;
        if highs_ratio < 0.08 && style.wants_brightness() {
            eq.high_shelf = Some(HIGH_SHELF_BOOST);
        }
    }
    if !eq.is_empty() {
        steps.push(ProcessingStep::Eq(eq));
    }

    if features.dynamic_range > COMPRESSION_THRESHOLD {
        steps.push(ProcessingStep::Compression(COMPRESSOR));
    } else if features.dynamic_range < OVER_COMPRESSED_THRESHOLD {
        steps.push(ProcessingStep::GentleExpansion);
    }

    if style.wants_saturation() {
        steps.push(ProcessingStep::Saturation(WARMTH_SATURATION));
    }

    let estimated_improvement = (0.2 * steps.len() as f32).min(0.8);

    ProcessingChain {
        name: format!("adaptive_{style}"),
        steps,
        target: StyleTarget {
            brightness: if style == TargetStyle::Bright { 0.7 } else { 0.5 },
            warmth: if style == TargetStyle::Warm { 0.8 } else { 0.4 },
            punch: 0.6,
            clarity: 0.8,
        },
        estimated_improvement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixwise_analysis::ExtractorKind;
    use std::collections::BTreeMap;

    fn record(bass: f32, mids: f32, highs: f32, dynamic_range: f32) -> FeatureRecord {
        let mut balance = BTreeMap::new();
        balance.insert("bass".to_string(), bass);
        balance.insert("mids".to_string(), mids);
        balance.insert("highs".to_string(), highs);
        FeatureRecord {
            spectral_centroid_hz: 1000.0,
            spectral_rolloff_hz: 8000.0,
            rms_energy: 0.2,
            dynamic_range,
            frequency_balance: balance,
            stereo_width: 0.5,
            peak_frequency_hz: 440.0,
            extractor: ExtractorKind::FullFidelity,
        }
    }

    fn eq_of(chain: &ProcessingChain) -> Option<EqSettings> {
        chain.steps.iter().find_map(|s| match s {
            ProcessingStep::Eq(eq) => Some(*eq),
            _ => None,
        })
    }

    #[test]
    fn test_thin_dynamic_mix_gets_shelf_and_compression() {
        // bass 0.05, highs 0.2, dynamic range 0.9, balanced style
        let chain = decide(&record(0.05, 0.75, 0.2, 0.9), TargetStyle::Balanced);

        let eq = eq_of(&chain).expect("expected an eq step");
        let shelf = eq.low_shelf.expect("expected a low-shelf boost");
        assert!((shelf.freq_hz - 100.0).abs() < f32::EPSILON);
        assert!(shelf.gain_db >= 2.5 && shelf.gain_db <= 3.0);
        assert!(eq.high_pass.is_none());
        // highs at 0.2 need no brightness help
        assert!(eq.high_shelf.is_none());

        let comp = chain
            .steps
            .iter()
            .find_map(|s| match s {
                ProcessingStep::Compression(c) => Some(*c),
                _ => None,
            })
            .expect("expected a compression step");
        assert!(comp.threshold_db <= -12.0 && comp.threshold_db >= -15.0);
        assert!(comp.ratio >= 3.0);
    }

    #[test]
    fn test_bass_heavy_mix_gets_high_pass_not_boost() {
        let chain = decide(&record(0.5, 0.4, 0.1, 0.5), TargetStyle::Balanced);
        let eq = eq_of(&chain).expect("expected an eq step");
        assert!(eq.low_shelf.is_none());
        let hp = eq.high_pass.expect("expected a high-pass");
        assert!(hp.freq_hz >= 40.0 && hp.freq_hz <= 60.0);
    }

    #[test]
    fn test_dull_mix_gets_high_shelf_for_bright_styles_only() {
        let rec = record(0.3, 0.66, 0.04, 0.5);
        let bright = decide(&rec, TargetStyle::Bright);
        assert!(eq_of(&bright).unwrap().high_shelf.is_some());

        let warm = decide(&rec, TargetStyle::Warm);
        // Warm style skips the brightness shelf; no other EQ is needed here,
        // so the chain carries only the saturation step.
        assert!(eq_of(&warm).is_none());
        assert!(warm
            .steps
            .iter()
            .any(|s| matches!(s, ProcessingStep::Saturation(_))));
    }

    #[test]
    fn test_over_compressed_mix_gets_expansion_marker() {
        let chain = decide(&record(0.25, 0.55, 0.2, 0.1), TargetStyle::Balanced);
        assert!(chain
            .steps
            .iter()
            .any(|s| matches!(s, ProcessingStep::GentleExpansion)));
        assert!(!chain
            .steps
            .iter()
            .any(|s| matches!(s, ProcessingStep::Compression(_))));
    }

    #[test]
    fn test_warm_and_vintage_append_tape_saturation() {
        for style in [TargetStyle::Warm, TargetStyle::Vintage] {
            let chain = decide(&record(0.25, 0.55, 0.2, 0.5), style);
            let sat = chain
                .steps
                .iter()
                .find_map(|s| match s {
                    ProcessingStep::Saturation(p) => Some(*p),
                    _ => None,
                })
                .expect("expected saturation");
            assert!((sat.drive - 0.15).abs() < f32::EPSILON);
            assert_eq!(sat.mode, SaturationMode::Soft);
        }
    }

    #[test]
    fn test_chain_metadata() {
        let chain = decide(&record(0.05, 0.75, 0.2, 0.9), TargetStyle::Bright);
        assert_eq!(chain.name, "adaptive_bright");
        assert!((chain.target.brightness - 0.7).abs() < f32::EPSILON);
        assert!((chain.target.punch - 0.6).abs() < f32::EPSILON);
        let expected = (0.2 * chain.steps.len() as f32).min(0.8);
        assert!((chain.estimated_improvement - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn test_improvement_estimate_caps_at_point_eight() {
        // Even a hypothetical five-step chain caps at 0.8
        assert!((0.2f32 * 5.0).min(0.8) <= 0.8);
        let chain = decide(&record(0.05, 0.9, 0.01, 0.9), TargetStyle::Warm);
        assert!(chain.estimated_improvement <= 0.8);
    }

    #[test]
    fn test_silent_record_produces_no_eq() {
        let chain = decide(&record(0.0, 0.0, 0.0, 0.5), TargetStyle::Balanced);
        assert!(eq_of(&chain).is_none());
    }

    #[test]
    fn test_decide_is_deterministic() {
        let rec = record(0.1, 0.7, 0.2, 0.8);
        let a = decide(&rec, TargetStyle::Balanced);
        let b = decide(&rec, TargetStyle::Balanced);
        assert_eq!(a.steps, b.steps);
        assert_eq!(a.name, b.name);
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("warm".parse::<TargetStyle>().unwrap(), TargetStyle::Warm);
        assert_eq!(
            "vintage".parse::<TargetStyle>().unwrap(),
            TargetStyle::Vintage
        );
        assert!("shiny".parse::<TargetStyle>().is_err());
    }
}
