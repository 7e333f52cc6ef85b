//! Feature records and frequency band tables

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named frequency band with its edges in Hz
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub name: &'static str,
    pub low_hz: f32,
    pub high_hz: f32,
}

/// Five-band table used by the full-fidelity extractor
pub const FIVE_BANDS: &[Band] = &[
    Band { name: "bass", low_hz: 20.0, high_hz: 250.0 },
    Band { name: "low_mids", low_hz: 250.0, high_hz: 500.0 },
    Band { name: "mids", low_hz: 500.0, high_hz: 2000.0 },
    Band { name: "high_mids", low_hz: 2000.0, high_hz: 4000.0 },
    Band { name: "highs", low_hz: 4000.0, high_hz: 20000.0 },
];

/// Coarse three-band table used by the lightweight extractor
pub const THREE_BANDS: &[Band] = &[
    Band { name: "bass", low_hz: 20.0, high_hz: 250.0 },
    Band { name: "mids", low_hz: 250.0, high_hz: 4000.0 },
    Band { name: "highs", low_hz: 4000.0, high_hz: 20000.0 },
];

/// Which extractor produced a feature record
///
/// The two extractors report `dynamic_range` in different units (signal
/// spread vs. crest factor), so records carry their origin and callers must
/// not compare dynamics across kinds without normalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    #[default]
    FullFidelity,
    Lightweight,
}

impl ExtractorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorKind::FullFidelity => "full_fidelity",
            ExtractorKind::Lightweight => "lightweight",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "full_fidelity" => Some(ExtractorKind::FullFidelity),
            "lightweight" => Some(ExtractorKind::Lightweight),
            _ => None,
        }
    }

    /// Band table this extractor buckets energy into
    pub fn bands(&self) -> &'static [Band] {
        match self {
            ExtractorKind::FullFidelity => FIVE_BANDS,
            ExtractorKind::Lightweight => THREE_BANDS,
        }
    }
}

/// A diagnostic emitted when analysis degrades to a fallback value
///
/// Degraded analysis is not an error: the record stays usable and the
/// diagnostic explains which stage fell back and why.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub stage: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Extracted characteristics of a mix
///
/// Immutable value object created once per analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Magnitude-weighted mean frequency in Hz
    pub spectral_centroid_hz: f32,
    /// Frequency below which 85% of spectral energy sits, in Hz
    pub spectral_rolloff_hz: f32,
    /// sqrt(mean(x^2)) over the analyzed signal
    pub rms_energy: f32,
    /// Spread measure; unit depends on `extractor` (see ExtractorKind)
    pub dynamic_range: f32,
    /// Band name -> energy ratio; ratios sum to 1, or all zero for silence
    pub frequency_balance: BTreeMap<String, f32>,
    /// 1 - |correlation(L, R)|, clamped to [0, 1]; 0 for mono
    pub stereo_width: f32,
    /// Frequency of the strongest positive-frequency bin, in Hz
    pub peak_frequency_hz: f32,
    /// Extractor that produced this record
    pub extractor: ExtractorKind,
}

impl FeatureRecord {
    /// Documented safe-default record used when analysis fails entirely
    pub fn safe_default(extractor: ExtractorKind) -> Self {
        let mut balance = BTreeMap::new();
        balance.insert("bass".to_string(), 0.3);
        balance.insert("mids".to_string(), 0.4);
        balance.insert("highs".to_string(), 0.3);
        Self {
            spectral_centroid_hz: 1000.0,
            spectral_rolloff_hz: 8000.0,
            rms_energy: 0.1,
            dynamic_range: 0.5,
            frequency_balance: balance,
            stereo_width: 0.5,
            peak_frequency_hz: 440.0,
            extractor,
        }
    }

    /// Energy ratio of a named band, 0.0 when absent
    pub fn band_ratio(&self, name: &str) -> f32 {
        self.frequency_balance.get(name).copied().unwrap_or(0.0)
    }

    /// Sum of all band ratios (1.0 for a normalized record, 0.0 for silence)
    pub fn total_band_energy(&self) -> f32 {
        self.frequency_balance.values().sum()
    }

    /// Ratio of everything between bass and highs, regardless of band table
    pub fn mid_ratio(&self) -> f32 {
        self.band_ratio("low_mids") + self.band_ratio("mids") + self.band_ratio("high_mids")
    }

    /// Flatten to the predictor's feature vocabulary
    ///
    /// Keys the extractor does not produce (loudness_lufs, crest_factor,
    /// frequency_spread) are simply absent; the predictor defaults them.
    pub fn to_feature_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("spectral_centroid".to_string(), self.spectral_centroid_hz as f64);
        map.insert("spectral_rolloff".to_string(), self.spectral_rolloff_hz as f64);
        map.insert("rms_energy".to_string(), self.rms_energy as f64);
        map.insert("dynamic_range".to_string(), self.dynamic_range as f64);
        map.insert("bass_energy".to_string(), self.band_ratio("bass") as f64);
        map.insert("mid_energy".to_string(), self.mid_ratio() as f64);
        map.insert("high_energy".to_string(), self.band_ratio("highs") as f64);
        map.insert("stereo_width".to_string(), self.stereo_width as f64);
        map
    }
}
