//! Feature extraction strategies
//!
//! Two extractors implement the same interface at different fidelity:
//! - `FullFidelityExtractor`: windowed STFT over the whole signal
//! - `LightweightExtractor`: single FFT over the first 8192 samples
//!
//! Extraction never fails for non-empty input. Degraded stages fall back to
//! documented constants and surface a `Diagnostic` instead of an error, so
//! downstream decision code always has a usable record.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::buffer::{rms, SampleBuffer};
use crate::features::{Band, Diagnostic, ExtractorKind, FeatureRecord, FIVE_BANDS, THREE_BANDS};
use crate::stft::{magnitude_spectrum, Stft, FRAME_SIZE, HOP_SIZE};

/// Minimum signal length for windowed spectral analysis
const MIN_ANALYSIS_WINDOW: usize = 1024;

/// Sample cap for the one-shot FFT paths (peak frequency, coarse balance)
const SINGLE_FFT_SAMPLES: usize = 8192;

/// Fallback constants for degraded spectral analysis
const FALLBACK_CENTROID_HZ: f32 = 1000.0;
const FALLBACK_ROLLOFF_HZ: f32 = 8000.0;
const FALLBACK_PEAK_HZ: f32 = 440.0;

/// Fraction of spectral energy below the rolloff frequency
const ROLLOFF_FRACTION: f32 = 0.85;

/// Input errors: these are surfaced, never defaulted
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Cannot analyze an empty buffer")]
    EmptyBuffer,
}

/// The result of one analysis call: a record plus degradation diagnostics
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: FeatureRecord,
    pub diagnostics: Vec<Diagnostic>,
}

/// Strategy interface shared by both extractors
pub trait FeatureExtractor {
    /// Which fidelity level this extractor provides
    fn kind(&self) -> ExtractorKind;

    /// Extract a feature record from a buffer
    ///
    /// Fails only for empty input. Internal failures degrade to the
    /// documented safe defaults with diagnostics attached.
    fn extract(&self, buffer: &SampleBuffer) -> Result<Extraction, AnalysisError>;
}

/// STFT-based extractor producing the five-band feature record
pub struct FullFidelityExtractor {
    frame_size: usize,
    hop: usize,
}

impl Default for FullFidelityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FullFidelityExtractor {
    pub fn new() -> Self {
        Self {
            frame_size: FRAME_SIZE,
            hop: HOP_SIZE,
        }
    }

    /// Centroid, rolloff, and band balance from overlapping frames
    ///
    /// Returns None when no frame carries energy; callers fall back.
    fn spectral_features(
        &self,
        mono: &[f32],
        sample_rate: u32,
    ) -> Option<(f32, f32, BTreeMap<String, f32>)> {
        let mut stft = Stft::new(self.frame_size);
        let spectra = stft.frame_spectra(mono, self.hop);
        let bin_width = sample_rate as f32 / self.frame_size as f32;

        let mut centroid_sum = 0.0f64;
        let mut rolloff_sum = 0.0f64;
        let mut voiced_frames = 0usize;

        // Per-band magnitude accumulation across every frame and bin
        let mut band_sums = vec![0.0f64; FIVE_BANDS.len()];
        let mut band_counts = vec![0usize; FIVE_BANDS.len()];

        for mags in &spectra {
            let total: f32 = mags.iter().sum();
            if total > 0.0 {
                // Magnitude-weighted mean frequency
                let weighted: f32 = mags
                    .iter()
                    .enumerate()
                    .map(|(i, &m)| i as f32 * bin_width * m)
                    .sum();
                centroid_sum += (weighted / total) as f64;

                // Frequency below which ROLLOFF_FRACTION of magnitude sits
                let target = total * ROLLOFF_FRACTION;
                let mut cumulative = 0.0f32;
                let mut rolloff_bin = mags.len().saturating_sub(1);
                for (i, &m) in mags.iter().enumerate() {
                    cumulative += m;
                    if cumulative >= target {
                        rolloff_bin = i;
                        break;
                    }
                }
                rolloff_sum += (rolloff_bin as f32 * bin_width) as f64;
                voiced_frames += 1;
            }

            for (band_idx, band) in FIVE_BANDS.iter().enumerate() {
                for (i, &m) in mags.iter().enumerate() {
                    let freq = i as f32 * bin_width;
                    if freq >= band.low_hz && freq <= band.high_hz {
                        band_sums[band_idx] += m as f64;
                        band_counts[band_idx] += 1;
                    }
                }
            }
        }

        if voiced_frames == 0 {
            return None;
        }

        let centroid = (centroid_sum / voiced_frames as f64) as f32;
        let rolloff = (rolloff_sum / voiced_frames as f64) as f32;
        let balance = normalize_band_means(FIVE_BANDS, &band_sums, &band_counts);
        Some((centroid, rolloff, balance))
    }
}

impl FeatureExtractor for FullFidelityExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::FullFidelity
    }

    fn extract(&self, buffer: &SampleBuffer) -> Result<Extraction, AnalysisError> {
        if buffer.is_empty() {
            return Err(AnalysisError::EmptyBuffer);
        }

        let mut diagnostics = Vec::new();
        let mono = buffer.downmix_mono();

        let rms_energy = rms(&mono);
        let dynamic_range = signal_spread(&mono);

        let (spectral_centroid_hz, spectral_rolloff_hz, frequency_balance) =
            if mono.len() >= MIN_ANALYSIS_WINDOW {
                match self.spectral_features(&mono, buffer.sample_rate()) {
                    Some(features) => features,
                    None => {
                        push_diagnostic(
                            &mut diagnostics,
                            "spectral",
                            "no frame energy; using fallback centroid/rolloff",
                        );
                        (
                            FALLBACK_CENTROID_HZ,
                            FALLBACK_ROLLOFF_HZ,
                            zero_balance(FIVE_BANDS),
                        )
                    }
                }
            } else {
                push_diagnostic(
                    &mut diagnostics,
                    "spectral",
                    format!(
                        "buffer of {} samples is below the {} sample analysis window",
                        mono.len(),
                        MIN_ANALYSIS_WINDOW
                    ),
                );
                // Coarse single-FFT balance still works on short signals
                let balance = single_fft_balance(&mono, buffer.sample_rate(), FIVE_BANDS);
                (FALLBACK_CENTROID_HZ, FALLBACK_ROLLOFF_HZ, balance)
            };

        let peak_frequency_hz = match peak_frequency(&mono, buffer.sample_rate()) {
            Some(freq) => freq,
            None => {
                push_diagnostic(
                    &mut diagnostics,
                    "peak_frequency",
                    "no positive-frequency energy; using 440 Hz",
                );
                FALLBACK_PEAK_HZ
            }
        };

        let stereo_width = stereo_width(buffer, &mut diagnostics);

        Ok(Extraction {
            record: FeatureRecord {
                spectral_centroid_hz,
                spectral_rolloff_hz,
                rms_energy,
                dynamic_range,
                frequency_balance,
                stereo_width,
                peak_frequency_hz,
                extractor: ExtractorKind::FullFidelity,
            },
            diagnostics,
        })
    }
}

/// Dependency-light extractor: one FFT, three bands, crest-style dynamics
///
/// Analyzes the left channel only. Its `dynamic_range` is peak/(rms + eps),
/// a different unit from the full extractor's signal spread.
pub struct LightweightExtractor {
    max_samples: usize,
}

impl Default for LightweightExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LightweightExtractor {
    pub fn new() -> Self {
        Self {
            max_samples: SINGLE_FFT_SAMPLES,
        }
    }
}

impl FeatureExtractor for LightweightExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Lightweight
    }

    fn extract(&self, buffer: &SampleBuffer) -> Result<Extraction, AnalysisError> {
        if buffer.is_empty() {
            return Err(AnalysisError::EmptyBuffer);
        }

        let mut diagnostics = Vec::new();
        let left = buffer.left();

        let rms_energy = rms(&left);
        let peak = left.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        let dynamic_range = peak / (rms_energy + 1e-10);

        let head = &left[..left.len().min(self.max_samples)];
        let mags = magnitude_spectrum(head);
        let bin_width = buffer.sample_rate() as f32 / head.len() as f32;
        let frequency_balance = balance_from_spectrum(&mags, bin_width, THREE_BANDS);

        let peak_frequency_hz = match peak_from_spectrum(&mags, bin_width) {
            Some(freq) => freq,
            None => {
                push_diagnostic(
                    &mut diagnostics,
                    "peak_frequency",
                    "no positive-frequency energy; using 440 Hz",
                );
                FALLBACK_PEAK_HZ
            }
        };

        let stereo_width = stereo_width(buffer, &mut diagnostics);

        Ok(Extraction {
            record: FeatureRecord {
                // The lightweight path carries no windowed transform; these
                // stay at the documented fixed values.
                spectral_centroid_hz: FALLBACK_CENTROID_HZ,
                spectral_rolloff_hz: FALLBACK_ROLLOFF_HZ,
                rms_energy,
                dynamic_range,
                frequency_balance,
                stereo_width,
                peak_frequency_hz,
                extractor: ExtractorKind::Lightweight,
            },
            diagnostics,
        })
    }
}

fn push_diagnostic(diagnostics: &mut Vec<Diagnostic>, stage: &'static str, msg: impl Into<String>) {
    let message = msg.into();
    warn!(stage, "{message}");
    diagnostics.push(Diagnostic::new(stage, message));
}

/// max(sample) - min(sample) over a mono slice
fn signal_spread(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let max = samples.iter().copied().fold(f32::MIN, f32::max);
    let min = samples.iter().copied().fold(f32::MAX, f32::min);
    max - min
}

/// Strongest positive-frequency bin of a one-shot FFT over the signal head
fn peak_frequency(samples: &[f32], sample_rate: u32) -> Option<f32> {
    let head = &samples[..samples.len().min(SINGLE_FFT_SAMPLES)];
    let mags = magnitude_spectrum(head);
    let bin_width = sample_rate as f32 / head.len() as f32;
    peak_from_spectrum(&mags, bin_width)
}

fn peak_from_spectrum(mags: &[f32], bin_width: f32) -> Option<f32> {
    if mags.len() < 3 {
        return None;
    }
    // Skip DC; only strictly positive frequencies count
    let positive = &mags[1..mags.len() / 2];
    let (idx, &magnitude) = positive
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    if magnitude <= 0.0 {
        return None;
    }
    Some((idx + 1) as f32 * bin_width)
}

/// Bucket a one-shot spectrum into band ratios
fn balance_from_spectrum(mags: &[f32], bin_width: f32, bands: &[Band]) -> BTreeMap<String, f32> {
    let mut sums = vec![0.0f64; bands.len()];
    let mut counts = vec![0usize; bands.len()];
    if mags.len() >= 3 {
        let positive = &mags[1..mags.len() / 2];
        for (band_idx, band) in bands.iter().enumerate() {
            for (i, &m) in positive.iter().enumerate() {
                let freq = (i + 1) as f32 * bin_width;
                if freq >= band.low_hz && freq <= band.high_hz {
                    sums[band_idx] += m as f64;
                    counts[band_idx] += 1;
                }
            }
        }
    }
    normalize_band_means(bands, &sums, &counts)
}

fn zero_balance(bands: &[Band]) -> BTreeMap<String, f32> {
    bands.iter().map(|b| (b.name.to_string(), 0.0)).collect()
}

fn single_fft_balance(samples: &[f32], sample_rate: u32, bands: &[Band]) -> BTreeMap<String, f32> {
    let head = &samples[..samples.len().min(SINGLE_FFT_SAMPLES)];
    let mags = magnitude_spectrum(head);
    let bin_width = sample_rate as f32 / head.len().max(1) as f32;
    balance_from_spectrum(&mags, bin_width, bands)
}

/// Mean magnitude per band, normalized so the ratios sum to 1
///
/// Total energy of zero (silence) yields all-zero ratios rather than NaN.
fn normalize_band_means(
    bands: &[Band],
    sums: &[f64],
    counts: &[usize],
) -> BTreeMap<String, f32> {
    let means: Vec<f64> = sums
        .iter()
        .zip(counts)
        .map(|(&sum, &count)| if count > 0 { sum / count as f64 } else { 0.0 })
        .collect();
    let total: f64 = means.iter().sum();

    bands
        .iter()
        .zip(&means)
        .map(|(band, &mean)| {
            let ratio = if total > 0.0 { mean / total } else { 0.0 };
            (band.name.to_string(), ratio as f32)
        })
        .collect()
}

/// 1 - |pearson(L, R)| clamped to [0, 1]; silence-vs-silence reads as 0.5
fn stereo_width(buffer: &SampleBuffer, diagnostics: &mut Vec<Diagnostic>) -> f32 {
    if buffer.channels() < 2 {
        return 0.0;
    }
    let left = buffer.channel(0);
    let right = buffer.channel(1);
    if left.len() < 2 {
        return 0.0;
    }

    match pearson(&left, &right) {
        Some(correlation) => (1.0 - correlation.abs()).clamp(0.0, 1.0),
        None => {
            push_diagnostic(
                diagnostics,
                "stereo_width",
                "channel correlation undefined (constant signal); using 0.5",
            );
            0.5
        }
    }
}

/// Pearson correlation coefficient; None when either channel has no variance
fn pearson(a: &[f32], b: &[f32]) -> Option<f32> {
    let n = a.len().min(b.len());
    let mean_a: f64 = a[..n].iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let mean_b: f64 = b[..n].iter().map(|&x| x as f64).sum::<f64>() / n as f64;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for i in 0..n {
        let da = a[i] as f64 - mean_a;
        let db = b[i] as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((cov / denom) as f32)
}
