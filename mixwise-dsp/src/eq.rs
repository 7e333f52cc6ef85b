//! Equalization primitives
//!
//! Shelving filters are built by blending a Butterworth-filtered copy with
//! the original: `out = x + (filtered - x) * (gain_linear - 1)`. At unity
//! gain the blend cancels and the signal passes through untouched.
//!
//! Corner-frequency edge cases follow the shelf type: a high shelf at or
//! above Nyquist has nothing left to boost and passes through; a low shelf
//! there covers the whole band and becomes a full-gain pass; a high-pass
//! there removes everything.

use crate::biquad::{filter_slice, BiquadCoeffs};
use crate::chain::{BellParams, EqSettings, HighPassParams, ShelfParams};
use crate::error::{check_frequency, check_gain, StepError};

#[inline]
fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Boost or cut everything below the corner frequency
pub fn apply_low_shelf(
    samples: &[f32],
    sample_rate: u32,
    params: &ShelfParams,
) -> Result<Vec<f32>, StepError> {
    check_frequency(params.freq_hz)?;
    check_gain(params.gain_db)?;

    let gain = db_to_linear(params.gain_db);
    let nyquist = sample_rate as f32 / 2.0;
    if params.freq_hz >= nyquist {
        // Shelf covers the entire band: plain gain
        return Ok(samples.iter().map(|&s| s * gain).collect());
    }

    let coeffs = BiquadCoeffs::lowpass(sample_rate as f32, params.freq_hz, params.q);
    let filtered = filter_slice(samples, &coeffs);
    Ok(blend(samples, &filtered, gain))
}

/// Boost or cut everything above the corner frequency
pub fn apply_high_shelf(
    samples: &[f32],
    sample_rate: u32,
    params: &ShelfParams,
) -> Result<Vec<f32>, StepError> {
    check_frequency(params.freq_hz)?;
    check_gain(params.gain_db)?;

    let nyquist = sample_rate as f32 / 2.0;
    if params.freq_hz >= nyquist {
        // Nothing above Nyquist to shelve
        return Ok(samples.to_vec());
    }

    let gain = db_to_linear(params.gain_db);
    let coeffs = BiquadCoeffs::highpass(sample_rate as f32, params.freq_hz, params.q);
    let filtered = filter_slice(samples, &coeffs);
    Ok(blend(samples, &filtered, gain))
}

/// 2nd-order high-pass
pub fn apply_high_pass(
    samples: &[f32],
    sample_rate: u32,
    params: &HighPassParams,
) -> Result<Vec<f32>, StepError> {
    check_frequency(params.freq_hz)?;

    let nyquist = sample_rate as f32 / 2.0;
    if params.freq_hz >= nyquist {
        return Ok(vec![0.0; samples.len()]);
    }
    if params.freq_hz <= 0.0 {
        return Ok(samples.to_vec());
    }

    let coeffs = BiquadCoeffs::highpass(sample_rate as f32, params.freq_hz, params.q);
    Ok(filter_slice(samples, &coeffs))
}

/// Bell (peaking) filter — reserved, currently an explicit pass-through
pub fn apply_bell(samples: &[f32], _sample_rate: u32, _params: &BellParams) -> Vec<f32> {
    samples.to_vec()
}

/// Apply an EQ step's sub-adjustments in a fixed order
///
/// Order: low shelf, high shelf, high-pass, bell.
pub fn apply_eq(
    samples: &[f32],
    sample_rate: u32,
    settings: &EqSettings,
) -> Result<Vec<f32>, StepError> {
    let mut processed = samples.to_vec();
    if let Some(shelf) = &settings.low_shelf {
        processed = apply_low_shelf(&processed, sample_rate, shelf)?;
    }
    if let Some(shelf) = &settings.high_shelf {
        processed = apply_high_shelf(&processed, sample_rate, shelf)?;
    }
    if let Some(hp) = &settings.high_pass {
        processed = apply_high_pass(&processed, sample_rate, hp)?;
    }
    if let Some(bell) = &settings.bell {
        processed = apply_bell(&processed, sample_rate, bell);
    }
    Ok(processed)
}

#[inline]
fn blend(dry: &[f32], filtered: &[f32], gain: f32) -> Vec<f32> {
    dry.iter()
        .zip(filtered)
        .map(|(&x, &f)| x + (f - x) * (gain - 1.0))
        .collect()
}
