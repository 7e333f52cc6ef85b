//! Downward compression via an attack/release envelope follower
//!
//! The follower smooths |x| with separate attack and release one-pole
//! coefficients (`coeff = 1 - exp(-1/samples)`). Samples whose envelope
//! exceeds the linear threshold get a gain of
//! `1 / (1 + (excess - 1) * (ratio - 1) / ratio)` where
//! `excess = envelope / threshold` — knee-less downward compression that
//! never amplifies.

use crate::chain::CompressorParams;
use crate::error::{check_time, StepError};

/// Apply downward compression, returning a new slice of equal length
pub fn apply_compression(
    samples: &[f32],
    sample_rate: u32,
    params: &CompressorParams,
) -> Result<Vec<f32>, StepError> {
    if !params.ratio.is_finite() || params.ratio <= 1.0 {
        return Err(StepError::InvalidRatio(params.ratio));
    }
    if !params.threshold_db.is_finite()
        || params.threshold_db > 0.0
        || params.threshold_db < -60.0
    {
        return Err(StepError::InvalidThreshold(params.threshold_db));
    }
    check_time(params.attack_ms)?;
    check_time(params.release_ms)?;

    let attack_samples = ((params.attack_ms * sample_rate as f32 / 1000.0) as usize).max(1);
    let release_samples = ((params.release_ms * sample_rate as f32 / 1000.0) as usize).max(1);

    let envelope = envelope_follower(samples, attack_samples, release_samples);
    let threshold = 10.0f32.powf(params.threshold_db / 20.0);

    let output = samples
        .iter()
        .zip(&envelope)
        .map(|(&x, &env)| {
            if env > threshold {
                let excess = env / threshold;
                let gain = 1.0 / (1.0 + (excess - 1.0) * (params.ratio - 1.0) / params.ratio);
                x * gain
            } else {
                x
            }
        })
        .collect();

    Ok(output)
}

/// Peak envelope with attack/release smoothing
fn envelope_follower(samples: &[f32], attack_samples: usize, release_samples: usize) -> Vec<f32> {
    let attack_coeff = 1.0 - (-1.0 / attack_samples as f32).exp();
    let release_coeff = 1.0 - (-1.0 / release_samples as f32).exp();

    let mut level = 0.0f32;
    samples
        .iter()
        .map(|&x| {
            let magnitude = x.abs();
            let coeff = if magnitude > level {
                attack_coeff
            } else {
                release_coeff
            };
            level += (magnitude - level) * coeff;
            level
        })
        .collect()
}
