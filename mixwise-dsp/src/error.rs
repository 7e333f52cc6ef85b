//! Step-level processing errors

use thiserror::Error;

/// A single processing step rejected its configuration
///
/// These never abort a chain: the engine records the failure in the report
/// and continues with the remaining steps.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Invalid filter frequency: {0} Hz")]
    InvalidFrequency(f32),
    #[error("Gain {0} dB outside the supported +/-24 dB range")]
    InvalidGain(f32),
    #[error("Compression ratio {0} must be greater than 1.0")]
    InvalidRatio(f32),
    #[error("Threshold {0} dB outside the supported [-60, 0] range")]
    InvalidThreshold(f32),
    #[error("Attack/release times must be positive, got {0} ms")]
    InvalidTime(f32),
    #[error("Saturation drive {0} outside the supported [0, 0.9] range")]
    InvalidDrive(f32),
}

/// Shared parameter checks used by the primitives

pub(crate) fn check_frequency(freq_hz: f32) -> Result<(), StepError> {
    if !freq_hz.is_finite() || freq_hz < 0.0 {
        return Err(StepError::InvalidFrequency(freq_hz));
    }
    Ok(())
}

pub(crate) fn check_gain(gain_db: f32) -> Result<(), StepError> {
    if !gain_db.is_finite() || gain_db.abs() > 24.0 {
        return Err(StepError::InvalidGain(gain_db));
    }
    Ok(())
}

pub(crate) fn check_time(ms: f32) -> Result<(), StepError> {
    if !ms.is_finite() || ms <= 0.0 {
        return Err(StepError::InvalidTime(ms));
    }
    Ok(())
}
