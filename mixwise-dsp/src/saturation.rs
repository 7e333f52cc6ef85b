//! Harmonic saturation
//!
//! Two transfer curves: soft (tanh, tape-flavored odd harmonics) and hard
//! (clipping at a drive-dependent ceiling). Drive stays small for mix
//! enhancement; the upper bound keeps the hard ceiling away from zero.

use crate::chain::{SaturationMode, SaturationParams};
use crate::error::StepError;

/// Apply saturation, returning a new slice of equal length
pub fn apply_saturation(samples: &[f32], params: &SaturationParams) -> Result<Vec<f32>, StepError> {
    if !params.drive.is_finite() || !(0.0..=0.9).contains(&params.drive) {
        return Err(StepError::InvalidDrive(params.drive));
    }

    let output = match params.mode {
        SaturationMode::Soft => {
            let gain = 1.0 + params.drive;
            samples.iter().map(|&x| (x * gain).tanh()).collect()
        }
        SaturationMode::Hard => {
            let ceiling = 1.0 - params.drive;
            samples.iter().map(|&x| x.clamp(-ceiling, ceiling)).collect()
        }
    };

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_saturation_stays_below_unity() {
        let input = vec![0.9f32, -0.9, 0.5, -0.5, 2.0];
        let output = apply_saturation(
            &input,
            &SaturationParams { drive: 0.3, mode: SaturationMode::Soft },
        )
        .unwrap();
        assert!(output.iter().all(|s| s.abs() < 1.0));
        // Sign is preserved
        for (a, b) in input.iter().zip(&output) {
            assert_eq!(a.signum(), b.signum());
        }
    }

    #[test]
    fn test_hard_clip_ceiling() {
        let input = vec![0.95f32, -0.95, 0.1];
        let output = apply_saturation(
            &input,
            &SaturationParams { drive: 0.2, mode: SaturationMode::Hard },
        )
        .unwrap();
        assert!((output[0] - 0.8).abs() < 1e-6);
        assert!((output[1] + 0.8).abs() < 1e-6);
        // Samples under the ceiling pass through
        assert!((output[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_zero_drive_soft_is_nearly_transparent_for_small_signals() {
        let input = vec![0.01f32, -0.02, 0.005];
        let output = apply_saturation(
            &input,
            &SaturationParams { drive: 0.0, mode: SaturationMode::Soft },
        )
        .unwrap();
        for (a, b) in input.iter().zip(&output) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_invalid_drive_is_rejected() {
        let input = vec![0.5f32];
        assert!(matches!(
            apply_saturation(
                &input,
                &SaturationParams { drive: 1.5, mode: SaturationMode::Hard },
            ),
            Err(StepError::InvalidDrive(_))
        ));
    }
}
