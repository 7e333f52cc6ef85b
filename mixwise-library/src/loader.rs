//! WAV file loading and writing
//!
//! Loads uncompressed PCM only: 8-bit unsigned, 16/32-bit signed, and
//! 32-bit float, mono or stereo, normalized to f32 in [-1, 1]. Anything
//! else is an input error surfaced to the caller.

use std::path::Path;

use hound::SampleFormat;
use mixwise_analysis::{BufferError, SampleBuffer};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading or writing audio
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Unsupported bit depth: {0} (expected 8, 16, or 32)")]
    UnsupportedBitDepth(u16),
    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),
    #[error("Audio file contains no samples")]
    Empty,
    #[error("Invalid buffer layout: {0}")]
    Buffer(#[from] BufferError),
}

/// Load a WAV file into a normalized sample buffer
pub fn load_wav(path: &Path) -> Result<SampleBuffer, LoadError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.channels > 2 {
        return Err(LoadError::UnsupportedChannels(spec.channels));
    }

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()?,
        (_, bits) => return Err(LoadError::UnsupportedBitDepth(bits)),
    };

    if samples.is_empty() {
        return Err(LoadError::Empty);
    }

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        frames = samples.len() / spec.channels as usize,
        "loaded wav"
    );

    Ok(SampleBuffer::new(samples, spec.sample_rate, spec.channels)?)
}

/// Write a sample buffer as 16-bit PCM
pub fn save_wav(buffer: &SampleBuffer, path: &Path) -> Result<(), LoadError> {
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in buffer.samples() {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    debug!(path = %path.display(), "wrote wav");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn write_wav(path: &Path, spec: hound::WavSpec, write: impl FnOnce(&mut hound::WavWriter<std::io::BufWriter<std::fs::File>>)) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        write(&mut writer);
        writer.finalize().unwrap();
    }

    #[test]
    fn test_16_bit_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..4410)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let buffer = SampleBuffer::mono(samples.clone(), 44100).unwrap();
        save_wav(&buffer, &path).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.sample_rate(), 44100);
        assert_eq!(loaded.channels(), 1);
        assert_eq!(loaded.frames(), 4410);
        // 16-bit quantization error stays below 1/32768 + rounding
        for (a, b) in samples.iter().zip(loaded.samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_8_bit_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eight.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        write_wav(&path, spec, |w| {
            for v in [-128i8, 0, 127] {
                w.write_sample(v).unwrap();
            }
        });

        let loaded = load_wav(&path).unwrap();
        let s = loaded.samples();
        assert!((s[0] - (-1.0)).abs() < 1e-6);
        assert!(s[1].abs() < 1e-6);
        assert!((s[2] - 127.0 / 128.0).abs() < 1e-6);
    }

    #[test]
    fn test_32_bit_int_and_float() {
        let dir = tempfile::tempdir().unwrap();

        let int_path = dir.path().join("int32.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Int,
        };
        write_wav(&int_path, spec, |w| {
            w.write_sample(i32::MAX / 2).unwrap();
            w.write_sample(i32::MIN / 2).unwrap();
        });
        let loaded = load_wav(&int_path).unwrap();
        assert!((loaded.samples()[0] - 0.5).abs() < 1e-6);
        assert!((loaded.samples()[1] + 0.5).abs() < 1e-6);

        let float_path = dir.path().join("float32.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        write_wav(&float_path, spec, |w| {
            w.write_sample(0.25f32).unwrap();
            w.write_sample(-0.75f32).unwrap();
        });
        let loaded = load_wav(&float_path).unwrap();
        assert!((loaded.samples()[0] - 0.25).abs() < 1e-7);
        assert!((loaded.samples()[1] + 0.75).abs() < 1e-7);
    }

    #[test]
    fn test_stereo_layout_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let interleaved = vec![0.1f32, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = SampleBuffer::new(interleaved, 48000, 2).unwrap();
        save_wav(&buffer, &path).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.channels(), 2);
        assert_eq!(loaded.frames(), 3);
        assert!(loaded.channel(0).iter().all(|&s| s > 0.0));
        assert!(loaded.channel(1).iter().all(|&s| s < 0.0));
    }

    #[test]
    fn test_unsupported_bit_depth_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        write_wav(&path, spec, |w| {
            w.write_sample(1000i32).unwrap();
        });

        assert!(matches!(
            load_wav(&path),
            Err(LoadError::UnsupportedBitDepth(24))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_wav(Path::new("/nonexistent/missing.wav")).is_err());
    }
}
