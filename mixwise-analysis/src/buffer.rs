//! In-memory sample buffers

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a sample buffer from raw data
#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Sample rate must be positive")]
    ZeroSampleRate,
    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),
    #[error("Interleaved length {len} is not a multiple of {channels} channels")]
    RaggedInterleave { len: usize, channels: u16 },
}

/// An immutable block of audio, interleaved f32 samples normalized to [-1, 1]
///
/// The channel layout is fixed at construction and never reinterpreted.
/// Analysis and processing read the buffer; processing produces a new,
/// independent buffer rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl SampleBuffer {
    /// Create a buffer from interleaved samples
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, BufferError> {
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        if channels == 0 || channels > 2 {
            return Err(BufferError::UnsupportedChannels(channels));
        }
        if samples.len() % channels as usize != 0 {
            return Err(BufferError::RaggedInterleave {
                len: samples.len(),
                channels,
            });
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, BufferError> {
        Self::new(samples, sample_rate, 1)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count (1 or 2)
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Deinterleave one channel into a new vector
    ///
    /// Indices at or beyond the channel count return an empty vector.
    pub fn channel(&self, index: u16) -> Vec<f32> {
        if index >= self.channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Left channel (channel 0)
    pub fn left(&self) -> Vec<f32> {
        self.channel(0)
    }

    /// Average all channels down to mono
    pub fn downmix_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(self.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }

    /// Root-mean-square level over all samples
    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }

    /// Absolute peak level over all samples
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }

    /// Signal spread: max(sample) - min(sample)
    pub fn dynamic_range(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let max = self.samples.iter().copied().fold(f32::MIN, f32::max);
        let min = self.samples.iter().copied().fold(f32::MAX, f32::min);
        max - min
    }

    /// Build a new buffer with the same rate/layout but different samples
    ///
    /// Used by processing code that transforms samples without changing the
    /// format. The length must match the original interleave.
    pub fn with_samples(&self, samples: Vec<f32>) -> Result<Self, BufferError> {
        Self::new(samples, self.sample_rate, self.channels)
    }
}

/// RMS of a sample slice: sqrt(mean(x^2))
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}
