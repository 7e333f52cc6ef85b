//! Windowed spectral transforms shared by the extractors

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis frame length for the full-fidelity path
pub const FRAME_SIZE: usize = 2048;

/// Hop between successive analysis frames
pub const HOP_SIZE: usize = 512;

/// Reusable Hann-windowed FFT over fixed-size frames
pub struct Stft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    frame_size: usize,
    /// Pre-allocated FFT buffer to avoid allocation per frame
    fft_buffer: Vec<Complex<f32>>,
}

impl Stft {
    pub fn new(frame_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        // Pre-compute Hann window
        let window: Vec<f32> = (0..frame_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / frame_size as f32).cos()))
            .collect();

        Self {
            fft,
            window,
            frame_size,
            fft_buffer: vec![Complex::new(0.0, 0.0); frame_size],
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of positive-frequency bins per frame
    pub fn bins(&self) -> usize {
        self.frame_size / 2
    }

    /// Magnitudes of the positive-frequency bins for one windowed frame
    ///
    /// Frames shorter than `frame_size` are zero-padded.
    pub fn magnitudes(&mut self, frame: &[f32]) -> Vec<f32> {
        let count = frame.len().min(self.frame_size);
        for (i, &sample) in frame.iter().enumerate().take(count) {
            self.fft_buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }
        for slot in self.fft_buffer.iter_mut().skip(count) {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        self.fft_buffer[..self.frame_size / 2]
            .iter()
            .map(|c| c.norm())
            .collect()
    }

    /// Iterate magnitude spectra over overlapping frames of a signal
    ///
    /// Signals shorter than one frame yield a single zero-padded frame.
    pub fn frame_spectra(&mut self, samples: &[f32], hop: usize) -> Vec<Vec<f32>> {
        let hop = hop.max(1);
        if samples.len() <= self.frame_size {
            return vec![self.magnitudes(samples)];
        }
        let mut spectra = Vec::new();
        let mut start = 0;
        while start + self.frame_size <= samples.len() {
            spectra.push(self.magnitudes(&samples[start..start + self.frame_size]));
            start += hop;
        }
        spectra
    }
}

/// One-shot magnitude spectrum of an arbitrary-length signal, no window
///
/// Returns magnitudes for all bins; only the first half carries positive
/// frequencies. Bin width is `sample_rate / samples.len()`.
pub fn magnitude_spectrum(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(samples.len());
    let mut buffer: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut buffer);
    buffer.iter().map(|c| c.norm()).collect()
}
