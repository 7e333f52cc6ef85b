//! Processing engine: chain execution with fault isolation
//!
//! Steps run in order; a step that rejects its configuration is recorded in
//! the report and the remaining steps still run. Multi-channel buffers are
//! deinterleaved and each channel is processed with independent filter
//! state. Every run appends an entry to a bounded history log.

use mixwise_analysis::SampleBuffer;
use serde::Serialize;
use tracing::{debug, warn};

use crate::chain::{ProcessingChain, ProcessingReport, ProcessingStep, StepFailure};
use crate::compressor::apply_compression;
use crate::eq::apply_eq;
use crate::error::StepError;
use crate::saturation::apply_saturation;

/// Quick characteristics snapshot stored with each history entry
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AudioSnapshot {
    pub rms: f32,
    pub peak: f32,
    pub dynamic_range: f32,
}

impl AudioSnapshot {
    pub fn of(buffer: &SampleBuffer) -> Self {
        Self {
            rms: buffer.rms(),
            peak: buffer.peak(),
            dynamic_range: buffer.dynamic_range(),
        }
    }
}

/// One completed run kept for introspection
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub chain: ProcessingChain,
    pub input: AudioSnapshot,
    pub output: AudioSnapshot,
    pub report: ProcessingReport,
}

/// Default cap on retained history entries
const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Executes processing chains and keeps a bounded run history
pub struct ProcessingEngine {
    history: Vec<HistoryEntry>,
    history_limit: usize,
}

impl Default for ProcessingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingEngine {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Engine with a custom history cap (oldest entries are evicted)
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history: Vec::new(),
            history_limit: limit.max(1),
        }
    }

    /// Past runs, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Execute a chain against a buffer, producing a new buffer and report
    ///
    /// The input buffer is never modified. Step failures are collected in
    /// the report; they never abort the remaining steps.
    pub fn apply_chain(
        &mut self,
        buffer: &SampleBuffer,
        chain: &ProcessingChain,
    ) -> (SampleBuffer, ProcessingReport) {
        debug!(chain = %chain.name, steps = chain.steps.len(), "applying chain");

        let sample_rate = buffer.sample_rate();
        let mut channels: Vec<Vec<f32>> = (0..buffer.channels())
            .map(|c| buffer.channel(c))
            .collect();

        let mut steps_applied = Vec::new();
        let mut step_failures = Vec::new();

        for step in &chain.steps {
            match run_step(step, &channels, sample_rate) {
                Ok(processed) => {
                    channels = processed;
                    steps_applied.push(step.kind().to_string());
                }
                Err(err) => {
                    warn!(step = step.kind(), %err, "processing step failed");
                    step_failures.push(StepFailure {
                        step: step.kind().to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let interleaved = interleave(&channels);
        // Every primitive preserves length, so this rebuild cannot fail
        let processed = buffer
            .with_samples(interleaved)
            .unwrap_or_else(|_| buffer.clone());

        let report = ProcessingReport {
            chain_name: chain.name.clone(),
            steps_applied,
            before_rms: buffer.rms(),
            after_rms: processed.rms(),
            step_failures,
        };

        self.push_history(HistoryEntry {
            chain: chain.clone(),
            input: AudioSnapshot::of(buffer),
            output: AudioSnapshot::of(&processed),
            report: report.clone(),
        });

        (processed, report)
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        if self.history.len() >= self.history_limit {
            self.history.remove(0);
        }
        self.history.push(entry);
    }
}

/// Apply one step to every channel
fn run_step(
    step: &ProcessingStep,
    channels: &[Vec<f32>],
    sample_rate: u32,
) -> Result<Vec<Vec<f32>>, StepError> {
    match step {
        ProcessingStep::Eq(settings) => channels
            .iter()
            .map(|ch| apply_eq(ch, sample_rate, settings))
            .collect(),
        ProcessingStep::Compression(params) => channels
            .iter()
            .map(|ch| apply_compression(ch, sample_rate, params))
            .collect(),
        ProcessingStep::Saturation(params) => channels
            .iter()
            .map(|ch| apply_saturation(ch, params))
            .collect(),
        // Marker step: flags over-compression, leaves audio untouched
        ProcessingStep::GentleExpansion => Ok(channels.to_vec()),
    }
}

fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    if channels.len() == 1 {
        return channels[0].clone();
    }
    let frames = channels.first().map(|c| c.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        for channel in channels {
            out.push(channel[i]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{CompressorParams, EqSettings, HighPassParams, SaturationMode, SaturationParams};
    use std::f32::consts::PI;

    fn sine_buffer(freq: f32, amplitude: f32, sample_rate: u32, secs: f32) -> SampleBuffer {
        let len = (sample_rate as f32 * secs) as usize;
        let samples: Vec<f32> = (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        SampleBuffer::mono(samples, sample_rate).unwrap()
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let buffer = sine_buffer(440.0, 0.5, 44100, 0.5);
        let mut engine = ProcessingEngine::new();
        let chain = ProcessingChain::empty("noop");

        let (processed, report) = engine.apply_chain(&buffer, &chain);

        assert_eq!(processed.samples(), buffer.samples());
        assert_eq!(report.before_rms, report.after_rms);
        assert!(report.steps_applied.is_empty());
        assert!(report.step_failures.is_empty());
    }

    #[test]
    fn test_failed_step_does_not_abort_chain() {
        let buffer = sine_buffer(440.0, 0.9, 44100, 0.5);
        let mut engine = ProcessingEngine::new();

        let mut chain = ProcessingChain::empty("partial");
        // Ratio 1.0 is invalid and must be rejected
        chain.steps.push(ProcessingStep::Compression(CompressorParams {
            threshold_db: -12.0,
            ratio: 1.0,
            attack_ms: 10.0,
            release_ms: 100.0,
        }));
        chain.steps.push(ProcessingStep::Saturation(SaturationParams {
            drive: 0.2,
            mode: SaturationMode::Hard,
        }));

        let (processed, report) = engine.apply_chain(&buffer, &chain);

        assert_eq!(report.step_failures.len(), 1);
        assert_eq!(report.step_failures[0].step, "compression");
        assert_eq!(report.steps_applied, vec!["saturation".to_string()]);
        // The hard clip at 0.8 did run
        assert!(processed.peak() <= 0.8 + 1e-6);
    }

    #[test]
    fn test_gentle_expansion_is_pass_through_but_reported() {
        let buffer = sine_buffer(440.0, 0.4, 44100, 0.2);
        let mut engine = ProcessingEngine::new();
        let mut chain = ProcessingChain::empty("marker");
        chain.steps.push(ProcessingStep::GentleExpansion);

        let (processed, report) = engine.apply_chain(&buffer, &chain);
        assert_eq!(processed.samples(), buffer.samples());
        assert_eq!(report.steps_applied, vec!["gentle_expansion".to_string()]);
    }

    #[test]
    fn test_stereo_processing_preserves_layout() {
        let mono = sine_buffer(100.0, 0.5, 44100, 0.5);
        let mut interleaved = Vec::new();
        for &s in mono.samples() {
            interleaved.push(s);
            interleaved.push(s * 0.5);
        }
        let buffer = SampleBuffer::new(interleaved, 44100, 2).unwrap();

        let mut chain = ProcessingChain::empty("hp");
        chain.steps.push(ProcessingStep::Eq(EqSettings {
            high_pass: Some(HighPassParams { freq_hz: 1000.0, q: 0.7 }),
            ..EqSettings::default()
        }));

        let mut engine = ProcessingEngine::new();
        let (processed, report) = engine.apply_chain(&buffer, &chain);

        assert_eq!(processed.channels(), 2);
        assert_eq!(processed.frames(), buffer.frames());
        assert!(report.step_failures.is_empty());
        // The 100 Hz tone is far below the 1 kHz corner
        assert!(processed.rms() < buffer.rms() * 0.1);
    }

    #[test]
    fn test_history_is_bounded() {
        let buffer = sine_buffer(440.0, 0.3, 44100, 0.05);
        let mut engine = ProcessingEngine::with_history_limit(3);
        let chain = ProcessingChain::empty("noop");

        for _ in 0..5 {
            engine.apply_chain(&buffer, &chain);
        }
        assert_eq!(engine.history().len(), 3);

        engine.clear_history();
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_history_snapshots_reflect_processing() {
        let buffer = sine_buffer(440.0, 0.9, 44100, 0.5);
        let mut engine = ProcessingEngine::new();

        let mut chain = ProcessingChain::empty("clip");
        chain.steps.push(ProcessingStep::Saturation(SaturationParams {
            drive: 0.4,
            mode: SaturationMode::Hard,
        }));

        engine.apply_chain(&buffer, &chain);
        let entry = engine.history().last().unwrap();
        assert!((entry.input.peak - 0.9).abs() < 1e-3);
        assert!(entry.output.peak <= 0.6 + 1e-6);
        assert_eq!(entry.report.chain_name, "clip");
    }

    #[test]
    fn test_extract_decide_apply_pipeline() {
        use crate::decision::{decide, TargetStyle};
        use mixwise_analysis::{FeatureExtractor, FullFidelityExtractor};

        // A bare full-scale sine reads as dynamic (spread ~2.0): expect
        // the decision engine to reach for compression.
        let buffer = sine_buffer(440.0, 1.0, 44100, 1.0);
        let extraction = FullFidelityExtractor::new().extract(&buffer).unwrap();
        let chain = decide(&extraction.record, TargetStyle::Balanced);
        assert!(chain
            .steps
            .iter()
            .any(|s| matches!(s, ProcessingStep::Compression(_))));

        let mut engine = ProcessingEngine::new();
        let (processed, report) = engine.apply_chain(&buffer, &chain);
        assert!(report.step_failures.is_empty());
        assert_eq!(processed.frames(), buffer.frames());
        // Compression must not raise the peak
        assert!(processed.peak() <= buffer.peak() + 1e-6);
    }
}
