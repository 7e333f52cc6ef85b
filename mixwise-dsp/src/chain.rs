//! Processing chains as data
//!
//! A chain is an ordered list of typed steps, each carrying its own
//! parameter record. Chains are built once by the decision engine and
//! consumed once by the processing engine; they are plain data and
//! serialize cleanly at service boundaries.

use serde::{Deserialize, Serialize};

/// Shelving filter parameters (low or high shelf)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfParams {
    pub freq_hz: f32,
    pub gain_db: f32,
    pub q: f32,
}

/// High-pass filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighPassParams {
    pub freq_hz: f32,
    pub q: f32,
}

/// Bell (peaking) filter parameters
///
/// The bell primitive is reserved and currently passes audio through
/// unchanged; the parameters are kept for chain compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BellParams {
    pub freq_hz: f32,
    pub gain_db: f32,
    pub q: f32,
}

/// Combined EQ step: sub-adjustments applied as one step
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EqSettings {
    pub low_shelf: Option<ShelfParams>,
    pub high_shelf: Option<ShelfParams>,
    pub high_pass: Option<HighPassParams>,
    pub bell: Option<BellParams>,
}

impl EqSettings {
    pub fn is_empty(&self) -> bool {
        self.low_shelf.is_none()
            && self.high_shelf.is_none()
            && self.high_pass.is_none()
            && self.bell.is_none()
    }
}

/// Downward compressor parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorParams {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

/// Saturation transfer curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationMode {
    /// Tape-style soft clipping via tanh
    #[default]
    Soft,
    /// Hard clip at a drive-dependent ceiling
    Hard,
}

impl SaturationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaturationMode::Soft => "soft",
            SaturationMode::Hard => "hard",
        }
    }
}

/// Saturation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationParams {
    pub drive: f32,
    pub mode: SaturationMode,
}

/// One step of a processing chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingStep {
    Eq(EqSettings),
    Compression(CompressorParams),
    Saturation(SaturationParams),
    /// Marker step flagging an over-compressed source. Passes audio through
    /// unchanged; present so reports show the finding.
    GentleExpansion,
}

impl ProcessingStep {
    /// Step kind as a stable snake_case name
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingStep::Eq(_) => "eq",
            ProcessingStep::Compression(_) => "compression",
            ProcessingStep::Saturation(_) => "saturation",
            ProcessingStep::GentleExpansion => "gentle_expansion",
        }
    }
}

/// Target tonal character the chain aims for, each axis in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleTarget {
    pub brightness: f32,
    pub warmth: f32,
    pub punch: f32,
    pub clarity: f32,
}

/// An ordered enhancement chain plus reporting metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingChain {
    pub name: String,
    pub steps: Vec<ProcessingStep>,
    pub target: StyleTarget,
    /// Rough improvement estimate in [0, 0.8]; reporting only
    pub estimated_improvement: f32,
}

impl ProcessingChain {
    /// A named chain with no steps (processing becomes the identity)
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            target: StyleTarget {
                brightness: 0.5,
                warmth: 0.4,
                punch: 0.6,
                clarity: 0.8,
            },
            estimated_improvement: 0.0,
        }
    }
}

/// A recorded per-step failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: String,
    pub error: String,
}

/// Outcome of executing a chain against a buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub chain_name: String,
    /// Kinds of the steps that completed, in execution order
    pub steps_applied: Vec<String>,
    pub before_rms: f32,
    pub after_rms: f32,
    /// Failures recorded without aborting the rest of the chain
    pub step_failures: Vec<StepFailure>,
}
