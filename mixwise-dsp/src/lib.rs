//! Signal processing for Mixwise
//!
//! This crate provides the enhancement pipeline:
//! - Primitives: shelving EQ, high-pass, compression, saturation
//! - Decision engine: feature record + target style -> processing chain
//! - Processing engine: chain execution with per-step fault isolation
//!
//! Signal flow:
//! ```text
//! FeatureRecord → decide() → ProcessingChain → ProcessingEngine → new buffer
//!                                                    ↓
//!                                            ProcessingReport + history
//! ```

mod biquad;
mod chain;
mod compressor;
mod decision;
mod engine;
mod eq;
mod error;
mod saturation;

pub use biquad::{BiquadCoeffs, BiquadState};
pub use chain::{
    BellParams, CompressorParams, EqSettings, HighPassParams, ProcessingChain, ProcessingReport,
    ProcessingStep, SaturationMode, SaturationParams, ShelfParams, StepFailure, StyleTarget,
};
pub use compressor::apply_compression;
pub use decision::{decide, TargetStyle};
pub use engine::{AudioSnapshot, HistoryEntry, ProcessingEngine};
pub use eq::{apply_bell, apply_eq, apply_high_pass, apply_high_shelf, apply_low_shelf};
pub use error::StepError;
pub use saturation::apply_saturation;
