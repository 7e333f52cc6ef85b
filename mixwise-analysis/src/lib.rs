//! Audio analysis module for Mixwise
//!
//! Turns a raw sample buffer into a structured feature record and derives
//! balance scores and a qualitative style recommendation from it. Two
//! extractors are provided: a full-fidelity STFT path and a lightweight
//! single-FFT path with the same output shape.

mod balance;
mod buffer;
mod extractor;
mod features;
mod stft;

pub use balance::{balance_scores, quick_advice, recommend_style, MixAdvice, StyleHint};
pub use buffer::{BufferError, SampleBuffer};
pub use extractor::{
    AnalysisError, Extraction, FeatureExtractor, FullFidelityExtractor, LightweightExtractor,
};
pub use features::{
    Band, Diagnostic, ExtractorKind, FeatureRecord, FIVE_BANDS, THREE_BANDS,
};
pub use stft::{magnitude_spectrum, Stft, FRAME_SIZE, HOP_SIZE};
