//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mixwise", about = "Mix analysis and enhancement toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit machine-readable JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a WAV file and report its characteristics
    Analyze {
        /// WAV file to analyze
        file: PathBuf,

        /// Use the lightweight single-FFT extractor
        #[arg(long)]
        lightweight: bool,

        /// Skip the feature cache
        #[arg(long)]
        no_cache: bool,

        /// Show every extracted metric
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze, build an enhancement chain, and apply it
    Optimize {
        /// WAV file to enhance
        file: PathBuf,

        /// Output WAV path
        #[arg(short, long, default_value = "enhanced.wav")]
        output: PathBuf,

        /// Target style: balanced, bright, warm, or vintage
        #[arg(short, long)]
        style: Option<String>,

        /// Use the lightweight single-FFT extractor
        #[arg(long)]
        lightweight: bool,
    },

    /// Predict mix quality with a trained model
    Predict {
        /// WAV file to rate
        file: PathBuf,

        /// Trained model artifact (falls back to the configured path)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Train a quality model from a JSON dataset
    Train {
        /// Dataset file: {"samples": [{"features": {...}, "rating": 7.5}]}
        dataset: PathBuf,

        /// Where to write the model artifact
        #[arg(short, long, default_value = "mixwise-model.json")]
        output: PathBuf,

        /// Regressor family: random_forest or gradient_boosting
        #[arg(short, long, default_value = "random_forest")]
        kind: String,

        /// Fraction of samples held out for validation
        #[arg(long, default_value_t = 0.2)]
        split: f64,
    },
}
