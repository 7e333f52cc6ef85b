//! Mixwise - mix analysis and enhancement CLI

mod cli;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ndarray::Array2;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mixwise_analysis::{
    balance_scores, quick_advice, recommend_style, Extraction, ExtractorKind, FeatureExtractor,
    FullFidelityExtractor, LightweightExtractor, SampleBuffer,
};
use mixwise_dsp::{decide, ProcessingEngine, TargetStyle};
use mixwise_library::{load_wav, save_wav, Config, FeatureCache};
use mixwise_predict::{
    load_model, save_model, suggest_processing_parameters, ModelKind, QualityPredictor,
    FEATURE_NAMES,
};

use cli::{Cli, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Command::Analyze {
            file,
            lightweight,
            no_cache,
            verbose,
        } => analyze(&file, lightweight, no_cache, verbose, cli.json, &config),
        Command::Optimize {
            file,
            output,
            style,
            lightweight,
        } => optimize(&file, &output, style, lightweight, cli.json, &config),
        Command::Predict { file, model } => predict(&file, model, cli.json, &config),
        Command::Train {
            dataset,
            output,
            kind,
            split,
        } => train(&dataset, &output, &kind, split, cli.json),
    }
}

/// Pick the extractor from the CLI flag, then the config, then the default
fn make_extractor(lightweight: bool, config: &Config) -> Box<dyn FeatureExtractor> {
    let kind = if lightweight {
        ExtractorKind::Lightweight
    } else {
        config
            .extractor
            .as_deref()
            .and_then(ExtractorKind::from_str_opt)
            .unwrap_or_default()
    };
    match kind {
        ExtractorKind::FullFidelity => Box::new(FullFidelityExtractor::new()),
        ExtractorKind::Lightweight => Box::new(LightweightExtractor::new()),
    }
}

fn file_stamp(path: &Path) -> Option<(u64, u64)> {
    let meta = std::fs::metadata(path).ok()?;
    let mtime = meta
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_secs();
    Some((meta.len(), mtime))
}

/// Extract features, consulting the cache when allowed
fn extract_features(
    path: &Path,
    buffer: &SampleBuffer,
    extractor: &dyn FeatureExtractor,
    use_cache: bool,
) -> Result<Extraction> {
    let stamp = file_stamp(path);

    if use_cache {
        if let (Some((size, mtime)), Ok(cache)) = (stamp, FeatureCache::open(&Config::cache_path()))
        {
            if let Ok(Some(record)) = cache.get(path, size, mtime, extractor.kind()) {
                debug!(path = %path.display(), "feature cache hit");
                return Ok(Extraction {
                    record,
                    diagnostics: Vec::new(),
                });
            }

            let extraction = extractor
                .extract(buffer)
                .context("feature extraction failed")?;
            let _ = cache.insert(path, size, mtime, &extraction.record);
            return Ok(extraction);
        }
    }

    extractor
        .extract(buffer)
        .context("feature extraction failed")
}

fn analyze(
    file: &Path,
    lightweight: bool,
    no_cache: bool,
    verbose: bool,
    as_json: bool,
    config: &Config,
) -> Result<()> {
    let buffer = load_wav(file).with_context(|| format!("failed to load {}", file.display()))?;
    let extractor = make_extractor(lightweight, config);
    let use_cache = config.cache_enabled && !no_cache;

    let extraction = extract_features(file, &buffer, extractor.as_ref(), use_cache)?;
    let record = &extraction.record;

    let scores = balance_scores(record);
    let style = recommend_style(record);
    let advice = quick_advice(record);
    let suggestions = suggest_processing_parameters(&record.to_feature_map());

    if as_json {
        let payload = json!({
            "file": file.display().to_string(),
            "duration_secs": buffer.duration_secs(),
            "sample_rate": buffer.sample_rate(),
            "channels": buffer.channels(),
            "features": record,
            "balance_scores": scores,
            "recommended_style": style.as_str(),
            "assessment": advice.assessment,
            "suggestions": advice.suggestions,
            "processing_suggestions": suggestions,
            "diagnostics": extraction.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Analyzing: {}", file.display());
    println!("{:-<50}", "");
    println!("Duration:      {:.1} s", buffer.duration_secs());
    println!("Sample rate:   {} Hz", buffer.sample_rate());
    println!("Channels:      {}", buffer.channels());
    println!("RMS level:     {:.3}", record.rms_energy);
    println!("Dynamic range: {:.2} ({})", record.dynamic_range, record.extractor.as_str());
    println!("Stereo width:  {:.2}", record.stereo_width);
    println!("Peak freq:     {:.0} Hz", record.peak_frequency_hz);

    println!("\nFrequency balance:");
    for (band, ratio) in &record.frequency_balance {
        let score = scores.get(band).copied().unwrap_or(0.0);
        println!("  {band:<10} {:>5.1}%  (balance score {score:.2})", ratio * 100.0);
    }

    println!("\nRecommended style: {}", style.as_str());
    println!("Assessment: {}", advice.assessment);

    if advice.suggestions.is_empty() {
        println!("\nNo major issues detected");
    } else {
        println!("\nSuggestions:");
        for (i, suggestion) in advice.suggestions.iter().enumerate() {
            println!("  {}. {suggestion}", i + 1);
        }
    }

    if !suggestions.is_empty() {
        println!("\nPriority fixes: {}", suggestions.priority_order.join(", "));
    }

    if verbose {
        println!("\nDetailed metrics:");
        println!("  spectral_centroid_hz: {:.2}", record.spectral_centroid_hz);
        println!("  spectral_rolloff_hz:  {:.2}", record.spectral_rolloff_hz);
        for diagnostic in &extraction.diagnostics {
            println!("  [degraded:{}] {}", diagnostic.stage, diagnostic.message);
        }
    }

    Ok(())
}

fn optimize(
    file: &Path,
    output: &Path,
    style: Option<String>,
    lightweight: bool,
    as_json: bool,
    config: &Config,
) -> Result<()> {
    let style: TargetStyle = style
        .or_else(|| config.default_style.clone())
        .as_deref()
        .unwrap_or("balanced")
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let buffer = load_wav(file).with_context(|| format!("failed to load {}", file.display()))?;
    let extractor = make_extractor(lightweight, config);
    let extraction = extract_features(file, &buffer, extractor.as_ref(), config.cache_enabled)?;

    let chain = decide(&extraction.record, style);
    let mut engine = ProcessingEngine::new();
    let (processed, report) = engine.apply_chain(&buffer, &chain);

    save_wav(&processed, output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if as_json {
        let payload = json!({
            "file": file.display().to_string(),
            "output": output.display().to_string(),
            "chain": chain,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Optimizing: {}", file.display());
    println!("{:-<50}", "");
    println!("Chain: {} ({} steps)", chain.name, chain.steps.len());
    for step in &chain.steps {
        println!("  - {}", step.kind());
    }
    println!(
        "Estimated improvement: {:.0}%",
        chain.estimated_improvement * 100.0
    );
    println!("\nRMS before: {:.4}", report.before_rms);
    println!("RMS after:  {:.4}", report.after_rms);
    if !report.step_failures.is_empty() {
        println!("\nStep failures:");
        for failure in &report.step_failures {
            println!("  {}: {}", failure.step, failure.error);
        }
    }
    println!("\nWrote {}", output.display());

    Ok(())
}

fn predict(file: &Path, model: Option<PathBuf>, as_json: bool, config: &Config) -> Result<()> {
    let model_path = match model.or_else(|| config.model_path.clone()) {
        Some(path) => path,
        None => bail!("no model path given; pass --model or set model_path in the config"),
    };

    let trained = load_model(&model_path)
        .with_context(|| format!("failed to load model {}", model_path.display()))?;
    let predictor = QualityPredictor::new(trained.kind);
    predictor.install(trained);

    let buffer = load_wav(file).with_context(|| format!("failed to load {}", file.display()))?;
    let extraction = FullFidelityExtractor::new()
        .extract(&buffer)
        .context("feature extraction failed")?;
    let features = extraction.record.to_feature_map();

    let prediction = predictor.predict(&features)?;
    let suggestions = suggest_processing_parameters(&features);

    if as_json {
        let payload = json!({
            "file": file.display().to_string(),
            "prediction": prediction,
            "processing_suggestions": suggestions,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Quality verdict: {}", file.display());
    println!("{:-<50}", "");
    println!("Rating:     {:.1} / 10", prediction.predicted_rating);
    println!("Category:   {}", prediction.quality_category.as_str());
    println!("Confidence: {:.0}%", prediction.confidence * 100.0);

    if prediction.improvement_areas.is_empty() {
        println!("\nNo problem areas flagged");
    } else {
        println!("\nImprovement areas:");
        for area in &prediction.improvement_areas {
            println!("  - {area}");
        }
    }

    if !suggestions.is_empty() {
        println!("\nSuggested fixes (in order): {}", suggestions.priority_order.join(", "));
    }

    Ok(())
}

/// One labeled sample in a training dataset
#[derive(Debug, Deserialize)]
struct TrainSample {
    features: BTreeMap<String, f64>,
    rating: f64,
}

#[derive(Debug, Deserialize)]
struct TrainDataset {
    samples: Vec<TrainSample>,
}

fn train(dataset: &Path, output: &Path, kind: &str, split: f64, as_json: bool) -> Result<()> {
    let kind = ModelKind::from_str_opt(kind)
        .with_context(|| format!("unknown model kind '{kind}'"))?;

    let text = std::fs::read_to_string(dataset)
        .with_context(|| format!("failed to read {}", dataset.display()))?;
    let dataset: TrainDataset = serde_json::from_str(&text).context("malformed dataset")?;
    if dataset.samples.is_empty() {
        bail!("dataset contains no samples");
    }

    let n = dataset.samples.len();
    let x = Array2::from_shape_fn((n, FEATURE_NAMES.len()), |(i, j)| {
        dataset.samples[i]
            .features
            .get(FEATURE_NAMES[j])
            .copied()
            .unwrap_or(0.0)
    });
    let y: Vec<f64> = dataset.samples.iter().map(|s| s.rating).collect();

    let predictor = QualityPredictor::new(kind);
    let report = predictor.train(&x, &y, split)?;

    let model = predictor
        .snapshot()
        .context("training did not produce a model")?;
    save_model(&model, output)
        .with_context(|| format!("failed to write model {}", output.display()))?;

    if as_json {
        let payload = json!({
            "model": output.display().to_string(),
            "kind": kind.as_str(),
            "samples": n,
            "report": {
                "train_r2": report.train_r2,
                "validation_r2": report.validation_r2,
                "validation_mae": report.validation_mae,
                "validation_rmse": report.validation_rmse,
                "feature_importance": report.feature_importance,
            },
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Trained {} on {} samples", kind.as_str(), n);
    println!("{:-<50}", "");
    println!("Train R^2:      {:.3}", report.train_r2);
    println!("Validation R^2: {:.3}", report.validation_r2);
    println!("Validation MAE: {:.3}", report.validation_mae);
    println!("Validation RMSE:{:.3}", report.validation_rmse);

    println!("\nTop features:");
    for (name, importance) in report.feature_importance.iter().take(5) {
        println!("  {name:<20} {importance:.3}");
    }

    println!("\nWrote {}", output.display());
    Ok(())
}
