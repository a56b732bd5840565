//! Churn Risk Pipeline - Main Entry Point
//!
//! Reads a customer CSV, scores every record in parallel and writes one JSON
//! assessment per line, followed by a batch summary in the logs.

use anyhow::{Context, Result};
use churn_risk_pipeline::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    ingest,
    metrics::PipelineMetrics,
    models::{linear, Scorer, ScorerKind, ScoringDispatcher},
    pipeline::{rank_by_probability, BatchSummary, ChurnPipeline},
    stats::FittedStatistics,
    types::{PredictionResult, RiskTier},
};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "churn-risk", version, about = "Score customers for churn risk")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assess every customer in a CSV file
    Score {
        /// Customer CSV with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Scorer family (linear or tree); defaults to the configured scorer
        #[arg(short, long)]
        scorer: Option<ScorerKind>,

        /// Write JSON lines here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only emit these tiers, highest probability first
        #[arg(long, value_delimiter = ',')]
        tier: Vec<RiskTier>,
    },

    /// Print the logistic regression features with the largest weights
    Coefficients {
        /// Number of features to print
        #[arg(long, default_value_t = 15)]
        top: usize,
    },
}

/// Library and binary targets share the configured level
fn default_directives(level: &str) -> String {
    format!("churn_risk_pipeline={level},churn_risk={level}")
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));

    // Logs go to stderr so stdout stays clean for JSON lines
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_dispatcher(config: &AppConfig) -> Result<ScoringDispatcher> {
    let mut dispatcher = ScoringDispatcher::new();

    if let Some(path) = &config.artifacts.linear_model_path {
        let (scaler, model) = linear::load_from_path(path)?;
        dispatcher = dispatcher
            .with_linear_scaler(Arc::new(scaler))
            .with_linear_model(Arc::new(model));
    }

    if let Some(path) = &config.artifacts.tree_model_path {
        dispatcher = with_tree_model(dispatcher, path, config.artifacts.onnx_threads)?;
    }

    Ok(dispatcher)
}

#[cfg(feature = "onnx")]
fn with_tree_model(
    dispatcher: ScoringDispatcher,
    path: &str,
    onnx_threads: usize,
) -> Result<ScoringDispatcher> {
    use churn_risk_pipeline::models::ModelLoader;
    use churn_risk_pipeline::FeatureSet;

    let loader = ModelLoader::with_threads(onnx_threads)?;
    let scorer = loader.load_scorer(path, "xgboost", FeatureSet::Tree)?;
    Ok(dispatcher.with_tree_model(Arc::new(scorer)))
}

#[cfg(not(feature = "onnx"))]
fn with_tree_model(
    dispatcher: ScoringDispatcher,
    path: &str,
    _onnx_threads: usize,
) -> Result<ScoringDispatcher> {
    warn!(path, "Built without the onnx feature; tree scorer disabled");
    Ok(dispatcher)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_logging(&config.logging);

    info!("Starting Churn Risk Pipeline");
    info!(
        high = config.risk_levels.high,
        medium = config.risk_levels.medium,
        default_scorer = %config.scoring.default_scorer,
        "Configuration loaded"
    );

    match cli.command {
        Command::Score {
            input,
            scorer,
            output,
            tier,
        } => {
            let scorer = scorer.unwrap_or(config.scoring.default_scorer);
            score(&config, &input, scorer, output.as_deref(), &tier)
        }
        Command::Coefficients { top } => coefficients(&config, top),
    }
}

fn coefficients(config: &AppConfig, top: usize) -> Result<()> {
    let path = config
        .artifacts
        .linear_model_path
        .as_deref()
        .context("No linear model configured")?;
    let (_, model) = linear::load_from_path(path)?;

    let ranked = model.top_coefficients(top);
    info!(model = %model.name(), shown = ranked.len(), "Top coefficients by magnitude");

    let mut out = BufWriter::new(io::stdout().lock());
    for (rank, (feature, coefficient)) in ranked.iter().enumerate() {
        serde_json::to_writer(
            &mut out,
            &serde_json::json!({
                "rank": rank + 1,
                "feature": feature,
                "coefficient": coefficient,
            }),
        )?;
        out.write_all(b"\n")?;
    }
    out.flush().context("Failed to write coefficients")?;
    Ok(())
}

fn score(
    config: &AppConfig,
    input: &Path,
    scorer: ScorerKind,
    output: Option<&Path>,
    tiers: &[RiskTier],
) -> Result<()> {
    if config.pipeline.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.pipeline.workers)
            .build_global()
            .context("Failed to size the worker pool")?;
    }

    let stats = FittedStatistics::load_from_path(&config.artifacts.statistics_path)?;
    let dispatcher = build_dispatcher(config)?;
    if !dispatcher.is_available(scorer) {
        warn!(scorer = %scorer, "Selected scorer is not loaded; every record will fail");
    }
    let pipeline =
        ChurnPipeline::new(Arc::new(stats), dispatcher).with_thresholds(config.risk_levels);

    let batch = ingest::read_customers_from_path(input)?;
    for rejected in &batch.rejected {
        warn!(line = rejected.line, reason = %rejected.reason, "Customer row rejected");
    }
    let records = batch.records;
    info!(
        records = records.len(),
        rejected = batch.rejected.len(),
        scorer = %scorer,
        workers = rayon::current_num_threads(),
        "Scoring customers"
    );

    let metrics = PipelineMetrics::new();
    let results: Vec<_> = records
        .par_iter()
        .map(|raw| {
            let start = Instant::now();
            let result = pipeline.assess(raw, scorer);
            match &result {
                Ok(prediction) => metrics.record_assessment(
                    start.elapsed(),
                    prediction.churn_probability,
                    prediction.risk_tier,
                ),
                Err(e) => {
                    metrics.record_failure(e);
                    error!(customer_id = %raw.customer_id, error = %e, "Assessment failed");
                }
            }
            result
        })
        .collect();

    let summary = BatchSummary::from_results(&results);

    let predictions: Vec<PredictionResult> = results.into_iter().filter_map(Result::ok).collect();
    let emitted = if tiers.is_empty() {
        predictions.iter().collect()
    } else {
        rank_by_probability(&predictions, tiers)
    };

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(sink);
    for prediction in &emitted {
        serde_json::to_writer(&mut writer, prediction)?;
        writer.write_all(b"\n")?;
    }
    writer.flush().context("Failed to write assessments")?;

    info!(
        total = summary.total,
        scored = summary.scored,
        failed = summary.failed,
        emitted = emitted.len(),
        high = summary.count(RiskTier::High),
        medium = summary.count(RiskTier::Medium),
        low = summary.count(RiskTier::Low),
        mean_probability = summary.mean_probability.unwrap_or(f64::NAN),
        "Batch summary"
    );
    for (contract, mean) in &summary.mean_probability_by_contract {
        info!(contract = %contract, mean_probability = mean, "Churn by contract type");
    }

    metrics.print_summary();
    Ok(())
}
