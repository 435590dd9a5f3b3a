//! `seg-eval` binary: score a dump of segmentation predictions.
//!
//! # Usage
//!
//! ```bash
//! seg-eval --config config.json --input predictions.json
//! seg-eval --config config.json --input predictions.json \
//!     --checkpoint best.ckpt --output out/results.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use seg_eval::report::{log_summary, JsonFileSink, RunMetadata};
use seg_eval::{into_batches, load_samples_from_file, EvaluationConfig, EvaluationRunner};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "seg-eval",
    version,
    about = "Segmentation evaluation tool: streaming mean-IoU with and without the background class"
)]
struct Cli {
    /// Path to the evaluation configuration JSON file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Path to the prediction dump (predictions plus instance annotations)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Where to write the evaluation summary
    #[arg(short, long, default_value = "evaluation_results.json")]
    output: PathBuf,

    /// Number of samples per batch
    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    /// Override the progress reporting interval from the config
    #[arg(long)]
    report_interval: Option<usize>,

    /// Checkpoint the predictions came from, recorded in the summary
    #[arg(long)]
    checkpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> seg_eval::Result<()> {
    info!("seg-eval v{}", seg_eval::VERSION);
    info!("Loading configuration from {}", cli.config.display());
    let contents = std::fs::read_to_string(&cli.config)?;
    let mut config: EvaluationConfig = serde_json::from_str(&contents)?;
    if let Some(interval) = cli.report_interval {
        config.report_interval = interval;
    }
    config.validate()?;

    info!("Loading predictions from {}", cli.input.display());
    let samples = load_samples_from_file(&cli.input)?;
    let num_samples = samples.len();
    let batches = into_batches(samples, cli.batch_size)?;
    info!("Evaluation dataset: {} samples in {} batches", num_samples, batches.len());

    let mut runner = EvaluationRunner::new(config.clone())?.with_total_batches(batches.len());
    let mut sink = JsonFileSink::new(
        &cli.output,
        config.clone(),
        RunMetadata {
            checkpoint_path: cli.checkpoint,
        },
    );

    let result = runner.run(batches, &mut sink)?;
    log_summary(&result, &config);
    info!("Evaluation complete");
    Ok(())
}
