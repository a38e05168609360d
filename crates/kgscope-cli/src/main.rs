//! kgscope CLI - inspect and serve knowledge graph embedding experiments.
//!
//! # Usage
//!
//! ```bash
//! # Compare every run under a directory, best test MRR first
//! kgscope analyse --dir KINSHIP-DistMult-RN/
//!
//! # Sort by another metric, leave out unfinished runs
//! kgscope analyse --dir runs/ --sort-by val_h10 --skip-incomplete
//!
//! # Serve a trained model as a web form
//! kgscope serve --path-of-experiment-folder Experiments/2022-03-09 --top-k 10
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); the LaTeX table goes to
//! stdout.

use anyhow::{Context, Result};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use kgscope_infer::{DeployConfig, Experiment, DEFAULT_TOP_K};
use kgscope_report::{aggregate, AggregateOptions, Column, FailurePolicy, SUMMARY_FILE};
use kgscope_serve::{bind_address, serve, AppState};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kgscope")]
#[command(about = "Knowledge graph embedding experiment tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a directory of training runs as a LaTeX table and summary.csv
    Analyse {
        /// Directory holding one subdirectory per run
        #[arg(long, default_value = "KINSHIP-DistMult-RN/")]
        dir: PathBuf,

        /// Metric column to sort by (descending)
        #[arg(long, default_value = "test_mrr", value_parser = sort_column_parser())]
        sort_by: Column,

        /// Leave out runs with missing or unreadable reports instead of failing
        #[arg(long)]
        skip_incomplete: bool,

        /// Storage paths are shortened to start at this component
        #[arg(long, default_value = kgscope_report::DEFAULT_PATH_MARKER)]
        path_marker: String,

        /// CSV output path (default: <dir>/summary.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve a trained model through a web form
    Serve {
        /// Experiment folder with configuration.json, vocabularies and weights
        #[arg(long)]
        path_of_experiment_folder: PathBuf,

        /// Number of entities shown per ranking
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Listen on all interfaces instead of loopback
        #[arg(long)]
        share: bool,

        /// Port to listen on
        #[arg(long, default_value_t = 7860)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyse {
            dir,
            sort_by,
            skip_incomplete,
            path_marker,
            output,
        } => cmd_analyse(&dir, sort_by, skip_incomplete, path_marker, output),
        Commands::Serve {
            path_of_experiment_folder,
            top_k,
            share,
            port,
        } => {
            let deploy = DeployConfig { top_k, share, port };
            cmd_serve(&path_of_experiment_folder, deploy).await
        }
    }
}

/// Numeric columns only; clap lists them in `--help` and on a bad value.
fn sort_column_parser() -> impl TypedValueParser<Value = Column> {
    PossibleValuesParser::new(
        Column::ALL
            .into_iter()
            .filter(Column::is_numeric)
            .map(|c| c.name()),
    )
    .try_map(|name| name.parse::<Column>())
}

fn cmd_analyse(
    dir: &Path,
    sort_by: Column,
    skip_incomplete: bool,
    path_marker: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let options = AggregateOptions {
        sort_by,
        policy: if skip_incomplete {
            FailurePolicy::Skip
        } else {
            FailurePolicy::FailFast
        },
        path_marker,
    };

    let aggregation = aggregate(dir, &options)
        .with_context(|| format!("Failed to aggregate runs in {}", dir.display()))?;

    print!("{}", aggregation.table.to_latex());

    let output = output.unwrap_or_else(|| dir.join(SUMMARY_FILE));
    let file =
        File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?;
    aggregation
        .table
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        runs = aggregation.table.len(),
        output = %output.display(),
        "summary written"
    );

    if !aggregation.skipped.is_empty() {
        let runs: Vec<&str> = aggregation.skipped.iter().map(|s| s.run.as_str()).collect();
        eprintln!(
            "Skipped {} incomplete run(s): {}",
            runs.len(),
            runs.join(", ")
        );
    }
    Ok(())
}

async fn cmd_serve(folder: &Path, deploy: DeployConfig) -> Result<()> {
    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Loading {}...", folder.display()));

    let experiment = match Experiment::load(folder, deploy) {
        Ok(experiment) => experiment,
        Err(err) => {
            pb.abandon_with_message("Load failed");
            return Err(err)
                .with_context(|| format!("Failed to load experiment {}", folder.display()));
        }
    };
    pb.finish_with_message(format!("Loaded in {:.2?}", start.elapsed()));

    let addr = bind_address(&experiment.deploy);
    let state = AppState::new(experiment.predictor.clone(), experiment.title());
    serve(state, addr)
        .await
        .with_context(|| format!("Failed to serve on {addr}"))?;
    Ok(())
}
