//! Command-line interface
//!
//! Each subcommand runs one stage of the pipeline; no subcommand runs all of
//! them. Progress goes to the log; a short summary is printed on success.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{ArtifactPaths, CONFIG_PATH};
use crate::ingestion::SplitSummary;
use crate::pipeline::{PipelineReport, TrainingPipeline};
use crate::training::TrainingReport;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("    {:<18} {}", muted(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "booking-pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a hotel booking cancellation classifier")]
#[command(long_about = None)]
pub struct Cli {
    /// Pipeline configuration file
    #[arg(short, long, global = true, default_value = CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory that artifacts/, mlruns/ and logs/ are created under
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Ingest, process and train in one go
    Run,
    /// Download the raw file and split it into train and test
    Ingest,
    /// Turn the raw split into model-ready feature tables
    Process,
    /// Tune, evaluate, save and track the model
    Train,
}

impl Cli {
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.root)
    }

    fn pipeline(&self) -> TrainingPipeline {
        TrainingPipeline::new(&self.config, self.paths())
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn print_split(split: &SplitSummary) {
    kv("rows", &split.total_rows.to_string());
    kv("train rows", &split.train_rows.to_string());
    kv("test rows", &split.test_rows.to_string());
}

fn print_processed(train: &Path, test: &Path) {
    kv("train", &train.display().to_string());
    kv("test", &test.display().to_string());
}

fn print_training(report: &TrainingReport) {
    kv("run id", &report.run_id);
    kv("cv score", &format!("{:.4}", report.cv_score));
    kv("accuracy", &format!("{:.4}", report.metrics.accuracy));
    kv("precision", &format!("{:.4}", report.metrics.precision));
    kv("recall", &format!("{:.4}", report.metrics.recall));
    kv("f1 score", &format!("{:.4}", report.metrics.f1_score));
    kv("model", &report.model_path.display().to_string());
}

fn finished(start: Instant) {
    println!();
    step_ok(&format!("finished in {:.2}s", start.elapsed().as_secs_f64()));
}

/// Full pipeline
pub fn cmd_run(cli: &Cli) -> anyhow::Result<PipelineReport> {
    let start = Instant::now();
    let report = cli.pipeline().run()?;

    section("Ingestion");
    print_split(&report.split);
    section("Processing");
    print_processed(&report.processed_train, &report.processed_test);
    section("Training");
    print_training(&report.training);
    finished(start);
    Ok(report)
}

pub fn cmd_ingest(cli: &Cli) -> anyhow::Result<SplitSummary> {
    let start = Instant::now();
    let split = cli.pipeline().ingest()?;
    section("Ingestion");
    print_split(&split);
    finished(start);
    Ok(split)
}

pub fn cmd_process(cli: &Cli) -> anyhow::Result<(PathBuf, PathBuf)> {
    let start = Instant::now();
    let (train, test) = cli.pipeline().process()?;
    section("Processing");
    print_processed(&train, &test);
    finished(start);
    Ok((train, test))
}

pub fn cmd_train(cli: &Cli) -> anyhow::Result<TrainingReport> {
    let start = Instant::now();
    let report = cli.pipeline().train()?;
    section("Training");
    print_training(&report);
    finished(start);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["booking-pipeline"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(CONFIG_PATH));
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommand_with_global_flags() {
        let cli = Cli::try_parse_from(["booking-pipeline", "train", "--config", "c.yaml", "--root", "/tmp/x"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Train));
        assert_eq!(cli.config, PathBuf::from("c.yaml"));
        assert_eq!(cli.paths().root(), Path::new("/tmp/x"));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["booking-pipeline", "serve"]).is_err());
    }
}
