//! Booking Pipeline - hotel booking cancellation training pipeline
//!
//! Fetches the raw reservations table from a blob store, splits it, turns it
//! into model-ready features, tunes a gradient-boosted classifier and records
//! the run with a local experiment tracker.
//!
//! # Modules
//!
//! ## Stages
//! - [`ingestion`] - Raw data download and deterministic train/test split
//! - [`processing`] - Encoding, imputation, skew reduction, balancing, feature selection
//! - [`training`] - Boosted trees, randomized search, cross-validation, metrics
//! - [`pipeline`] - Runs the stages in order
//!
//! ## Infrastructure
//! - [`config`] - YAML configuration and artifact layout
//! - [`storage`] - Blob store backends
//! - [`tracking`] - Experiment tracking
//! - [`logging`] - Stdout and daily file logging
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Stages
pub mod ingestion;
pub mod processing;
pub mod training;
pub mod pipeline;

// Infrastructure
pub mod config;
pub mod storage;
pub mod tracking;
pub mod logging;
pub mod utils;

// Services
pub mod cli;

pub use config::{ArtifactPaths, Configuration};
pub use error::{ErrorKind, PipelineError, Result};
pub use pipeline::{PipelineReport, TrainingPipeline};
pub use training::{Classifier, LGBMClassifier, ModelTrainer, TrainingReport};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
