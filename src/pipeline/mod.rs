//! Pipeline driver
//!
//! Runs ingestion, processing and training in order over a fixed
//! [`ArtifactPaths`] layout. The configuration is loaded before any stage
//! starts; the first failing stage stops the run and nothing already written
//! is removed.

use crate::config::{ArtifactPaths, Configuration};
use crate::error::Result;
use crate::ingestion::{DataIngestion, SplitSummary};
use crate::processing::DataProcessor;
use crate::storage::{self, BlobStore};
use crate::tracking::LocalTracker;
use crate::training::{ModelTrainer, TrainingReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

/// Outputs of a full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub split: SplitSummary,
    pub processed_train: PathBuf,
    pub processed_test: PathBuf,
    pub training: TrainingReport,
}

pub struct TrainingPipeline {
    config_path: PathBuf,
    paths: ArtifactPaths,
    store: Box<dyn BlobStore>,
}

impl TrainingPipeline {
    /// Pipeline reading `config_path`, with the blob store picked from the
    /// environment
    pub fn new(config_path: impl Into<PathBuf>, paths: ArtifactPaths) -> Self {
        Self {
            config_path: config_path.into(),
            paths,
            store: storage::from_env(),
        }
    }

    pub fn with_blob_store(mut self, store: Box<dyn BlobStore>) -> Self {
        self.store = store;
        self
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn load_config(&self) -> Result<Configuration> {
        Configuration::load(&self.config_path)
    }

    /// Ingestion stage on its own
    pub fn ingest(&self) -> Result<SplitSummary> {
        let config = self.load_config()?;
        self.ingest_with(&config)
    }

    /// Processing stage on its own
    pub fn process(&self) -> Result<(PathBuf, PathBuf)> {
        let config = self.load_config()?;
        self.process_with(&config)
    }

    /// Training stage on its own
    pub fn train(&self) -> Result<TrainingReport> {
        let config = self.load_config()?;
        self.train_with(&config)
    }

    fn ingest_with(&self, config: &Configuration) -> Result<SplitSummary> {
        DataIngestion::new(config, &self.paths, self.store.as_ref())?.run()
    }

    fn process_with(&self, config: &Configuration) -> Result<(PathBuf, PathBuf)> {
        DataProcessor::new(config, &self.paths)?.process()
    }

    fn train_with(&self, config: &Configuration) -> Result<TrainingReport> {
        let tracking = config.tracking()?;
        let mut tracker = LocalTracker::new(&self.paths.tracking_dir, tracking.experiment_name);
        ModelTrainer::new(config, &self.paths)?.run(&mut tracker)
    }

    /// Every stage in order
    pub fn run(&self) -> Result<PipelineReport> {
        let start = Instant::now();
        info!(config = %self.config_path.display(), root = %self.paths.root().display(), "Starting training pipeline");

        let outcome = self.load_config().and_then(|config| {
            let split = self.ingest_with(&config)?;
            let (processed_train, processed_test) = self.process_with(&config)?;
            let training = self.train_with(&config)?;
            Ok(PipelineReport {
                split,
                processed_train,
                processed_test,
                training,
            })
        });

        match &outcome {
            Ok(_) => info!(elapsed_ms = start.elapsed().as_millis() as u64, "Training pipeline finished"),
            Err(e) => error!(kind = ?e.kind(), error = %e, "Training pipeline aborted"),
        }
        outcome
    }
}
