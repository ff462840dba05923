//! Data ingestion stage: fetch the raw object and split it

use crate::config::{ArtifactPaths, Configuration, DataIngestionConfig};
use crate::error::{PipelineError, Result};
use crate::storage::BlobStore;
use crate::utils::{load_csv, write_csv};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Seed of the train/test permutation
pub const SPLIT_SEED: u64 = 42;

/// Name of the column that carries the original row position
pub const INDEX_COLUMN: &str = "index";

/// Row counts of a finished split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSummary {
    pub total_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub struct DataIngestion<'a> {
    config: DataIngestionConfig,
    paths: &'a ArtifactPaths,
    store: &'a dyn BlobStore,
    seed: u64,
}

impl<'a> DataIngestion<'a> {
    /// Fails with `InvalidConfig` before touching the file system
    pub fn new(config: &Configuration, paths: &'a ArtifactPaths, store: &'a dyn BlobStore) -> Result<Self> {
        let config = config.data_ingestion()?;
        info!(
            bucket = %config.bucket_name,
            object = %config.bucket_file_name,
            train_ratio = config.train_ratio,
            "DataIngestion initialized"
        );
        Ok(Self {
            config,
            paths,
            store,
            seed: SPLIT_SEED,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Download the raw object to the raw artifact location
    pub fn fetch(&self) -> Result<()> {
        fs::create_dir_all(&self.paths.raw_dir)?;
        self.store
            .download(&self.config.bucket_name, &self.config.bucket_file_name, &self.paths.raw_file)?;
        info!(store = %self.store.location(), path = %self.paths.raw_file.display(), "Raw data downloaded");
        Ok(())
    }

    pub fn split(&self) -> Result<SplitSummary> {
        split_dataset(
            &self.paths.raw_file,
            &self.paths.train_file,
            &self.paths.test_file,
            self.config.train_ratio,
            self.seed,
        )
    }

    pub fn run(&self) -> Result<SplitSummary> {
        info!("Starting data ingestion");
        let outcome = self.fetch().and_then(|_| self.split());
        match &outcome {
            Ok(summary) => info!(
                train_rows = summary.train_rows,
                test_rows = summary.test_rows,
                "Data ingestion completed"
            ),
            Err(e) => error!(error = %e, "Data ingestion failed"),
        }
        outcome
    }
}

/// Split `source` into `train` and `test` with a seeded permutation.
///
/// The train set gets `round(train_ratio * N)` rows, halves rounding away
/// from zero. A ratio that leaves either side empty is a `DataLoadError`.
/// Both outputs start with an `index` column holding each row's position in
/// `source`; a source that already has an `index` column is rejected.
pub fn split_dataset(source: &Path, train: &Path, test: &Path, train_ratio: f64, seed: u64) -> Result<SplitSummary> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "train_ratio must be in (0, 1), got {}",
            train_ratio
        )));
    }

    let df = load_csv(source)?;
    if df.column(INDEX_COLUMN).is_ok() {
        return Err(PipelineError::DataLoadError(format!(
            "{} already has a column named '{}'",
            source.display(),
            INDEX_COLUMN
        )));
    }
    let df = df.with_row_index(INDEX_COLUMN.into(), None)?;

    let total_rows = df.height();
    let train_rows = (train_ratio * total_rows as f64).round() as usize;
    if train_rows == 0 || train_rows == total_rows {
        return Err(PipelineError::DataLoadError(format!(
            "{} rows cannot be split with train_ratio {}",
            total_rows, train_ratio
        )));
    }

    let mut order: Vec<IdxSize> = (0..total_rows as IdxSize).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    let (train_idx, test_idx) = order.split_at(train_rows);

    let mut train_df = df.take(&IdxCa::from_vec("idx".into(), train_idx.to_vec()))?;
    let mut test_df = df.take(&IdxCa::from_vec("idx".into(), test_idx.to_vec()))?;
    write_csv(&mut train_df, train)?;
    write_csv(&mut test_df, test)?;

    info!(
        total_rows,
        train_rows,
        test_rows = total_rows - train_rows,
        "Data split into train and test sets"
    );
    Ok(SplitSummary {
        total_rows,
        train_rows,
        test_rows: total_rows - train_rows,
    })
}
