//! On-disk artifact layout shared by every stage

use std::path::{Path, PathBuf};

/// Default location of the pipeline configuration file
pub const CONFIG_PATH: &str = "config/config.yaml";

pub const RAW_DIR: &str = "artifacts/raw";
pub const PROCESSED_DIR: &str = "artifacts/processed";
pub const MODEL_DIR: &str = "artifacts/models";
pub const TRACKING_DIR: &str = "mlruns";
pub const LOG_DIR: &str = "logs";

/// Fixed artifact locations resolved against a root directory.
///
/// Built once per run and handed to each stage by reference, so a test can
/// point the whole pipeline at a scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub root: PathBuf,
    pub raw_dir: PathBuf,
    pub raw_file: PathBuf,
    pub train_file: PathBuf,
    pub test_file: PathBuf,
    pub processed_dir: PathBuf,
    pub processed_train_file: PathBuf,
    pub processed_test_file: PathBuf,
    pub model_output: PathBuf,
    pub tracking_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let raw_dir = root.join(RAW_DIR);
        let processed_dir = root.join(PROCESSED_DIR);

        Self {
            raw_file: raw_dir.join("raw.csv"),
            train_file: raw_dir.join("train.csv"),
            test_file: raw_dir.join("test.csv"),
            processed_train_file: processed_dir.join("train_processed.csv"),
            processed_test_file: processed_dir.join("test_processed.csv"),
            model_output: root.join(MODEL_DIR).join("lgbm_model.pkl"),
            tracking_dir: root.join(TRACKING_DIR),
            raw_dir,
            processed_dir,
            root,
        }
    }

    /// Top-level `artifacts/` directory under the root
    pub fn artifacts_dir(&self) -> PathBuf {
        self.root.join("artifacts")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(".")
    }
}
