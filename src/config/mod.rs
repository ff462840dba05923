//! Pipeline configuration
//!
//! The YAML file is loaded once into a [`Configuration`]; stages read typed
//! views of their own section from it.

pub mod model_params;
pub mod paths;

pub use model_params::{default_search_controls, default_search_space};
pub use paths::{ArtifactPaths, CONFIG_PATH};

use crate::error::{PipelineError, Result};
use crate::training::search::SearchControls;
use crate::training::search_space::{ParamDistribution, SearchSpace};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Parsed configuration file, immutable after load
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    root: Value,
    source: Option<PathBuf>,
}

impl Configuration {
    /// Read and parse a YAML file whose root is a mapping
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            error!(path = %path.display(), "Configuration file not found");
            return Err(PipelineError::ConfigNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| PipelineError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::parse(&text).map_err(|reason| {
            error!(path = %path.display(), %reason, "Failed to parse configuration");
            PipelineError::ConfigParse {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        config.source = Some(path.to_path_buf());
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse YAML text that did not come from a file
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::parse(text).map_err(|reason| PipelineError::ConfigParse {
            path: PathBuf::from("<inline>"),
            reason,
        })
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let root: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
        if !root.is_mapping() {
            return Err("top level is not a mapping".to_string());
        }
        Ok(Self { root, source: None })
    }

    /// File this configuration was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Look up a dotted key such as `data_ingestion.train_ratio`
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.root, |node, part| node.get(part))
    }

    fn section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.root.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_yaml::from_value(value.clone())
                .map(Some)
                .map_err(|e| PipelineError::InvalidConfig(format!("{}: {}", name, e))),
        }
    }

    /// Required `data_ingestion` section
    pub fn data_ingestion(&self) -> Result<DataIngestionConfig> {
        let section: DataIngestionConfig = self
            .section("data_ingestion")?
            .ok_or_else(|| PipelineError::InvalidConfig("missing 'data_ingestion' section".into()))?;
        section.validate()?;
        Ok(section)
    }

    /// `data_processing` section, defaults when absent
    pub fn data_processing(&self) -> Result<DataProcessingConfig> {
        Ok(self.section("data_processing")?.unwrap_or_default())
    }

    /// `model_training` section resolved against the default search setup
    pub fn model_training(&self) -> Result<ModelTrainingConfig> {
        let raw: RawModelTraining = self.section("model_training")?.unwrap_or_default();
        let mut space = default_search_space();
        if let Some(params) = raw.params {
            space = SearchSpace::new();
            for (key, value) in params {
                let name = key
                    .as_str()
                    .ok_or_else(|| PipelineError::InvalidConfig(format!("parameter name {:?} is not a string", key)))?
                    .to_string();
                let dist: ParamDistribution = serde_yaml::from_value(value).map_err(|e| {
                    PipelineError::InvalidConfig(format!("model_training.params.{}: {}", name, e))
                })?;
                space.insert(name, dist);
            }
        }
        space.validate()?;

        Ok(ModelTrainingConfig {
            search_space: space,
            controls: raw.random_search.unwrap_or_else(default_search_controls),
        })
    }

    /// `tracking` section, defaults when absent
    pub fn tracking(&self) -> Result<TrackingConfig> {
        Ok(self.section("tracking")?.unwrap_or_default())
    }
}

/// Where the raw data lives and how it is split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    pub bucket_name: String,
    pub bucket_file_name: String,
    pub train_ratio: f64,
}

impl DataIngestionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        if self.bucket_name.is_empty() || self.bucket_file_name.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "bucket_name and bucket_file_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Feature processing options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataProcessingConfig {
    /// Columns to label-encode; every string column when absent
    pub categorical_columns: Option<Vec<String>>,
    /// Columns eligible for the skew transform; every numeric column when absent
    pub numerical_columns: Option<Vec<String>>,
    pub skewness_threshold: f64,
    pub no_of_features: usize,
    pub drop_columns: Vec<String>,
    pub random_state: u64,
}

impl Default for DataProcessingConfig {
    fn default() -> Self {
        Self {
            categorical_columns: None,
            numerical_columns: None,
            skewness_threshold: 5.0,
            no_of_features: 10,
            drop_columns: vec!["Booking_ID".to_string(), "Unnamed: 0".to_string()],
            random_state: 42,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawModelTraining {
    params: Option<serde_yaml::Mapping>,
    random_search: Option<SearchControls>,
}

/// Resolved search setup for the training stage
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTrainingConfig {
    pub search_space: SearchSpace,
    pub controls: SearchControls,
}

impl Default for ModelTrainingConfig {
    fn default() -> Self {
        Self {
            search_space: default_search_space(),
            controls: default_search_controls(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub experiment_name: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            experiment_name: "booking-cancellation".to_string(),
        }
    }
}
