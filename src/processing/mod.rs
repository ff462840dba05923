//! Data processing stage
//!
//! Turns the raw train/test partitions into model-ready numeric tables:
//!
//! 1. drop identifier and index columns
//! 2. drop duplicate training rows
//! 3. label-encode categorical columns (codes fitted on train)
//! 4. fill numeric gaps with the training median
//! 5. `log1p` numeric columns whose training skewness exceeds the threshold
//! 6. oversample minority classes in the training set
//! 7. keep the features most correlated with the label
//!
//! Every statistic is fitted on the training partition and then applied
//! unchanged to the test partition.

mod encoding;
mod feature_selection;
mod sampling;
mod transforms;

pub use encoding::{LabelEncoder, UNKNOWN_CODE};
pub use feature_selection::top_k_by_correlation;
pub use sampling::RandomOverSampler;
pub use transforms::{median, pearson, skewness};

use crate::config::{ArtifactPaths, Configuration, DataProcessingConfig};
use crate::error::{PipelineError, Result};
use crate::ingestion::INDEX_COLUMN;
use crate::utils::{column_values, load_csv, write_csv, LABEL_COLUMN};
use ndarray::Array1;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info};

fn proc_err(context: &str, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::ProcessingError(format!("{}: {}", context, e))
}

/// Column-major numeric table
#[derive(Debug, Clone, PartialEq)]
struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Frame {
    fn height(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }

    fn take_rows(&mut self, rows: &[usize]) {
        for col in &mut self.columns {
            *col = rows.iter().map(|&r| col[r]).collect();
        }
    }

    fn retain_columns(&mut self, keep: &[String]) {
        let mut names = Vec::with_capacity(keep.len());
        let mut columns = Vec::with_capacity(keep.len());
        for name in keep {
            if let Some(i) = self.position(name) {
                names.push(self.names[i].clone());
                columns.push(std::mem::take(&mut self.columns[i]));
            }
        }
        self.names = names;
        self.columns = columns;
    }

    fn into_dataframe(self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .names
            .into_iter()
            .zip(self.columns)
            .map(|(name, values)| Column::new(name.into(), values))
            .collect();
        DataFrame::new(columns).map_err(|e| proc_err("failed to assemble processed table", e))
    }
}

/// Text values of a column; non-string columns are cast first
fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::DataLoadError(format!("column '{}' not found", name)))?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| proc_err(name, e))?;
    let values = series.str().map_err(|e| proc_err(name, e))?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

fn is_index_like(name: &str) -> bool {
    name.is_empty() || name == INDEX_COLUMN || name.starts_with("Unnamed")
}

pub struct DataProcessor<'a> {
    config: DataProcessingConfig,
    paths: &'a ArtifactPaths,
}

impl<'a> DataProcessor<'a> {
    pub fn new(config: &Configuration, paths: &'a ArtifactPaths) -> Result<Self> {
        Ok(Self::with_config(config.data_processing()?, paths))
    }

    pub fn with_config(config: DataProcessingConfig, paths: &'a ArtifactPaths) -> Self {
        Self { config, paths }
    }

    /// Read the split artifacts, transform them and write the processed ones
    pub fn process(&self) -> Result<(PathBuf, PathBuf)> {
        info!("Starting data processing");
        let outcome = self.process_files();
        if let Err(e) = &outcome {
            error!(error = %e, "Data processing failed");
        }
        outcome
    }

    fn process_files(&self) -> Result<(PathBuf, PathBuf)> {
        let train = load_csv(&self.paths.train_file)?;
        let test = load_csv(&self.paths.test_file)?;

        let (mut train, mut test) = self.transform(&train, &test)?;
        write_csv(&mut train, &self.paths.processed_train_file)?;
        write_csv(&mut test, &self.paths.processed_test_file)?;

        info!(
            train = %self.paths.processed_train_file.display(),
            test = %self.paths.processed_test_file.display(),
            "Processed data saved"
        );
        Ok((
            self.paths.processed_train_file.clone(),
            self.paths.processed_test_file.clone(),
        ))
    }

    /// Apply every processing step to in-memory frames
    pub fn transform(&self, train: &DataFrame, test: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        for (df, which) in [(train, "train"), (test, "test")] {
            if df.column(LABEL_COLUMN).is_err() {
                return Err(PipelineError::DataLoadError(format!(
                    "{} set has no '{}' column",
                    which, LABEL_COLUMN
                )));
            }
        }

        let columns = self.kept_columns(train);
        let categorical = self.categorical_columns(train, &columns);
        debug!(columns = columns.len(), categorical = ?categorical, "Columns resolved");

        let mut train_frame = Frame {
            names: columns.clone(),
            columns: Vec::with_capacity(columns.len()),
        };
        let mut test_frame = Frame {
            names: columns.clone(),
            columns: Vec::with_capacity(columns.len()),
        };
        for name in &columns {
            if categorical.contains(name) {
                let train_text = string_values(train, name)?;
                let test_text = string_values(test, name)?;
                let encoder = LabelEncoder::fit(train_text.iter().map(Option::as_deref));
                train_frame.columns.push(encoder.transform(train_text.iter().map(Option::as_deref)));
                test_frame.columns.push(encoder.transform(test_text.iter().map(Option::as_deref)));
            } else {
                train_frame.columns.push(column_values(train, name).map_err(|e| proc_err("train", e))?);
                test_frame.columns.push(column_values(test, name).map_err(|e| proc_err("test", e))?);
            }
        }

        self.drop_duplicates(&mut train_frame);
        self.fill_missing(&mut train_frame, &mut test_frame)?;
        self.reduce_skew(&mut train_frame, &mut test_frame, &categorical);
        self.balance(&mut train_frame)?;
        let selected = self.select_features(&train_frame);
        train_frame.retain_columns(&selected);
        test_frame.retain_columns(&selected);

        info!(
            train_rows = train_frame.height(),
            test_rows = test_frame.height(),
            features = selected.len().saturating_sub(1),
            "Processing finished"
        );
        Ok((train_frame.into_dataframe()?, test_frame.into_dataframe()?))
    }

    fn kept_columns(&self, train: &DataFrame) -> Vec<String> {
        train
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .filter(|n| !is_index_like(n) && !self.config.drop_columns.contains(n))
            .collect()
    }

    /// Configured categorical columns plus any remaining text column
    fn categorical_columns(&self, train: &DataFrame, columns: &[String]) -> HashSet<String> {
        let configured: HashSet<&String> = self.config.categorical_columns.iter().flatten().collect();
        columns
            .iter()
            .filter(|name| {
                configured.contains(name)
                    || train
                        .column(name)
                        .map(|c| matches!(c.dtype(), DataType::String))
                        .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn drop_duplicates(&self, frame: &mut Frame) {
        let mut seen = HashSet::with_capacity(frame.height());
        let rows: Vec<usize> = (0..frame.height())
            .filter(|&r| {
                let key: Vec<u64> = frame.columns.iter().map(|c| (c[r] + 0.0).to_bits()).collect();
                seen.insert(key)
            })
            .collect();
        let dropped = frame.height() - rows.len();
        if dropped > 0 {
            frame.take_rows(&rows);
            info!(dropped, "Duplicate training rows removed");
        }
    }

    fn fill_missing(&self, train: &mut Frame, test: &mut Frame) -> Result<()> {
        for (i, name) in train.names.iter().enumerate() {
            let fill = median(&train.columns[i]).unwrap_or(0.0);
            let filled = transforms::fill_nan(&mut train.columns[i], fill) + transforms::fill_nan(&mut test.columns[i], fill);
            if filled > 0 {
                if name == LABEL_COLUMN {
                    return Err(PipelineError::ProcessingError(format!(
                        "'{}' has missing values",
                        LABEL_COLUMN
                    )));
                }
                debug!(column = %name, filled, fill, "Missing values filled");
            }
        }
        Ok(())
    }

    fn reduce_skew(&self, train: &mut Frame, test: &mut Frame, categorical: &HashSet<String>) {
        let threshold = self.config.skewness_threshold;
        for i in 0..train.names.len() {
            let name = &train.names[i];
            let eligible = name != LABEL_COLUMN
                && !categorical.contains(name)
                && self
                    .config
                    .numerical_columns
                    .as_ref()
                    .map_or(true, |cols| cols.contains(name));
            if !eligible {
                continue;
            }
            let skew = skewness(&train.columns[i]);
            if skew > threshold && transforms::can_log1p(&train.columns[i]) && transforms::can_log1p(&test.columns[i]) {
                transforms::log1p_in_place(&mut train.columns[i]);
                transforms::log1p_in_place(&mut test.columns[i]);
                debug!(column = %name, skew, "log1p applied");
            }
        }
    }

    fn balance(&self, train: &mut Frame) -> Result<()> {
        let labels = train
            .column(LABEL_COLUMN)
            .map(|c| Array1::from_vec(c.to_vec()))
            .ok_or_else(|| PipelineError::ProcessingError(format!("'{}' column lost", LABEL_COLUMN)))?;
        let rows = RandomOverSampler::new(self.config.random_state).resample_indices(&labels);
        if rows.len() > train.height() {
            info!(added = rows.len() - train.height(), "Minority classes oversampled");
            train.take_rows(&rows);
        }
        Ok(())
    }

    /// Selected feature names in table order, label last
    fn select_features(&self, train: &Frame) -> Vec<String> {
        let Some(target) = train.column(LABEL_COLUMN) else {
            return Vec::new();
        };
        let features: Vec<usize> = (0..train.names.len())
            .filter(|&i| train.names[i] != LABEL_COLUMN)
            .collect();
        let columns: Vec<&[f64]> = features.iter().map(|&i| train.columns[i].as_slice()).collect();

        let mut selected: Vec<String> = top_k_by_correlation(&columns, target, self.config.no_of_features)
            .into_iter()
            .map(|k| train.names[features[k]].clone())
            .collect();
        info!(selected = ?selected, "Features selected");
        selected.push(LABEL_COLUMN.to_string());
        selected
    }
}
