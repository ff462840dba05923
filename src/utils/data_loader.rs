//! CSV loading and feature extraction

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Target column of every dataset artifact
pub const LABEL_COLUMN: &str = "booking_status";

/// Load a CSV file with a header row.
///
/// The whole file is used for schema inference. Missing, empty and
/// header-only files are rejected.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let start = Instant::now();
    if !path.is_file() {
        return Err(PipelineError::DataLoadError(format!(
            "dataset not found: {}",
            path.display()
        )));
    }
    let file = File::open(path)
        .map_err(|e| PipelineError::DataLoadError(format!("{}: {}", path.display(), e)))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| PipelineError::DataLoadError(format!("{}: {}", path.display(), e)))?;

    if df.height() == 0 {
        return Err(PipelineError::DataLoadError(format!(
            "dataset is empty: {}",
            path.display()
        )));
    }
    debug!(
        path = %path.display(),
        rows = df.height(),
        cols = df.width(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "CSV loaded"
    );
    Ok(df)
}

/// Write `df` as CSV with a header row, creating parent directories
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| PipelineError::Io(std::io::Error::other(format!("{}: {}", path.display(), e))))?;
    debug!(path = %path.display(), rows = df.height(), "CSV written");
    Ok(())
}

/// Values of a numeric column as f64, nulls as NaN
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::DataLoadError(format!("column '{}' not found", name)))?;
    if matches!(column.dtype(), DataType::String) {
        return Err(PipelineError::DataLoadError(format!(
            "column '{}' is not numeric",
            name
        )));
    }
    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Split a frame into a feature matrix, the label vector and the feature names.
///
/// Every column other than `label` is a feature and must be numeric.
pub fn split_features_label(df: &DataFrame, label: &str) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    if df.column(label).is_err() {
        return Err(PipelineError::DataLoadError(format!(
            "label column '{}' not found",
            label
        )));
    }
    if df.height() == 0 {
        return Err(PipelineError::DataLoadError("dataset is empty".into()));
    }

    let y = column_values(df, label)?;
    if y.iter().any(|v| v.is_nan()) {
        return Err(PipelineError::DataLoadError(format!(
            "label column '{}' has missing values",
            label
        )));
    }

    let feature_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != label)
        .map(|name| name.to_string())
        .collect();

    let col_data = feature_names
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let x = Array2::from_shape_fn((df.height(), feature_names.len()), |(r, c)| col_data[c][r]);
    Ok((x, Array1::from_vec(y), feature_names))
}
