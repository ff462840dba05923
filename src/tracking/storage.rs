//! File-system tracking backend
//!
//! Layout: `<root>/<experiment>/<run_id>/{meta,params,metrics}.json` with
//! logged files copied under `artifacts/<category>/`.

use super::{RunStatus, TrackingSink};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Everything recorded for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub run_name: String,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub artifacts: Vec<String>,
    #[serde(skip)]
    pub params: BTreeMap<String, String>,
    #[serde(skip)]
    pub metrics: BTreeMap<String, f64>,
}

impl RunRecord {
    fn new(experiment: &str, run_name: Option<&str>) -> Self {
        let run_id = Uuid::new_v4().simple().to_string();
        let start_time = Utc::now();
        let run_name = run_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("run_{}", start_time.format("%Y%m%d_%H%M%S")));
        Self {
            run_id,
            run_name,
            experiment: experiment.to_string(),
            status: RunStatus::Running,
            start_time,
            end_time: None,
            artifacts: Vec::new(),
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }
}

fn log_err(context: &str, path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::LoggingError(format!("{} {}: {}", context, path.display(), e))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| log_err("failed to encode", path, e))?;
    fs::write(path, json).map_err(|e| log_err("failed to write", path, e))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| log_err("failed to read", path, e))?;
    serde_json::from_str(&text).map_err(|e| log_err("failed to decode", path, e))
}

/// Tracker that stores runs as JSON files on local disk
pub struct LocalTracker {
    base_dir: PathBuf,
    experiment: String,
    active: Option<RunRecord>,
}

impl LocalTracker {
    pub fn new(base_dir: impl Into<PathBuf>, experiment: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            experiment: experiment.into(),
            active: None,
        }
    }

    pub fn experiment_dir(&self) -> PathBuf {
        self.base_dir.join(&self.experiment)
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.experiment_dir().join(run_id)
    }

    pub fn active_run_id(&self) -> Option<&str> {
        self.active.as_ref().map(|r| r.run_id.as_str())
    }

    /// Read a stored run back from disk
    pub fn load_run(&self, run_id: &str) -> Result<RunRecord> {
        let dir = self.run_dir(run_id);
        let mut record: RunRecord = read_json(&dir.join("meta.json"))?;
        record.params = read_json(&dir.join("params.json"))?;
        record.metrics = read_json(&dir.join("metrics.json"))?;
        Ok(record)
    }

    /// Ids of every run stored for this experiment
    pub fn list_runs(&self) -> Result<Vec<String>> {
        let dir = self.experiment_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| log_err("failed to list", &dir, e))? {
            let entry = entry.map_err(|e| log_err("failed to list", &dir, e))?;
            if entry.path().join("meta.json").is_file() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn active_mut(&mut self) -> Result<&mut RunRecord> {
        self.active
            .as_mut()
            .ok_or_else(|| PipelineError::LoggingError("no active run".into()))
    }

    fn flush(&self, record: &RunRecord) -> Result<()> {
        let dir = self.run_dir(&record.run_id);
        write_json(&dir.join("meta.json"), record)?;
        write_json(&dir.join("params.json"), &record.params)?;
        write_json(&dir.join("metrics.json"), &record.metrics)
    }
}

impl TrackingSink for LocalTracker {
    fn start_run(&mut self, run_name: Option<&str>) -> Result<String> {
        if let Some(active) = &self.active {
            return Err(PipelineError::LoggingError(format!(
                "run {} is still active",
                active.run_id
            )));
        }
        let record = RunRecord::new(&self.experiment, run_name);
        let dir = self.run_dir(&record.run_id);
        fs::create_dir_all(&dir).map_err(|e| log_err("failed to create", &dir, e))?;
        self.flush(&record)?;

        info!(experiment = %self.experiment, run_id = %record.run_id, "Tracking run started");
        let run_id = record.run_id.clone();
        self.active = Some(record);
        Ok(run_id)
    }

    fn end_run(&mut self, status: RunStatus) -> Result<()> {
        let mut record = self
            .active
            .take()
            .ok_or_else(|| PipelineError::LoggingError("no active run".into()))?;
        record.status = status;
        record.end_time = Some(Utc::now());
        self.flush(&record)?;
        info!(run_id = %record.run_id, status = %status, "Tracking run ended");
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path, category: &str) -> Result<()> {
        let file_name = path
            .file_name()
            .ok_or_else(|| log_err("not a file", path, "no file name"))?
            .to_owned();
        let run_id = self.active_mut()?.run_id.clone();
        let dest_dir = self.run_dir(&run_id).join("artifacts").join(category);
        fs::create_dir_all(&dest_dir).map_err(|e| log_err("failed to create", &dest_dir, e))?;
        let dest = dest_dir.join(&file_name);
        fs::copy(path, &dest).map_err(|e| log_err("failed to copy", path, e))?;

        let record = self.active_mut()?;
        record
            .artifacts
            .push(format!("{}/{}", category, file_name.to_string_lossy()));
        let record = record.clone();
        self.flush(&record)?;
        debug!(artifact = %dest.display(), "Artifact logged");
        Ok(())
    }

    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()> {
        let record = self.active_mut()?;
        record.params.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        let record = record.clone();
        self.flush(&record)
    }

    fn log_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()> {
        let record = self.active_mut()?;
        record.metrics.extend(metrics.iter().map(|(k, v)| (k.clone(), *v)));
        let record = record.clone();
        self.flush(&record)
    }
}
