//! Experiment tracking
//!
//! A [`TrackingSink`] records the parameters, metrics and artifacts of one
//! run. [`TrackingRun`] scopes a run: it is opened by [`TrackingRun::start`]
//! and closed when it is finished or dropped, so a run never stays open after
//! an error unwinds the training stage.

mod storage;

pub use storage::{LocalTracker, RunRecord};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => f.write_str("RUNNING"),
            RunStatus::Finished => f.write_str("FINISHED"),
            RunStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Key/value and artifact logging service
pub trait TrackingSink {
    /// Open a run and return its id
    fn start_run(&mut self, run_name: Option<&str>) -> Result<String>;

    fn end_run(&mut self, status: RunStatus) -> Result<()>;

    /// Record a file under `category` (e.g. `datasets`, `models`)
    fn log_artifact(&mut self, path: &Path, category: &str) -> Result<()>;

    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()>;

    fn log_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()>;
}

/// An open run that is closed exactly once.
///
/// Dropping the guard without calling [`TrackingRun::finish`] ends the run as
/// [`RunStatus::Failed`].
pub struct TrackingRun<'a> {
    sink: &'a mut dyn TrackingSink,
    run_id: String,
    closed: bool,
}

impl<'a> TrackingRun<'a> {
    pub fn start(sink: &'a mut dyn TrackingSink, run_name: Option<&str>) -> Result<Self> {
        let run_id = sink.start_run(run_name)?;
        Ok(Self {
            sink,
            run_id,
            closed: false,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_artifact(&mut self, path: &Path, category: &str) -> Result<()> {
        self.sink.log_artifact(path, category)
    }

    pub fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()> {
        self.sink.log_params(params)
    }

    pub fn log_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()> {
        self.sink.log_metrics(metrics)
    }

    /// Close the run as finished
    pub fn finish(mut self) -> Result<()> {
        self.closed = true;
        self.sink.end_run(RunStatus::Finished)
    }
}

impl Drop for TrackingRun<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.sink.end_run(RunStatus::Failed) {
            warn!(run_id = %self.run_id, error = %e, "Failed to close tracking run");
        }
    }
}
