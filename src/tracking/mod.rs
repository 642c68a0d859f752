//! Experiment tracking
//!
//! Records what a training run logged: hyperparameters and a series of
//! `(step, value)` points per metric. Runs are numbered per experiment; the
//! number is the `v_num` shown in the progress line.
//!
//! # Example
//!
//! ```
//! use aprendiz::tracking::{ExperimentTracker, InMemoryBackend, RunStatus};
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = ExperimentTracker::new("mnist-linear", InMemoryBackend::new())?;
//!
//! let run_id = tracker.start_run(Some("baseline"))?;
//! tracker.log_param(&run_id, "learning_rate", "0.01")?;
//! tracker.log_metric(&run_id, "loss_epoch", 0.7, 0)?;
//! tracker.log_metric(&run_id, "loss_epoch", 0.4, 1)?;
//! tracker.end_run(&run_id, RunStatus::Completed)?;
//!
//! let run = tracker.get_run(&run_id)?;
//! assert_eq!(run.latest("loss_epoch"), Some(0.4));
//! # Ok(())
//! # }
//! ```

mod storage;


pub use storage::{InMemoryBackend, JsonFileBackend, TrackingBackend};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Status of a tracking run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    Completed,
    Failed,
}

/// One logged value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub step: usize,
    pub value: f32,
}

/// A single training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub run_name: Option<String>,
    pub experiment_name: String,
    /// Sequence number within the experiment, starting at 0
    pub version: u32,
    pub status: RunStatus,
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, Vec<MetricPoint>>,
    pub start_time_ms: u64,
    pub end_time_ms: Option<u64>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Run {
    fn new(experiment_name: &str, version: u32, run_name: Option<String>) -> Self {
        Self {
            run_id: format!("{experiment_name}-v{version}"),
            run_name,
            experiment_name: experiment_name.to_string(),
            version,
            status: RunStatus::Active,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time_ms: now_ms(),
            end_time_ms: None,
        }
    }

    /// Every point logged for `name`, in logging order
    pub fn series(&self, name: &str) -> &[MetricPoint] {
        self.metrics.get(name).map_or(&[], Vec::as_slice)
    }

    /// Most recent value logged for `name`
    pub fn latest(&self, name: &str) -> Option<f32> {
        self.series(name).last().map(|p| p.value)
    }

    /// Wall time of a finished run
    pub fn duration_ms(&self) -> Option<u64> {
        self.end_time_ms
            .map(|end| end.saturating_sub(self.start_time_ms))
    }
}

/// Errors from experiment tracking
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Run is not active: {0}")]
    RunNotActive(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed run record: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackingError>;

/// Experiment tracker
///
/// Active runs live in memory and are written to the backend when flushed or
/// ended.
#[derive(Debug)]
pub struct ExperimentTracker<B: TrackingBackend> {
    experiment_name: String,
    backend: B,
    active_runs: HashMap<String, Run>,
    next_version: u32,
}

impl<B: TrackingBackend> ExperimentTracker<B> {
    /// Create a tracker, continuing version numbering after any runs the
    /// backend already holds for this experiment
    pub fn new(experiment_name: impl Into<String>, backend: B) -> Result<Self> {
        let experiment_name = experiment_name.into();
        let next_version = backend
            .list_runs()?
            .iter()
            .filter(|r| r.experiment_name == experiment_name)
            .map(|r| r.version + 1)
            .max()
            .unwrap_or(0);

        Ok(Self {
            experiment_name,
            backend,
            active_runs: HashMap::new(),
            next_version,
        })
    }

    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Start a new run and return its id
    pub fn start_run(&mut self, run_name: Option<&str>) -> Result<String> {
        let run = Run::new(
            &self.experiment_name,
            self.next_version,
            run_name.map(String::from),
        );
        self.next_version += 1;

        let run_id = run.run_id.clone();
        self.active_runs.insert(run_id.clone(), run);
        Ok(run_id)
    }

    fn active_mut(&mut self, run_id: &str) -> Result<&mut Run> {
        self.active_runs
            .get_mut(run_id)
            .ok_or_else(|| TrackingError::RunNotActive(run_id.to_string()))
    }

    pub fn log_param(&mut self, run_id: &str, key: &str, value: &str) -> Result<()> {
        self.active_mut(run_id)?
            .params
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn log_metric(&mut self, run_id: &str, key: &str, value: f32, step: usize) -> Result<()> {
        self.active_mut(run_id)?
            .metrics
            .entry(key.to_string())
            .or_default()
            .push(MetricPoint { step, value });
        Ok(())
    }

    /// Persist the current state of an active run without ending it
    pub fn flush(&mut self, run_id: &str) -> Result<()> {
        let run = self
            .active_runs
            .get(run_id)
            .ok_or_else(|| TrackingError::RunNotActive(run_id.to_string()))?;
        self.backend.save_run(run)
    }

    /// End a run and persist it
    pub fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        let mut run = self
            .active_runs
            .remove(run_id)
            .ok_or_else(|| TrackingError::RunNotFound(run_id.to_string()))?;

        run.status = status;
        run.end_time_ms = Some(now_ms());
        self.backend.save_run(&run)
    }

    /// Look a run up, active runs first
    pub fn get_run(&self, run_id: &str) -> Result<Run> {
        match self.active_runs.get(run_id) {
            Some(run) => Ok(run.clone()),
            None => self.backend.load_run(run_id),
        }
    }

    /// All runs of this experiment ordered by version
    pub fn list_runs(&self) -> Result<Vec<Run>> {
        let mut runs: Vec<Run> = self
            .backend
            .list_runs()?
            .into_iter()
            .filter(|r| r.experiment_name == self.experiment_name)
            .filter(|r| !self.active_runs.contains_key(&r.run_id))
            .collect();
        runs.extend(self.active_runs.values().cloned());
        runs.sort_by_key(|r| r.version);
        Ok(runs)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
