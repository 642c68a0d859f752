//! Experiment loggers
//!
//! The trainer and policies write through a shared `Arc<dyn MetricsLogger>`,
//! so every method takes `&self`.

use super::log::MetricMap;
use crate::error::{Error, Result};
use crate::tracking::{ExperimentTracker, RunStatus, TrackingBackend};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Hyperparameter name → display value
pub type ParamMap = BTreeMap<String, String>;

/// Destination for logged metrics
pub trait MetricsLogger: Send + Sync {
    /// Record every metric in `metrics` at `step`
    fn log_metrics(&self, metrics: &MetricMap, step: usize) -> Result<()>;

    fn log_hyperparams(&self, _params: &ParamMap) -> Result<()> {
        Ok(())
    }

    /// Close the run
    fn finalize(&self, _status: RunStatus) -> Result<()> {
        Ok(())
    }

    /// Run number shown as `v_num`
    fn version(&self) -> String {
        "0".to_string()
    }

    fn name(&self) -> &str;
}

/// A metric as it reached the logger
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedMetric {
    pub name: String,
    pub value: f32,
    pub step: usize,
}

#[derive(Debug, Default)]
struct MemoryLog {
    metrics: Vec<LoggedMetric>,
    params: ParamMap,
    status: Option<RunStatus>,
}

/// Keeps everything in memory
#[derive(Debug, Default)]
pub struct InMemoryLogger {
    log: Mutex<MemoryLog>,
}

impl InMemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut MemoryLog) -> T) -> T {
        f(&mut self.log.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn records(&self) -> Vec<LoggedMetric> {
        self.with_log(|l| l.metrics.clone())
    }

    /// `(step, value)` pairs logged for `name`
    pub fn values(&self, name: &str) -> Vec<(usize, f32)> {
        self.with_log(|l| {
            l.metrics
                .iter()
                .filter(|m| m.name == name)
                .map(|m| (m.step, m.value))
                .collect()
        })
    }

    pub fn hyperparams(&self) -> ParamMap {
        self.with_log(|l| l.params.clone())
    }

    pub fn status(&self) -> Option<RunStatus> {
        self.with_log(|l| l.status)
    }
}

impl MetricsLogger for InMemoryLogger {
    fn log_metrics(&self, metrics: &MetricMap, step: usize) -> Result<()> {
        self.with_log(|l| {
            if let Some(status) = l.status {
                return Err(Error::Logger(format!(
                    "run already closed as {status:?}, dropping metrics for step {step}"
                )));
            }
            l.metrics.extend(metrics.iter().map(|(name, &value)| LoggedMetric {
                name: name.clone(),
                value,
                step,
            }));
            Ok(())
        })
    }

    fn log_hyperparams(&self, params: &ParamMap) -> Result<()> {
        self.with_log(|l| l.params.extend(params.clone()));
        Ok(())
    }

    fn finalize(&self, status: RunStatus) -> Result<()> {
        self.with_log(|l| l.status = Some(status));
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Emits each metric as a `tracing` event under the `aprendiz::metrics` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl MetricsLogger for TracingLogger {
    fn log_metrics(&self, metrics: &MetricMap, step: usize) -> Result<()> {
        for (name, value) in metrics {
            tracing::info!(target: "aprendiz::metrics", step, metric = %name, value, "metric");
        }
        Ok(())
    }

    fn log_hyperparams(&self, params: &ParamMap) -> Result<()> {
        for (name, value) in params {
            tracing::info!(
                target: "aprendiz::metrics",
                param = %name,
                value = %value,
                "hyperparameter"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

/// Writes into one run of an [`ExperimentTracker`]
pub struct TrackingLogger<B: TrackingBackend> {
    tracker: Mutex<ExperimentTracker<B>>,
    run_id: String,
    version: u32,
}

impl<B: TrackingBackend> TrackingLogger<B> {
    /// Start a new run on `tracker`
    pub fn new(mut tracker: ExperimentTracker<B>, run_name: Option<&str>) -> Result<Self> {
        let run_id = tracker.start_run(run_name)?;
        let version = tracker.get_run(&run_id)?.version;
        Ok(Self {
            tracker: Mutex::new(tracker),
            run_id,
            version,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn with_tracker<T>(&self, f: impl FnOnce(&mut ExperimentTracker<B>) -> T) -> T {
        f(&mut self.tracker.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Run the closure against the underlying tracker
    pub fn inspect<T>(&self, f: impl FnOnce(&ExperimentTracker<B>) -> T) -> T {
        self.with_tracker(|t| f(t))
    }
}

impl<B: TrackingBackend + Send> MetricsLogger for TrackingLogger<B> {
    fn log_metrics(&self, metrics: &MetricMap, step: usize) -> Result<()> {
        self.with_tracker(|t| {
            metrics
                .iter()
                .try_for_each(|(name, &value)| t.log_metric(&self.run_id, name, value, step))
        })
        .map_err(Error::from)
    }

    fn log_hyperparams(&self, params: &ParamMap) -> Result<()> {
        self.with_tracker(|t| {
            params
                .iter()
                .try_for_each(|(k, v)| t.log_param(&self.run_id, k, v))
        })
        .map_err(Error::from)
    }

    fn finalize(&self, status: RunStatus) -> Result<()> {
        self.with_tracker(|t| t.end_run(&self.run_id, status))
            .map_err(Error::from)
    }

    fn version(&self) -> String {
        self.version.to_string()
    }

    fn name(&self) -> &str {
        "tracking"
    }
}
