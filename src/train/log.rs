//! Per-step observations recorded by policies
//!
//! A policy never aggregates anything itself. Each step it records scalar
//! observations into a [`StepLog`] together with [`LogOptions`] saying what
//! the driver should do with them: forward the raw value, average it over the
//! epoch, show it in the progress line, send it to the experiment logger,
//! and whether the epoch value must be reduced across workers first.

use std::collections::BTreeMap;

/// Metric name → scalar value
pub type MetricMap = BTreeMap<String, f32>;

/// How the driver should treat a logged value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Record the raw per-step value
    pub on_step: bool,
    /// Accumulate into a per-epoch mean
    pub on_epoch: bool,
    /// Show in the progress display
    pub prog_bar: bool,
    /// Forward to the experiment logger
    pub logger: bool,
    /// Average the epoch value across workers before it is read
    pub sync_dist: bool,
    /// Only worker 0 reports this value; never synchronized
    pub rank_zero_only: bool,
}

impl LogOptions {
    /// Per-step value only
    pub const fn step() -> Self {
        Self {
            on_step: true,
            on_epoch: false,
            prog_bar: false,
            logger: true,
            sync_dist: false,
            rank_zero_only: false,
        }
    }

    /// Per-epoch mean only
    pub const fn epoch() -> Self {
        Self {
            on_step: false,
            on_epoch: true,
            prog_bar: false,
            logger: true,
            sync_dist: false,
            rank_zero_only: false,
        }
    }

    pub const fn with_prog_bar(mut self, prog_bar: bool) -> Self {
        self.prog_bar = prog_bar;
        self
    }

    pub const fn with_logger(mut self, logger: bool) -> Self {
        self.logger = logger;
        self
    }

    pub const fn with_sync_dist(mut self, sync_dist: bool) -> Self {
        self.sync_dist = sync_dist;
        self
    }

    pub const fn with_rank_zero_only(mut self, rank_zero_only: bool) -> Self {
        self.rank_zero_only = rank_zero_only;
        self
    }
}

impl Default for LogOptions {
    fn default() -> Self {
        Self::epoch()
    }
}

/// A single logged value
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub name: String,
    pub value: f32,
    pub options: LogOptions,
    /// Weight of this value in the epoch mean
    pub batch_size: usize,
}

/// Values logged during one step
#[derive(Debug, Clone, Default)]
pub struct StepLog {
    batch_size: usize,
    observations: Vec<Observation>,
}

impl StepLog {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            observations: Vec::new(),
        }
    }

    /// Record `value` under `name`
    pub fn log(&mut self, name: &str, value: f32, options: LogOptions) {
        self.observations.push(Observation {
            name: name.to_string(),
            value,
            options,
            batch_size: self.batch_size,
        });
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Latest value logged under `name`, if any
    pub fn get(&self, name: &str) -> Option<&Observation> {
        self.observations.iter().rev().find(|o| o.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let step = LogOptions::step();
        assert!(step.on_step && !step.on_epoch && step.logger);

        let epoch = LogOptions::epoch().with_prog_bar(true).with_logger(false).with_sync_dist(true);
        assert!(!epoch.on_step && epoch.on_epoch);
        assert!(epoch.prog_bar && !epoch.logger && epoch.sync_dist);
        assert!(!epoch.rank_zero_only);

        assert_eq!(LogOptions::default(), LogOptions::epoch());
    }

    #[test]
    fn test_step_log_records_batch_size() {
        let mut log = StepLog::new(16);
        log.log("loss_step", 0.25, LogOptions::step());
        log.log("loss_epoch", 0.25, LogOptions::epoch());

        assert_eq!(log.observations().len(), 2);
        assert_eq!(log.get("loss_epoch").unwrap().batch_size, 16);
        assert!(log.get("val_acc").is_none());
    }

    #[test]
    fn test_get_returns_latest() {
        let mut log = StepLog::new(1);
        log.log("x", 1.0, LogOptions::step());
        log.log("x", 2.0, LogOptions::step());
        assert_eq!(log.get("x").unwrap().value, 2.0);
    }
}
