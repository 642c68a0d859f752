//! Core Trainer struct and basic methods

use crate::error::Result;
use crate::tracking::RunStatus;
use crate::train::progress::ProgressItems;
use crate::train::{
    CallbackMetrics, CrossWorkerSync, MetricMap, MetricsLogger, MetricsReader,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Loop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerConfig {
    pub max_epochs: usize,
    /// Validate after every n-th epoch
    pub check_val_every_n_epoch: usize,
    /// Forward per-step values to the logger every n global steps
    pub log_every_n_steps: usize,
    /// Print the per-epoch progress line
    pub enable_progress: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_epochs: 1,
            check_val_every_n_epoch: 1,
            log_every_n_steps: 50,
            enable_progress: true,
        }
    }
}

impl TrainerConfig {
    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    pub fn with_check_val_every_n_epoch(mut self, n: usize) -> Self {
        self.check_val_every_n_epoch = n;
        self
    }

    pub fn with_log_every_n_steps(mut self, n: usize) -> Self {
        self.log_every_n_steps = n;
        self
    }

    pub fn with_progress(mut self, enable: bool) -> Self {
        self.enable_progress = enable;
        self
    }
}

/// Drives policies through fit, test and predict
pub struct Trainer {
    pub(crate) config: TrainerConfig,
    pub(crate) logger: Arc<dyn MetricsLogger>,
    pub(crate) sync: Box<dyn CrossWorkerSync>,
    pub(crate) metrics: CallbackMetrics,
    pub(crate) global_step: usize,
    /// Names logged with `prog_bar` so far
    pub(crate) prog_bar: BTreeSet<String>,
    pub(crate) last_progress: ProgressItems,
}

impl Trainer {
    pub fn new(
        config: TrainerConfig,
        logger: Arc<dyn MetricsLogger>,
        sync: Box<dyn CrossWorkerSync>,
    ) -> Self {
        let metrics = CallbackMetrics::for_rank(sync.rank());
        Self {
            config,
            logger,
            sync,
            metrics,
            global_step: 0,
            prog_bar: BTreeSet::new(),
            last_progress: ProgressItems::new(),
        }
    }

    /// Read-only view of the callback metrics, for injection into a policy
    pub fn metrics_handle(&self) -> Arc<dyn MetricsReader> {
        Arc::new(self.metrics.clone())
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn callback_metrics(&self) -> MetricMap {
        self.metrics.snapshot()
    }

    pub fn current_epoch(&self) -> usize {
        self.metrics.current_epoch()
    }

    /// Optimizer steps taken so far
    pub fn global_step(&self) -> usize {
        self.global_step
    }

    pub fn is_global_zero(&self) -> bool {
        self.sync.is_global_zero()
    }

    pub fn rank(&self) -> usize {
        self.sync.rank()
    }

    /// Close the logger's run; only worker 0 does this
    pub fn finalize(&self, status: RunStatus) -> Result<()> {
        if self.is_global_zero() {
            self.logger.finalize(status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::{InMemoryLogger, LocalGroup, SingleWorker};

    #[test]
    fn test_config_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.max_epochs, 1);
        assert_eq!(config.check_val_every_n_epoch, 1);
        assert_eq!(config.log_every_n_steps, 50);
        assert!(config.enable_progress);
    }

    #[test]
    fn test_builder() {
        let config = TrainerConfig::default()
            .with_max_epochs(4)
            .with_check_val_every_n_epoch(2)
            .with_log_every_n_steps(1)
            .with_progress(false);
        assert_eq!(config.max_epochs, 4);
        assert_eq!(config.check_val_every_n_epoch, 2);
        assert_eq!(config.log_every_n_steps, 1);
        assert!(!config.enable_progress);
    }

    #[test]
    fn test_metrics_handle_shares_store() {
        let trainer = Trainer::new(
            TrainerConfig::default(),
            Arc::new(InMemoryLogger::new()),
            Box::new(SingleWorker),
        );
        let handle = trainer.metrics_handle();
        trainer.metrics.set("val_acc", 0.5);
        assert_eq!(handle.callback_metric("val_acc"), Some(0.5));
        assert!(handle.is_global_zero());
    }

    #[test]
    fn test_nonzero_rank_does_not_finalize() {
        let logger = Arc::new(InMemoryLogger::new());
        let mut group = LocalGroup::new(2).unwrap();
        let worker1 = group.pop().unwrap();

        let trainer = Trainer::new(TrainerConfig::default(), logger.clone(), Box::new(worker1));
        assert!(!trainer.is_global_zero());
        assert!(!trainer.metrics_handle().is_global_zero());

        trainer.finalize(RunStatus::Completed).unwrap();
        assert!(logger.status().is_none());
    }
}
