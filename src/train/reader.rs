//! Read access to the driver's aggregated metrics
//!
//! The trainer owns a [`CallbackMetrics`] store and hands policies a
//! [`MetricsReader`] view of it at construction. Policies only read.

use super::log::MetricMap;
use crate::error::{Error, Result};
use std::sync::{Arc, PoisonError, RwLock};

/// What a policy may ask the driver
pub trait MetricsReader: Send + Sync {
    /// Most recent aggregated value for `name`
    fn callback_metric(&self, name: &str) -> Option<f32>;

    /// Current epoch index, starting at 0
    fn current_epoch(&self) -> usize;

    /// Whether this process is worker 0
    fn is_global_zero(&self) -> bool {
        true
    }

    /// Like [`callback_metric`](Self::callback_metric) but missing values are an error
    fn require(&self, name: &str) -> Result<f32> {
        self.callback_metric(name)
            .ok_or_else(|| Error::MissingMetric(name.to_string()))
    }
}

#[derive(Debug, Default)]
struct CallbackState {
    metrics: MetricMap,
    epoch: usize,
    global_step: usize,
    rank: usize,
}

/// Shared store of callback metrics
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct CallbackMetrics {
    state: Arc<RwLock<CallbackState>>,
}

impl CallbackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_rank(rank: usize) -> Self {
        let metrics = Self::new();
        metrics.write(|s| s.rank = rank);
        metrics
    }

    fn read<T>(&self, f: impl FnOnce(&CallbackState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut CallbackState) -> T) -> T {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn set(&self, name: &str, value: f32) {
        self.write(|s| s.metrics.insert(name.to_string(), value));
    }

    pub fn set_epoch(&self, epoch: usize) {
        self.write(|s| s.epoch = epoch);
    }

    pub fn set_global_step(&self, step: usize) {
        self.write(|s| s.global_step = step);
    }

    pub fn global_step(&self) -> usize {
        self.read(|s| s.global_step)
    }

    /// Copy of every stored metric
    pub fn snapshot(&self) -> MetricMap {
        self.read(|s| s.metrics.clone())
    }
}

impl MetricsReader for CallbackMetrics {
    fn callback_metric(&self, name: &str) -> Option<f32> {
        self.read(|s| s.metrics.get(name).copied())
    }

    fn current_epoch(&self) -> usize {
        self.read(|s| s.epoch)
    }

    fn is_global_zero(&self) -> bool {
        self.read(|s| s.rank == 0)
    }
}
