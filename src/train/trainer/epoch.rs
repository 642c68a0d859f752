//! Step recording and epoch-level reduction

use super::core::Trainer;
use crate::error::Result;
use crate::train::{LogOptions, MetricMap, Observation, StepLog};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Accumulated {
    weighted_sum: f64,
    weight: f64,
    options: LogOptions,
}

/// Batch-size-weighted running mean of every `on_epoch` value
#[derive(Debug, Default)]
pub(crate) struct EpochAccumulator {
    entries: BTreeMap<String, Accumulated>,
}

impl EpochAccumulator {
    pub(crate) fn record(&mut self, obs: &Observation) {
        let weight = obs.batch_size.max(1) as f64;
        let entry = self
            .entries
            .entry(obs.name.clone())
            .or_insert_with(|| Accumulated {
                weighted_sum: 0.0,
                weight: 0.0,
                options: obs.options,
            });
        entry.weighted_sum += f64::from(obs.value) * weight;
        entry.weight += weight;
    }

    /// `(name, mean, options)` in name order
    fn means(&self) -> impl Iterator<Item = (&str, f32, LogOptions)> {
        self.entries
            .iter()
            .map(|(name, e)| (name.as_str(), (e.weighted_sum / e.weight) as f32, e.options))
    }
}

impl Trainer {
    /// Handle the observations of one step
    ///
    /// `on_step` values become callback metrics immediately and logger-bound
    /// ones are written at the global step; `on_epoch` values are accumulated.
    pub(crate) fn record_step(
        &mut self,
        log: &StepLog,
        epoch: &mut EpochAccumulator,
    ) -> Result<()> {
        let mut to_logger = MetricMap::new();

        for obs in log.observations() {
            if obs.options.prog_bar {
                self.prog_bar.insert(obs.name.clone());
            }
            if obs.options.on_step {
                self.metrics.set(&obs.name, obs.value);
                if obs.options.logger {
                    to_logger.insert(obs.name.clone(), obs.value);
                }
            }
            if obs.options.on_epoch {
                epoch.record(obs);
            }
        }

        let every = self.config.log_every_n_steps.max(1);
        if !to_logger.is_empty() && self.is_global_zero() && self.global_step % every == 0 {
            self.logger.log_metrics(&to_logger, self.global_step)?;
        }
        Ok(())
    }

    /// Turn accumulated values into callback metrics
    ///
    /// Values logged with `sync_dist` are averaged over all workers first;
    /// `rank_zero_only` values never are. Every worker walks the names in the
    /// same order, so the reductions line up.
    pub(crate) fn reduce_epoch(&mut self, epoch: &EpochAccumulator) -> Result<MetricMap> {
        let mut reduced = MetricMap::new();
        let mut to_logger = MetricMap::new();

        for (name, mean, options) in epoch.means() {
            let value = if options.sync_dist && !options.rank_zero_only {
                self.sync.all_reduce_mean(mean)?
            } else {
                mean
            };

            self.metrics.set(name, value);
            reduced.insert(name.to_string(), value);
            if options.logger {
                to_logger.insert(name.to_string(), value);
            }
        }

        if !to_logger.is_empty() && self.is_global_zero() {
            self.logger.log_metrics(&to_logger, self.global_step)?;
        }
        tracing::debug!(target: "aprendiz::trainer", metrics = ?reduced, "epoch reduced");
        Ok(reduced)
    }
}
