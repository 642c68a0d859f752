//! Validation, test and prediction loops

use super::core::Trainer;
use super::epoch::EpochAccumulator;
use super::result::TestResult;
use crate::error::Result;
use crate::train::{MetricMap, SizedBatch, StepLog, TrainingPolicy};
use crate::Tensor;

impl Trainer {
    /// Run every validation step, reduce, then `on_validation_end`
    ///
    /// Does nothing for an empty partition.
    pub fn validate<P>(&mut self, policy: &mut P, batches: &[P::Batch]) -> Result<MetricMap>
    where
        P: TrainingPolicy + ?Sized,
    {
        if batches.is_empty() {
            return Ok(MetricMap::new());
        }

        let mut accumulated = EpochAccumulator::default();
        for (batch_idx, batch) in batches.iter().enumerate() {
            let mut log = StepLog::new(batch.size());
            policy.validation_step(batch, batch_idx, &mut log)?;
            self.record_step(&log, &mut accumulated)?;
        }

        let reduced = self.reduce_epoch(&accumulated)?;
        policy.on_validation_end()?;
        Ok(reduced)
    }

    /// Run every test step, reduce, then `on_test_end`
    ///
    /// Does nothing for an empty partition.
    pub fn test<P>(&mut self, policy: &mut P, batches: &[P::Batch]) -> Result<TestResult>
    where
        P: TrainingPolicy + ?Sized,
    {
        if batches.is_empty() {
            return Ok(TestResult::default());
        }

        let mut accumulated = EpochAccumulator::default();
        let mut outputs = Vec::with_capacity(batches.len());
        for (batch_idx, batch) in batches.iter().enumerate() {
            let mut log = StepLog::new(batch.size());
            outputs.push(policy.test_step(batch, batch_idx, &mut log)?);
            self.record_step(&log, &mut accumulated)?;
        }

        let metrics = self.reduce_epoch(&accumulated)?;
        policy.on_test_end()?;
        Ok(TestResult { metrics, outputs })
    }

    /// Model output for every batch, in order
    pub fn predict<P>(&self, policy: &P, batches: &[P::Batch]) -> Result<Vec<Tensor>>
    where
        P: TrainingPolicy + ?Sized,
    {
        batches
            .iter()
            .enumerate()
            .map(|(batch_idx, batch)| policy.predict_step(batch, batch_idx))
            .collect()
    }
}
