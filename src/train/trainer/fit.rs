//! The fit loop

use super::core::Trainer;
use super::epoch::EpochAccumulator;
use super::result::FitResult;
use crate::error::Result;
use crate::optim::Optimizer;
use crate::train::progress::{format_progress, progress_items};
use crate::train::{SizedBatch, StepLog, TrainingPolicy};
use std::time::Instant;

impl Trainer {
    /// Train `policy` for `max_epochs` epochs
    ///
    /// Per epoch: every training batch runs `zero_grad`, `train_step`,
    /// backward and an optimizer step; then the validation loop (when
    /// validation batches are given and the epoch is due); then the epoch
    /// reduction of training values and `on_train_epoch_end`.
    ///
    /// With no training batches nothing runs and no epoch is completed.
    /// Afterwards `current_epoch` is the number of completed epochs, so a
    /// following test loop mirrors its metrics one past the last epoch.
    pub fn fit<P>(
        &mut self,
        policy: &mut P,
        train_batches: &[P::Batch],
        val_batches: Option<&[P::Batch]>,
    ) -> Result<FitResult>
    where
        P: TrainingPolicy + ?Sized,
    {
        let start = Instant::now();

        if self.is_global_zero() {
            self.logger
                .log_hyperparams(&policy.hyperparameters().to_params())?;
        }

        let mut optimizer = policy.configure_optimizer();
        tracing::info!(
            target: "aprendiz::trainer",
            optimizer = optimizer.name(),
            lr = optimizer.lr(),
            max_epochs = self.config.max_epochs,
            train_batches = train_batches.len(),
            rank = self.rank(),
            "starting fit"
        );

        let mut final_loss = None;
        let mut epochs_completed = 0;

        if train_batches.is_empty() {
            tracing::warn!(target: "aprendiz::trainer", "no training batches, skipping fit");
            return Ok(self.fit_result(&*optimizer, epochs_completed, final_loss, start));
        }

        for epoch in 0..self.config.max_epochs {
            self.metrics.set_epoch(epoch);
            let mut train_epoch = EpochAccumulator::default();

            for (batch_idx, batch) in train_batches.iter().enumerate() {
                optimizer.zero_grad(&mut policy.parameters_mut());

                let mut log = StepLog::new(batch.size());
                let loss = policy.train_step(batch, batch_idx, &mut log)?;
                loss.backward();
                optimizer.step(&mut policy.parameters_mut());

                self.global_step += 1;
                self.metrics.set_global_step(self.global_step);
                final_loss = Some(loss.item());
                self.record_step(&log, &mut train_epoch)?;
            }

            if let Some(val_batches) = val_batches {
                if self.validation_due(epoch) {
                    self.validate(policy, val_batches)?;
                }
            }

            self.reduce_epoch(&train_epoch)?;
            policy.on_train_epoch_end()?;
            self.report_progress(policy, epoch, start);
            epochs_completed += 1;
        }
        self.metrics.set_epoch(epochs_completed);

        tracing::info!(
            target: "aprendiz::trainer",
            epochs = epochs_completed,
            global_step = self.global_step,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "fit finished"
        );

        Ok(self.fit_result(&*optimizer, epochs_completed, final_loss, start))
    }

    fn fit_result(
        &self,
        optimizer: &dyn Optimizer,
        epochs_completed: usize,
        final_loss: Option<f32>,
        start: Instant,
    ) -> FitResult {
        FitResult {
            epochs_completed,
            global_step: self.global_step,
            final_loss,
            callback_metrics: self.metrics.snapshot(),
            progress: self.last_progress.clone(),
            optimizer: optimizer.name().to_string(),
            learning_rate: optimizer.lr(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        }
    }

    fn validation_due(&self, epoch: usize) -> bool {
        (epoch + 1) % self.config.check_val_every_n_epoch.max(1) == 0
    }

    fn report_progress<P>(&mut self, policy: &P, epoch: usize, start: Instant)
    where
        P: TrainingPolicy + ?Sized,
    {
        let items = progress_items(
            &self.metrics.snapshot(),
            &self.prog_bar,
            &self.logger.version(),
        );
        let items = policy.progress_items(items);
        let line = format_progress(
            epoch,
            self.config.max_epochs,
            &items,
            start.elapsed().as_secs_f64(),
        );

        if self.config.enable_progress && self.is_global_zero() {
            println!("{line}");
        }
        tracing::debug!(target: "aprendiz::progress", epoch, "{line}");
        self.last_progress = items;
    }
}
