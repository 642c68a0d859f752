//! Image classification

use super::{
    mirror_to_logger, EvalOutput, Hyperparameters, StepOutput, TrainingPolicy, LOSS_EPOCH,
    LOSS_STEP, TEST_ACC, VAL_ACC,
};
use crate::error::Result;
use crate::nn::Model;
use crate::optim::{Adam, Optimizer};
use crate::train::{
    Accuracy, Batch, CrossEntropyLoss, LogOptions, LossFn, Metric, MetricMap, MetricsLogger,
    MetricsReader, StepLog,
};
use crate::Tensor;
use std::sync::Arc;

/// Cross-entropy training with top-1 accuracy for evaluation
///
/// Batches are `(inputs, targets)` with one class index (or one-hot row) per
/// sample.
pub struct ClassificationPolicy<M: Model> {
    model: M,
    hparams: Hyperparameters,
    loss_fn: CrossEntropyLoss,
    accuracy: Accuracy,
    metrics: Arc<dyn MetricsReader>,
    logger: Arc<dyn MetricsLogger>,
}

impl<M: Model> ClassificationPolicy<M> {
    pub fn new(
        model: M,
        hparams: Hyperparameters,
        metrics: Arc<dyn MetricsReader>,
        logger: Arc<dyn MetricsLogger>,
    ) -> Self {
        Self {
            model,
            hparams,
            loss_fn: CrossEntropyLoss,
            accuracy: Accuracy::default(),
            metrics,
            logger,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Loss and accuracy of the model on `batch`
    pub fn shared_eval_step(&self, batch: &Batch) -> EvalOutput {
        let prediction = self.model.forward(&batch.inputs);
        let loss = self.loss_fn.forward(&prediction, &batch.targets).item();
        let metric = self.accuracy.compute(&prediction, &batch.targets);
        EvalOutput { loss, metric }
    }
}

impl<M: Model> TrainingPolicy for ClassificationPolicy<M> {
    type Batch = Batch;

    fn hyperparameters(&self) -> &Hyperparameters {
        &self.hparams
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.model.parameters_mut()
    }

    fn train_step(
        &mut self,
        batch: &Batch,
        _batch_idx: usize,
        log: &mut StepLog,
    ) -> Result<Tensor> {
        let prediction = self.model.forward(&batch.inputs);
        let loss = self.loss_fn.forward(&prediction, &batch.targets);

        let value = loss.item();
        log.log(LOSS_STEP, value, LogOptions::step().with_prog_bar(true));
        log.log(
            LOSS_EPOCH,
            value,
            LogOptions::epoch()
                .with_prog_bar(true)
                .with_logger(false)
                .with_sync_dist(true),
        );
        Ok(loss)
    }

    fn on_train_epoch_end(&mut self) -> Result<()> {
        mirror_to_logger(self.metrics.as_ref(), self.logger.as_ref(), LOSS_EPOCH)
    }

    fn validation_step(
        &mut self,
        batch: &Batch,
        _batch_idx: usize,
        log: &mut StepLog,
    ) -> Result<MetricMap> {
        // The validation loss is computed but not reported
        let EvalOutput { metric: acc, .. } = self.shared_eval_step(batch);
        log.log(
            VAL_ACC,
            acc,
            LogOptions::epoch()
                .with_prog_bar(true)
                .with_logger(false)
                .with_sync_dist(true),
        );
        Ok(MetricMap::from([(VAL_ACC.to_string(), acc)]))
    }

    fn on_validation_end(&mut self) -> Result<()> {
        mirror_to_logger(self.metrics.as_ref(), self.logger.as_ref(), VAL_ACC)
    }

    fn test_step(
        &mut self,
        batch: &Batch,
        _batch_idx: usize,
        log: &mut StepLog,
    ) -> Result<StepOutput> {
        let EvalOutput { metric: acc, .. } = self.shared_eval_step(batch);
        log.log(TEST_ACC, acc, LogOptions::epoch().with_sync_dist(true));
        Ok(StepOutput::Value(acc))
    }

    fn predict_step(&self, batch: &Batch, _batch_idx: usize) -> Result<Tensor> {
        Ok(self.model.forward(&batch.inputs).detach())
    }

    fn configure_optimizer(&self) -> Box<dyn Optimizer> {
        Box::new(
            Adam::default_params(self.hparams.learning_rate).with_params(self.model.parameters()),
        )
    }
}
