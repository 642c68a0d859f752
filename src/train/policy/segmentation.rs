//! Binary segmentation

use super::{
    mirror_to_logger, EvalOutput, Hyperparameters, StepOutput, TrainingPolicy, LOSS_EPOCH,
    LOSS_STEP, TEST_MIOU, VAL_MIOU,
};
use crate::error::Result;
use crate::nn::Model;
use crate::optim::{Adam, Optimizer};
use crate::train::{
    BCEWithLogitsLoss, DiceCoefficient, LogOptions, LossFn, Metric, MetricMap, MetricsLogger,
    MetricsReader, NamedBatch, ProgressItems, StepLog, IMAGE_KEY, MASK_KEY,
};
use crate::Tensor;
use std::sync::Arc;

/// Quantity reported as `val_miou` / `test_miou`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapMetric {
    /// Negated BCE loss, so that higher is better
    #[default]
    NegatedLoss,
    /// Dice coefficient of the thresholded sigmoid output
    Dice,
}

/// BCE-with-logits training on `{"image", "mask"}` batches
pub struct SegmentationPolicy<M: Model> {
    model: M,
    hparams: Hyperparameters,
    loss_fn: BCEWithLogitsLoss,
    overlap: OverlapMetric,
    metrics: Arc<dyn MetricsReader>,
    logger: Arc<dyn MetricsLogger>,
}

impl<M: Model> SegmentationPolicy<M> {
    pub fn new(
        model: M,
        hparams: Hyperparameters,
        metrics: Arc<dyn MetricsReader>,
        logger: Arc<dyn MetricsLogger>,
    ) -> Self {
        Self {
            model,
            hparams,
            loss_fn: BCEWithLogitsLoss,
            overlap: OverlapMetric::default(),
            metrics,
            logger,
        }
    }

    /// Report a different overlap metric
    pub fn with_overlap_metric(mut self, overlap: OverlapMetric) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn overlap_metric(&self) -> OverlapMetric {
        self.overlap
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Loss and overlap metric of the model on `batch`
    pub fn shared_eval_step(&self, batch: &NamedBatch) -> Result<EvalOutput> {
        let image = batch.get(IMAGE_KEY)?;
        let mask = batch.get(MASK_KEY)?;

        let logits = self.model.forward(image);
        let loss = self.loss_fn.forward(&logits, mask).item();
        let metric = match self.overlap {
            OverlapMetric::NegatedLoss => -loss,
            OverlapMetric::Dice => DiceCoefficient::default().compute(&logits, mask),
        };
        Ok(EvalOutput { loss, metric })
    }
}

impl<M: Model> TrainingPolicy for SegmentationPolicy<M> {
    type Batch = NamedBatch;

    fn hyperparameters(&self) -> &Hyperparameters {
        &self.hparams
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.model.parameters_mut()
    }

    fn train_step(
        &mut self,
        batch: &NamedBatch,
        _batch_idx: usize,
        log: &mut StepLog,
    ) -> Result<Tensor> {
        let image = batch.get(IMAGE_KEY)?;
        let mask = batch.get(MASK_KEY)?;

        let logits = self.model.forward(image);
        let loss = self.loss_fn.forward(&logits, mask);

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
        batch: &NamedBatch,
        _batch_idx: usize,
        log: &mut StepLog,
    ) -> Result<MetricMap> {
        let EvalOutput { metric: miou, .. } = self.shared_eval_step(batch)?;
        log.log(
            VAL_MIOU,
            miou,
            LogOptions::epoch()
                .with_prog_bar(true)
                .with_logger(false)
                .with_rank_zero_only(true),
        );
        Ok(MetricMap::from([(VAL_MIOU.to_string(), miou)]))
    }

    fn on_validation_end(&mut self) -> Result<()> {
        mirror_to_logger(self.metrics.as_ref(), self.logger.as_ref(), VAL_MIOU)
    }

    fn test_step(
        &mut self,
        batch: &NamedBatch,
        _batch_idx: usize,
        log: &mut StepLog,
    ) -> Result<StepOutput> {
        let EvalOutput { metric: miou, .. } = self.shared_eval_step(batch)?;
        log.log(TEST_MIOU, miou, LogOptions::epoch().with_rank_zero_only(true));
        Ok(StepOutput::Metrics(MetricMap::from([(
            TEST_MIOU.to_string(),
            miou,
        )])))
    }

    fn on_test_end(&mut self) -> Result<()> {
        mirror_to_logger(self.metrics.as_ref(), self.logger.as_ref(), TEST_MIOU)
    }

    fn predict_step(&self, batch: &NamedBatch, _batch_idx: usize) -> Result<Tensor> {
        Ok(self.model.forward(batch.get(IMAGE_KEY)?).detach())
    }

    fn configure_optimizer(&self) -> Box<dyn Optimizer> {
        Box::new(
            Adam::default_params(self.hparams.learning_rate).with_params(self.model.parameters()),
        )
    }

    fn progress_items(&self, mut items: ProgressItems) -> ProgressItems {
        items.remove("v_num");
        items
    }
}
