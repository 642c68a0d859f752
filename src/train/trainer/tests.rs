//! Tests for the trainer loops

use crate::error::Result;
use crate::nn::{Identity, Linear};
use crate::optim::Optimizer;
use crate::train::{
    Batch, ClassificationPolicy, Hyperparameters, InMemoryLogger, MetricMap, NamedBatch,
    SegmentationPolicy, SingleWorker, StepLog, StepOutput, Trainer, TrainerConfig,
    TrainingPolicy, LOSS_EPOCH, LOSS_STEP, TEST_MIOU, VAL_ACC, VAL_MIOU,
};
use crate::Tensor;
use std::cell::{Cell, RefCell};
use std::sync::Arc;

fn trainer(epochs: usize, logger: Arc<InMemoryLogger>) -> Trainer {
    Trainer::new(
        TrainerConfig::default()
            .with_max_epochs(epochs)
            .with_log_every_n_steps(1)
            .with_progress(false),
        logger,
        Box::new(SingleWorker),
    )
}

fn separable_batches() -> Vec<Batch> {
    // class 0 on the left, class 1 on the right
    vec![
        Batch::new(
            Tensor::from_shape(vec![-2.0, 0.5, -1.5, -0.5, 2.0, 0.0, 1.0, 1.0], &[4, 2], false),
            Tensor::from_vec(vec![0.0, 0.0, 1.0, 1.0], false),
        ),
        Batch::new(
            Tensor::from_shape(vec![-1.0, 1.0, 1.5, -1.0], &[2, 2], false),
            Tensor::from_vec(vec![0.0, 1.0], false),
        ),
    ]
}

/// Records the order in which hooks are called
struct Recording<P> {
    inner: P,
    events: RefCell<Vec<String>>,
    optimizers: Cell<usize>,
}

impl<P> Recording<P> {
    fn new(inner: P) -> Self {
        Self {
            inner,
            events: RefCell::new(Vec::new()),
            optimizers: Cell::new(0),
        }
    }

    fn push(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl<P: TrainingPolicy> TrainingPolicy for Recording<P> {
    type Batch = P::Batch;

    fn hyperparameters(&self) -> &Hyperparameters {
        self.inner.hyperparameters()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.inner.parameters_mut()
    }

    fn train_step(&mut self, batch: &P::Batch, idx: usize, log: &mut StepLog) -> Result<Tensor> {
        self.push(format!("train_step {idx}"));
        self.inner.train_step(batch, idx, log)
    }

    fn on_train_epoch_end(&mut self) -> Result<()> {
        self.push("on_train_epoch_end");
        self.inner.on_train_epoch_end()
    }

    fn validation_step(
        &mut self,
        batch: &P::Batch,
        idx: usize,
        log: &mut StepLog,
    ) -> Result<MetricMap> {
        self.push(format!("validation_step {idx}"));
        self.inner.validation_step(batch, idx, log)
    }

    fn on_validation_end(&mut self) -> Result<()> {
        self.push("on_validation_end");
        self.inner.on_validation_end()
    }

    fn test_step(
        &mut self,
        batch: &P::Batch,
        idx: usize,
        log: &mut StepLog,
    ) -> Result<StepOutput> {
        self.push(format!("test_step {idx}"));
        self.inner.test_step(batch, idx, log)
    }

    fn on_test_end(&mut self) -> Result<()> {
        self.push("on_test_end");
        self.inner.on_test_end()
    }

    fn predict_step(&self, batch: &P::Batch, idx: usize) -> Result<Tensor> {
        self.inner.predict_step(batch, idx)
    }

    fn configure_optimizer(&self) -> Box<dyn Optimizer> {
        self.optimizers.set(self.optimizers.get() + 1);
        self.inner.configure_optimizer()
    }
}

fn recording_classifier(
    trainer: &Trainer,
    logger: Arc<InMemoryLogger>,
) -> Recording<ClassificationPolicy<Linear>> {
    Recording::new(ClassificationPolicy::new(
        Linear::new(2, 2, 11),
        Hyperparameters::new(0.05).unwrap(),
        trainer.metrics_handle(),
        logger,
    ))
}

#[test]
fn test_hook_order_for_one_epoch() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(1, logger.clone());
    let mut policy = recording_classifier(&trainer, logger);
    let batches = separable_batches();

    trainer.fit(&mut policy, &batches, Some(batches.as_slice())).unwrap();

    assert_eq!(
        policy.events(),
        vec![
            "train_step 0",
            "train_step 1",
            "validation_step 0",
            "validation_step 1",
            "on_validation_end",
            "on_train_epoch_end",
        ]
    );
}

#[test]
fn test_fit_without_training_batches() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(3, logger.clone());
    let mut policy = recording_classifier(&trainer, logger.clone());
    let val = separable_batches();

    let result = trainer.fit(&mut policy, &[], Some(val.as_slice())).unwrap();

    assert_eq!(result.epochs_completed, 0);
    assert_eq!(result.global_step, 0);
    assert_eq!(result.final_loss, None);
    assert!(policy.events().is_empty());
    assert!(logger.values(LOSS_EPOCH).is_empty());
}

#[test]
fn test_test_after_fit_mirrors_past_last_epoch() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(2, logger.clone());
    let mut policy = SegmentationPolicy::new(
        Linear::new(4, 4, 3),
        Hyperparameters::new(0.01).unwrap(),
        trainer.metrics_handle(),
        logger.clone(),
    );
    let mut batches = seg_batches();
    batches.extend(seg_batches());

    trainer.fit(&mut policy, &batches, None).unwrap();
    assert_eq!(trainer.current_epoch(), 2);
    trainer.test(&mut policy, &batches).unwrap();

    // reduction at global step 4, then the mirror at epoch 2
    let steps: Vec<usize> = logger.values(TEST_MIOU).iter().map(|&(s, _)| s).collect();
    assert_eq!(steps, vec![4, 2]);
}

#[test]
fn test_optimizer_configured_once_per_fit() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(3, logger.clone());
    let mut policy = recording_classifier(&trainer, logger);
    let batches = separable_batches();

    let result = trainer.fit(&mut policy, &batches, None).unwrap();

    assert_eq!(policy.optimizers.get(), 1);
    assert_eq!(result.optimizer, "Adam");
    assert_eq!(result.learning_rate, 0.05);
    assert_eq!(result.global_step, 6);
}

#[test]
fn test_hyperparameters_logged_once() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(2, logger.clone());
    let mut policy = recording_classifier(&trainer, logger.clone());

    trainer.fit(&mut policy, &separable_batches(), None).unwrap();

    assert_eq!(logger.hyperparams()["learning_rate"], "0.05");
}

#[test]
fn test_validation_every_n_epochs() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = Trainer::new(
        TrainerConfig::default()
            .with_max_epochs(4)
            .with_check_val_every_n_epoch(2)
            .with_progress(false),
        logger.clone(),
        Box::new(SingleWorker),
    );
    let mut policy = recording_classifier(&trainer, logger.clone());
    let batches = separable_batches();

    trainer.fit(&mut policy, &batches, Some(batches.as_slice())).unwrap();

    let validations = policy
        .events()
        .iter()
        .filter(|e| *e == "on_validation_end")
        .count();
    assert_eq!(validations, 2);
    // mirrored at epochs 1 and 3
    let steps: Vec<usize> = logger.values(VAL_ACC).iter().map(|&(s, _)| s).collect();
    assert_eq!(steps, vec![1, 3]);
}

#[test]
fn test_empty_validation_partition_is_skipped() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(1, logger.clone());
    let mut policy = recording_classifier(&trainer, logger);

    let empty: Vec<Batch> = Vec::new();

    trainer.fit(&mut policy, &separable_batches(), Some(empty.as_slice())).unwrap();

    assert!(!policy.events().iter().any(|e| e.starts_with("validation")));
}

#[test]
fn test_training_reduces_loss() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(30, logger.clone());
    let mut policy = recording_classifier(&trainer, logger.clone());
    let batches = separable_batches();

    let result = trainer.fit(&mut policy, &batches, Some(batches.as_slice())).unwrap();

    let losses = logger.values(LOSS_EPOCH);
    assert_eq!(losses.len(), 30);
    assert!(losses.last().unwrap().1 < losses[0].1);
    assert_eq!(result.callback_metrics[VAL_ACC], 1.0);
}

#[test]
fn test_loss_epoch_is_weighted_mean_of_steps() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(1, logger.clone());
    // identity model: no parameters, so the loss is the same before and after each step
    let mut policy = ClassificationPolicy::new(
        Identity,
        Hyperparameters::new(0.01).unwrap(),
        trainer.metrics_handle(),
        logger.clone(),
    );
    let batches = separable_batches();

    trainer.fit(&mut policy, &batches, None).unwrap();

    let steps = logger.values(LOSS_STEP);
    assert_eq!(steps.len(), 2);
    let expected = (steps[0].1 * 4.0 + steps[1].1 * 2.0) / 6.0;
    approx::assert_relative_eq!(logger.values(LOSS_EPOCH)[0].1, expected, epsilon = 1e-6);
    assert_eq!(logger.values(LOSS_EPOCH)[0].0, 0);
}

#[test]
fn test_progress_items_include_version_for_classification() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(1, logger.clone());
    let mut policy = recording_classifier(&trainer, logger);
    let batches = separable_batches();

    let result = trainer.fit(&mut policy, &batches, Some(batches.as_slice())).unwrap();

    assert_eq!(result.progress["v_num"], "0");
    assert!(result.progress.contains_key(LOSS_STEP));
    assert!(result.progress.contains_key(LOSS_EPOCH));
    assert!(result.progress.contains_key(VAL_ACC));
}

fn seg_batches() -> Vec<NamedBatch> {
    vec![NamedBatch::segmentation(
        Tensor::from_shape(vec![0.2, -0.4, 0.9, -1.1], &[1, 4], false),
        Tensor::from_shape(vec![1.0, 0.0, 1.0, 0.0], &[1, 4], false),
    )]
}

#[test]
fn test_segmentation_progress_hides_version() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(1, logger.clone());
    let mut policy = SegmentationPolicy::new(
        Linear::new(4, 4, 3),
        Hyperparameters::new(0.01).unwrap(),
        trainer.metrics_handle(),
        logger,
    );
    let batches = seg_batches();

    let result = trainer.fit(&mut policy, &batches, Some(batches.as_slice())).unwrap();

    assert!(!result.progress.contains_key("v_num"));
    assert!(result.progress.contains_key(VAL_MIOU));
}

#[test]
fn test_segmentation_test_loop() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(1, logger.clone());
    let mut policy = Recording::new(SegmentationPolicy::new(
        Identity,
        Hyperparameters::new(0.01).unwrap(),
        trainer.metrics_handle(),
        logger.clone(),
    ));
    let batches = seg_batches();

    let result = trainer.test(&mut policy, &batches).unwrap();

    assert_eq!(policy.events(), vec!["test_step 0", "on_test_end"]);
    let miou = result.metrics[TEST_MIOU];
    assert!(miou < 0.0);
    assert_eq!(result.outputs[0].get(TEST_MIOU), Some(miou));
    // once from the reduction, once from the end-of-test mirror
    assert_eq!(logger.values(TEST_MIOU).len(), 2);
}

#[test]
fn test_predict_collects_outputs() {
    let logger = Arc::new(InMemoryLogger::new());
    let trainer = trainer(1, logger.clone());
    let policy = ClassificationPolicy::new(
        Identity,
        Hyperparameters::new(0.01).unwrap(),
        trainer.metrics_handle(),
        logger,
    );
    let batches = separable_batches();

    let outputs = trainer.predict(&policy, &batches).unwrap();

    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[1].data(), batches[1].inputs.data());
}

#[test]
fn test_fit_through_trait_object() {
    let logger = Arc::new(InMemoryLogger::new());
    let mut trainer = trainer(1, logger.clone());
    let mut policy = ClassificationPolicy::new(
        Identity,
        Hyperparameters::new(0.01).unwrap(),
        trainer.metrics_handle(),
        logger,
    );
    let dynamic: &mut dyn TrainingPolicy<Batch = Batch> = &mut policy;

    let result = trainer.fit(dynamic, &separable_batches(), None).unwrap();
    assert_eq!(result.epochs_completed, 1);
}
