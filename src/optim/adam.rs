//! Adam optimizer

use super::Optimizer;
use crate::autograd::TensorId;
use crate::Tensor;
use ndarray::Array1;
use std::collections::HashMap;

/// Adam (adaptive moment estimation)
///
/// m_t = β1 · m_{t-1} + (1 - β1) · g
/// v_t = β2 · v_{t-1} + (1 - β2) · g²
/// θ_t = θ_{t-1} - lr_t · m_t / (√v_t + ε),  lr_t = lr · √(1 - β2^t) / (1 - β1^t)
///
/// Moment buffers are keyed by [`TensorId`], so the optimizer follows a
/// parameter regardless of the order it is handed in. Once bound with
/// [`Adam::with_params`], parameters outside the bound set are left alone.
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    param_ids: Vec<TensorId>,
    m: HashMap<TensorId, Array1<f32>>,
    v: HashMap<TensorId, Array1<f32>>,
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            param_ids: Vec::new(),
            m: HashMap::new(),
            v: HashMap::new(),
        }
    }

    /// Create Adam with the usual defaults (β1 = 0.9, β2 = 0.999, ε = 1e-8)
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    /// Restrict updates to the given parameters
    pub fn with_params<'a>(mut self, params: impl IntoIterator<Item = &'a Tensor>) -> Self {
        self.param_ids = params.into_iter().map(Tensor::id).collect();
        self
    }

    /// Number of steps taken so far
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    #[must_use]
    pub fn beta1(&self) -> f32 {
        self.beta1
    }

    #[must_use]
    pub fn beta2(&self) -> f32 {
        self.beta2
    }

    #[must_use]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    fn is_bound_to(&self, id: TensorId) -> bool {
        self.param_ids.is_empty() || self.param_ids.contains(&id)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Tensor]) {
        self.t += 1;
        let t = self.t as i32;
        let lr_t =
            self.lr * ((1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t)));

        for param in params.iter_mut() {
            let id = param.id();
            if !self.is_bound_to(id) {
                continue;
            }
            let Some(grad) = param.grad() else {
                continue;
            };

            let m_t = match self.m.get(&id) {
                Some(m) => m * self.beta1 + &grad * (1.0 - self.beta1),
                None => &grad * (1.0 - self.beta1),
            };
            let grad_sq = &grad * &grad;
            let v_t = match self.v.get(&id) {
                Some(v) => v * self.beta2 + &grad_sq * (1.0 - self.beta2),
                None => &grad_sq * (1.0 - self.beta2),
            };

            let update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;
            *param.data_mut() -= &update;

            self.m.insert(id, m_t);
            self.v.insert(id, v_t);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn param_ids(&self) -> &[TensorId] {
        &self.param_ids
    }

    fn name(&self) -> &'static str {
        "Adam"
    }
}
