//! Dense layer: `y = x W + b`
//!
//! ```text
//! input  [rows, in_features]
//!   → x @ weight [in_features, out_features]
//!   → + bias     [out_features]   (broadcast over rows)
//!   = output     [rows, out_features]
//! ```

use super::Model;
use crate::autograd::{BackwardOp, GradCell};
use crate::Tensor;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

/// Fully connected layer with Xavier-uniform initialisation
pub struct Linear {
    /// Weight [in_features, out_features] flattened row-major
    pub weight: Tensor,
    /// Bias [out_features]
    pub bias: Tensor,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Create a layer with weights drawn from `U(-a, a)`, `a = sqrt(6 / (in + out))`
    pub fn new(in_features: usize, out_features: usize, seed: u64) -> Self {
        assert!(in_features > 0, "in_features must be > 0");
        assert!(out_features > 0, "out_features must be > 0");

        let bound = (6.0 / (in_features + out_features) as f32).sqrt();
        let mut rng = StdRng::seed_from_u64(seed);
        let weight: Vec<f32> = (0..in_features * out_features)
            .map(|_| rng.random_range(-bound..bound))
            .collect();

        Self::from_parts(weight, vec![0.0; out_features], in_features, out_features)
    }

    /// Build a layer from explicit weights (row-major `[in, out]`) and bias
    pub fn from_parts(
        weight: Vec<f32>,
        bias: Vec<f32>,
        in_features: usize,
        out_features: usize,
    ) -> Self {
        assert_eq!(weight.len(), in_features * out_features, "Weight size mismatch");
        assert_eq!(bias.len(), out_features, "Bias size mismatch");
        Self {
            weight: Tensor::from_shape(weight, &[in_features, out_features], true),
            bias: Tensor::from_vec(bias, true),
            in_features,
            out_features,
        }
    }

    #[must_use]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    #[must_use]
    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Model for Linear {
    fn forward(&self, input: &Tensor) -> Tensor {
        let rows = input.rows();
        assert_eq!(
            input.row_len(),
            self.in_features,
            "Linear expects {} input features, got {}",
            self.in_features,
            input.row_len()
        );

        let x = matrix(input.data(), rows, self.in_features);
        let w = matrix(self.weight.data(), self.in_features, self.out_features);
        let mut y = x.dot(&w);
        y += self.bias.data();

        let requires_grad =
            input.requires_grad() || self.weight.requires_grad() || self.bias.requires_grad();
        let mut output =
            Tensor::new(flatten(&y), requires_grad).reshape(&[rows, self.out_features]);

        if requires_grad {
            let result_grad = output.grad_cell();
            output.set_backward_op(Rc::new(LinearBackward {
                input: input.clone(),
                weight: self.weight.clone(),
                bias: self.bias.clone(),
                rows,
                in_features: self.in_features,
                out_features: self.out_features,
                result_grad,
            }));
        }

        output
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weight, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.weight, &mut self.bias]
    }

    fn name(&self) -> &str {
        "Linear"
    }
}

struct LinearBackward {
    input: Tensor,
    weight: Tensor,
    bias: Tensor,
    rows: usize,
    in_features: usize,
    out_features: usize,
    result_grad: GradCell,
}

impl BackwardOp for LinearBackward {
    fn backward(&self) {
        let Some(grad_out) = self.result_grad.borrow().clone() else {
            return;
        };
        let g = matrix(&grad_out, self.rows, self.out_features);

        if self.weight.requires_grad() {
            // ∂L/∂W = xᵀ · ∂L/∂y
            let x = matrix(self.input.data(), self.rows, self.in_features);
            self.weight.accumulate_grad(&flatten(&x.t().dot(&g)));
        }
        if self.bias.requires_grad() {
            self.bias.accumulate_grad(&g.sum_axis(Axis(0)));
        }
        if self.input.requires_grad() {
            // ∂L/∂x = ∂L/∂y · Wᵀ
            let w = matrix(self.weight.data(), self.in_features, self.out_features);
            self.input.accumulate_grad(&flatten(&g.dot(&w.t())));
        }

        if let Some(op) = self.input.backward_op() {
            op.backward();
        }
    }
}

fn matrix(data: &Array1<f32>, rows: usize, cols: usize) -> ArrayView2<'_, f32> {
    data.view()
        .into_shape_with_order((rows, cols))
        .expect("tensor storage matches its declared shape")
}

fn flatten(m: &Array2<f32>) -> Array1<f32> {
    m.iter().copied().collect()
}
