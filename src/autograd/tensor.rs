//! Tensor with shared gradient storage

use super::backward::{accumulate_into, BackwardOp, GradCell};
use ndarray::Array1;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TENSOR_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a tensor
///
/// Assigned at construction and preserved by `clone`, so an optimizer can be
/// bound to exactly the parameters of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(u64);

impl TensorId {
    fn next() -> Self {
        Self(NEXT_TENSOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Flat `f32` tensor with a row-major shape
///
/// Cloning copies the data but shares the gradient cell and the identity.
/// A 1-D tensor is treated as a single row by the loss and metric code.
#[derive(Clone)]
pub struct Tensor {
    id: TensorId,
    data: Array1<f32>,
    shape: Vec<usize>,
    grad: GradCell,
    backward_op: Option<Rc<dyn BackwardOp>>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a 1-D tensor from an array
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        let shape = vec![data.len()];
        Self {
            id: TensorId::next(),
            data,
            shape,
            grad: Rc::new(RefCell::new(None)),
            backward_op: None,
            requires_grad,
        }
    }

    /// Create a 1-D tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a tensor with an explicit row-major shape
    pub fn from_shape(data: Vec<f32>, shape: &[usize], requires_grad: bool) -> Self {
        Self::from_vec(data, requires_grad).reshape(shape)
    }

    /// Create a 1-D tensor of zeros
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// Single-element tensor without gradient tracking
    pub fn scalar(value: f32) -> Self {
        Self::from_vec(vec![value], false)
    }

    /// Replace the shape, keeping storage and identity
    pub fn reshape(mut self, shape: &[usize]) -> Self {
        let expected: usize = shape.iter().product();
        assert_eq!(
            expected,
            self.data.len(),
            "Shape {shape:?} does not match {} elements",
            self.data.len()
        );
        self.shape = shape.to_vec();
        self
    }

    /// Identity shared by all clones of this tensor
    pub fn id(&self) -> TensorId {
        self.id
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Leading dimension; 1 for a 1-D tensor
    pub fn rows(&self) -> usize {
        if self.shape.len() < 2 {
            1
        } else {
            self.shape[0]
        }
    }

    /// Number of elements per row
    pub fn row_len(&self) -> usize {
        match self.rows() {
            0 => 0,
            rows => self.data.len() / rows,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of a single-element tensor
    pub fn item(&self) -> f32 {
        assert_eq!(self.data.len(), 1, "item() requires a single-element tensor");
        self.data[0]
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Current gradient, if any has been accumulated
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Handle to the gradient cell shared with clones
    pub fn grad_cell(&self) -> GradCell {
        Rc::clone(&self.grad)
    }

    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    pub fn accumulate_grad(&self, grad: &Array1<f32>) {
        accumulate_into(&self.grad, grad);
    }

    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    /// Seed this tensor's gradient with ones and run the tape
    pub fn backward(&self) {
        self.set_grad(Array1::ones(self.data.len()));
        if let Some(op) = &self.backward_op {
            op.backward();
        }
    }

    /// Copy of the data with no gradient history and a fresh identity
    pub fn detach(&self) -> Self {
        Self::new(self.data.clone(), false).reshape(&self.shape)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .field("data", &self.data)
            .field("requires_grad", &self.requires_grad)
            .field("has_backward", &self.backward_op.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_clone_shares_identity_and_grad() {
        let a = Tensor::from_vec(vec![1.0, 2.0], true);
        let b = a.clone();
        assert_eq!(a.id(), b.id());

        b.accumulate_grad(&arr1(&[0.5, 0.5]));
        assert_eq!(a.grad().unwrap(), arr1(&[0.5, 0.5]));
    }

    #[test]
    fn test_distinct_tensors_have_distinct_ids() {
        let a = Tensor::zeros(3, false);
        let b = Tensor::zeros(3, false);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_rows_and_row_len() {
        let m = Tensor::from_shape(vec![1.0; 6], &[2, 3], false);
        assert_eq!(m.rows(), 2);
        assert_eq!(m.row_len(), 3);

        let v = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
        assert_eq!(v.rows(), 1);
        assert_eq!(v.row_len(), 3);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_reshape_rejects_wrong_size() {
        Tensor::from_shape(vec![1.0; 5], &[2, 3], false);
    }

    #[test]
    fn test_zero_grad_clears_shared_cell() {
        let a = Tensor::from_vec(vec![1.0], true);
        let b = a.clone();
        a.set_grad(arr1(&[3.0]));
        b.zero_grad();
        assert!(a.grad().is_none());
    }

    #[test]
    fn test_backward_seeds_ones_without_op() {
        let loss = Tensor::scalar(0.7);
        loss.backward();
        assert_eq!(loss.grad().unwrap(), arr1(&[1.0]));
    }

    #[test]
    fn test_detach_drops_history_and_identity() {
        let a = Tensor::from_shape(vec![1.0, 2.0], &[1, 2], true);
        let d = a.detach();
        assert_ne!(a.id(), d.id());
        assert!(!d.requires_grad());
        assert!(d.backward_op().is_none());
        assert_eq!(d.shape(), &[1, 2]);
    }

    #[test]
    #[should_panic(expected = "single-element")]
    fn test_item_on_vector_panics() {
        Tensor::zeros(2, false).item();
    }
}
