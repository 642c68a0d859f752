//! Backward operation trait

use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Gradient storage shared between a tensor and its clones
pub type GradCell = Rc<RefCell<Option<Array1<f32>>>>;

/// A node in the gradient tape
///
/// Implementations read the gradient of the tensor they are attached to,
/// push gradients into their inputs and then recurse into the inputs' own
/// backward ops.
pub trait BackwardOp {
    /// Propagate gradients to the inputs of the recorded operation
    fn backward(&self);
}

/// Add `grad` to the contents of `cell`, initialising it when empty
pub fn accumulate_into(cell: &GradCell, grad: &Array1<f32>) {
    let mut slot = cell.borrow_mut();
    match slot.as_mut() {
        Some(existing) => *existing += grad,
        None => *slot = Some(grad.clone()),
    }
}
