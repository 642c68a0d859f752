//! Optimizers returned by `configure_optimizer`
//!
//! Both policies train with [`Adam`]; the trainer only sees the
//! [`Optimizer`] trait object.

mod adam;
mod optimizer;

pub use adam::Adam;
pub use optimizer::Optimizer;
