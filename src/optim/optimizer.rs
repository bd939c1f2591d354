//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms
pub trait Optimizer {
    /// Apply one update to every parameter that holds a gradient
    fn step(&mut self, params: &mut [Tensor]);

    /// Clear all gradients before the next forward pass
    fn zero_grad(&mut self, params: &mut [Tensor]) {
        params.iter().for_each(Tensor::zero_grad);
    }

    fn lr(&self) -> f32;

    fn set_lr(&mut self, lr: f32);

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}
