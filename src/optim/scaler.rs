//! Dynamic loss scaling for mixed-precision steps

use super::Optimizer;
use crate::autograd::backward;
use crate::Tensor;

const DEFAULT_INITIAL_SCALE: f32 = 65536.0;
const DEFAULT_GROWTH_INTERVAL: usize = 2000;

/// Scales the loss before backprop and unscales gradients before the step.
///
/// A step whose unscaled gradients contain a non-finite value is skipped and
/// the scale backs off; after `growth_interval` clean steps the scale grows.
#[derive(Debug, Clone)]
pub struct GradScaler {
    scale: f32,
    growth_factor: f32,
    backoff_factor: f32,
    growth_interval: usize,
    steps_since_growth: usize,
    overflow_count: usize,
    successful_steps: usize,
}

impl GradScaler {
    pub fn new(initial_scale: f32) -> Self {
        Self {
            scale: initial_scale,
            growth_factor: 2.0,
            backoff_factor: 0.5,
            growth_interval: DEFAULT_GROWTH_INTERVAL,
            steps_since_growth: 0,
            overflow_count: 0,
            successful_steps: 0,
        }
    }

    pub fn with_growth_interval(mut self, interval: usize) -> Self {
        self.growth_interval = interval.max(1);
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    pub fn successful_steps(&self) -> usize {
        self.successful_steps
    }

    /// Backpropagate `loss * scale`
    pub fn scale_backward(&self, loss: &mut Tensor) {
        let seed = ndarray::Array1::from_elem(loss.len(), self.scale);
        backward(loss, Some(seed));
    }

    /// Divide every gradient by the scale. Returns false on overflow.
    fn unscale_and_check(&self, params: &[Tensor]) -> bool {
        let inv_scale = 1.0 / self.scale;
        let mut finite = true;
        for param in params {
            if let Some(mut grad) = param.grad() {
                grad.mapv_inplace(|g| g * inv_scale);
                finite &= grad.iter().all(|g| g.is_finite());
                param.set_grad(grad);
            }
        }
        finite
    }

    /// Unscale, then step the optimizer only if the gradients are finite.
    ///
    /// Returns whether the optimizer stepped. Call [`GradScaler::update`]
    /// with the result afterwards.
    pub fn step(&self, optimizer: &mut dyn Optimizer, params: &mut [Tensor]) -> bool {
        let valid = self.unscale_and_check(params);
        if valid {
            optimizer.step(params);
        } else {
            tracing::debug!(scale = self.scale, "Skipping step: non-finite gradients");
        }
        valid
    }

    /// Adjust the scale after a step
    pub fn update(&mut self, grads_valid: bool) {
        if grads_valid {
            self.successful_steps += 1;
            self.steps_since_growth += 1;
            if self.steps_since_growth >= self.growth_interval {
                self.scale *= self.growth_factor;
                self.steps_since_growth = 0;
            }
        } else {
            self.overflow_count += 1;
            self.scale = (self.scale * self.backoff_factor).max(1.0);
            self.steps_since_growth = 0;
        }
    }
}

impl Default for GradScaler {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_SCALE)
    }
}
