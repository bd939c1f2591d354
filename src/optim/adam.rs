//! Adam optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::{Array1, Zip};

/// Adam optimizer (Adaptive Moment Estimation)
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: i32,
    moments: Vec<Option<(Array1<f32>, Array1<f32>)>>,
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            moments: Vec::new(),
        }
    }

    /// Adam with the usual betas (0.9, 0.999) and epsilon 1e-8
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Tensor]) {
        if self.moments.len() != params.len() {
            self.moments = vec![None; params.len()];
        }
        self.t = self.t.saturating_add(1);

        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        // bias-corrected step size
        let lr_t = self.lr * (1.0 - beta2.powi(self.t)).sqrt() / (1.0 - beta1.powi(self.t));

        for (param, slot) in params.iter_mut().zip(self.moments.iter_mut()) {
            let Some(grad) = param.grad() else {
                continue;
            };
            let (m, v) =
                slot.get_or_insert_with(|| (Array1::zeros(grad.len()), Array1::zeros(grad.len())));

            Zip::from(param.data_mut())
                .and(&mut *m)
                .and(&mut *v)
                .and(&grad)
                .for_each(|p, m, v, &g| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + eps);
                });
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adam_quadratic_convergence() {
        // f(x) = x², ∇f = 2x
        let mut params = vec![Tensor::from_vec(vec![5.0, -3.0, 2.0], true)];
        let mut optimizer = Adam::default_params(0.1);

        for _ in 0..200 {
            let grad = params[0].data().mapv(|x| 2.0 * x);
            params[0].set_grad(grad);
            optimizer.step(&mut params);
        }

        for &val in params[0].data().iter() {
            assert!(val.abs() < 0.5, "Value {} did not converge", val);
        }
    }

    #[test]
    fn test_first_step_magnitude_is_lr() {
        // with zero-initialized moments the first update is lr * sign(g)
        let mut params = vec![Tensor::from_vec(vec![1.0], true)];
        params[0].set_grad(ndarray::arr1(&[4.0]));
        let mut optimizer = Adam::default_params(0.01);
        optimizer.step(&mut params);
        assert!((params[0].data()[0] - 0.99).abs() < 1e-4);
    }

    #[test]
    fn test_set_lr() {
        let mut optimizer = Adam::default_params(0.01);
        optimizer.set_lr(0.5);
        assert_eq!(optimizer.lr(), 0.5);
    }
}
