//! Stochastic Gradient Descent optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::{Array1, Zip};

/// SGD optimizer with optional momentum
pub struct SGD {
    lr: f32,
    momentum: f32,
    velocities: Vec<Option<Array1<f32>>>,
}

impl SGD {
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            velocities: Vec::new(),
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [Tensor]) {
        if self.velocities.len() != params.len() {
            self.velocities = vec![None; params.len()];
        }
        let (lr, momentum) = (self.lr, self.momentum);

        for (param, velocity) in params.iter_mut().zip(self.velocities.iter_mut()) {
            let Some(grad) = param.grad() else {
                continue;
            };
            if momentum > 0.0 {
                // v = momentum * v - lr * grad; p += v
                let v = velocity.get_or_insert_with(|| Array1::zeros(grad.len()));
                Zip::from(&mut *v)
                    .and(&grad)
                    .for_each(|v, &g| *v = momentum * *v - lr * g);
                *param.data_mut() += &*v;
            } else {
                param.data_mut().scaled_add(-lr, &grad);
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}
