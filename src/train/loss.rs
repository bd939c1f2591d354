//! Loss criteria

use crate::autograd::{BackwardOp, GradCell};
use crate::{Error, Result, Tensor};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Trait for loss functions
pub trait LossFn {
    /// Scalar loss over flattened predictions and targets.
    ///
    /// When `predictions` requires grad the returned tensor carries a backward
    /// op that scales the local gradient by the seed it receives.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Result<Tensor>;

    fn name(&self) -> &str;
}

/// Selectable criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    #[default]
    Mse,
    Mae,
}

impl LossKind {
    pub fn build(self) -> Box<dyn LossFn> {
        match self {
            LossKind::Mse => Box::new(MSELoss),
            LossKind::Mae => Box::new(L1Loss),
        }
    }
}

fn check_lengths(predictions: &Tensor, targets: &Tensor) -> Result<()> {
    if predictions.len() != targets.len() || predictions.is_empty() {
        return Err(Error::ShapeMismatch {
            expected: vec![predictions.len()],
            got: vec![targets.len()],
        });
    }
    Ok(())
}

/// Attach a backward op that feeds `local_grad * seed` into `predictions`
fn attach(loss: &mut Tensor, predictions: &Tensor, local_grad: Array1<f32>) {
    if predictions.requires_grad() {
        loss.set_backward_op(Rc::new(ReduceBackward {
            predictions: predictions.clone(),
            local_grad,
            result_grad: loss.grad_cell(),
        }));
    }
}

struct ReduceBackward {
    predictions: Tensor,
    local_grad: Array1<f32>,
    result_grad: GradCell,
}

impl BackwardOp for ReduceBackward {
    fn backward(&self) {
        let seed = self
            .result_grad
            .borrow()
            .as_ref()
            .and_then(|g| g.first().copied())
            .unwrap_or(1.0);
        self.predictions.accumulate_grad(&self.local_grad * seed);
        if let Some(op) = self.predictions.backward_op() {
            op.backward();
        }
    }
}

/// Mean squared error: `mean((p - t)²)`
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl LossFn for MSELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Result<Tensor> {
        check_lengths(predictions, targets)?;
        let diff = predictions.data() - targets.data();
        let n = diff.len() as f32;
        let mse = diff.iter().map(|d| d * d).sum::<f32>() / n;

        let mut loss = Tensor::scalar(mse, predictions.requires_grad());
        attach(&mut loss, predictions, diff * (2.0 / n));
        Ok(loss)
    }

    fn name(&self) -> &str {
        "MSE"
    }
}

/// Mean absolute error: `mean(|p - t|)`
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Loss;

impl LossFn for L1Loss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Result<Tensor> {
        check_lengths(predictions, targets)?;
        let diff = predictions.data() - targets.data();
        let n = diff.len() as f32;
        let mae = diff.iter().map(|d| d.abs()).sum::<f32>() / n;

        let mut loss = Tensor::scalar(mae, predictions.requires_grad());
        attach(&mut loss, predictions, diff.mapv(|d| d.signum() / n));
        Ok(loss)
    }

    fn name(&self) -> &str {
        "L1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, matmul};
    use approx::assert_relative_eq;

    #[test]
    fn test_mse_loss_basic() {
        let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        let target = Tensor::from_vec(vec![1.5, 2.5, 3.5], false);
        let loss = MSELoss.forward(&pred, &target).unwrap();
        assert_relative_eq!(loss.item(), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_mse_gradient_scaled_by_seed() {
        let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        let target = Tensor::zeros(3, false);
        let mut loss = MSELoss.forward(&pred, &target).unwrap();
        backward(&mut loss, Some(ndarray::arr1(&[10.0])));

        let grad = pred.grad().unwrap();
        assert_relative_eq!(grad[0], 10.0 * 2.0 / 3.0, epsilon = 1e-5);
        assert_relative_eq!(grad[2], 10.0 * 6.0 / 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_mse_reaches_parameters_through_graph() {
        // pred = x @ w, x = [1, 2] as 2x1, w = [0.5] as 1x1
        let x = Tensor::from_vec(vec![1.0, 2.0], false);
        let w = Tensor::from_vec(vec![0.5], true);
        let pred = matmul(&x, &w, 2, 1, 1).unwrap();
        let target = Tensor::from_vec(vec![1.0, 2.0], false);
        let mut loss = MSELoss.forward(&pred, &target).unwrap();
        backward(&mut loss, None);

        // dL/dw = mean(2 * (x*w - t) * x) = (2*-0.5*1 + 2*-1*2) / 2 = -2.5
        assert_relative_eq!(w.grad().unwrap()[0], -2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_l1_loss_and_gradient() {
        let pred = Tensor::from_vec(vec![1.0, -1.0], true);
        let target = Tensor::from_vec(vec![0.0, 0.0], false);
        let mut loss = L1Loss.forward(&pred, &target).unwrap();
        assert_relative_eq!(loss.item(), 1.0);
        backward(&mut loss, None);
        let grad = pred.grad().unwrap();
        assert_relative_eq!(grad[0], 0.5);
        assert_relative_eq!(grad[1], -0.5);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let pred = Tensor::zeros(3, true);
        let target = Tensor::zeros(2, false);
        assert!(MSELoss.forward(&pred, &target).is_err());
    }

    #[test]
    fn test_detached_prediction_has_no_backward() {
        let pred = Tensor::from_vec(vec![1.0], false);
        let target = Tensor::from_vec(vec![0.0], false);
        let loss = MSELoss.forward(&pred, &target).unwrap();
        assert!(loss.backward_op().is_none());
    }

    #[test]
    fn test_loss_kind_build() {
        assert_eq!(LossKind::Mse.build().name(), "MSE");
        assert_eq!(LossKind::Mae.build().name(), "L1");
    }
}
