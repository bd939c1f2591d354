//! Forecasting models
//!
//! A [`Forecaster`] turns one [`Batch`] into a prediction tensor and the
//! matching ground-truth tensor. The [`Mode`] argument decides whether the
//! prediction is attached to the parameters' gradient cells.

mod linear;

pub use linear::LinearForecaster;

use crate::autograd::Mode;
use crate::data::Batch;
use crate::io::{ParamSpec, StateDict};
use crate::{Error, Result, Tensor};
use ndarray::Array3;

/// Prediction and ground truth for one batch, both laid out flat as
/// `[batch, pred_len, channels]`
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub prediction: Tensor,
    pub truth: Tensor,
    pub shape: (usize, usize, usize),
}

impl BatchOutput {
    pub fn prediction_array(&self) -> Result<Array3<f32>> {
        to_array3(&self.prediction, self.shape)
    }

    pub fn truth_array(&self) -> Result<Array3<f32>> {
        to_array3(&self.truth, self.shape)
    }
}

fn to_array3(t: &Tensor, shape: (usize, usize, usize)) -> Result<Array3<f32>> {
    Array3::from_shape_vec(shape, t.data().to_vec()).map_err(|_| Error::ShapeMismatch {
        expected: vec![shape.0, shape.1, shape.2],
        got: vec![t.len()],
    })
}

pub trait Forecaster {
    /// Architecture tag stored in checkpoints
    fn architecture(&self) -> &str;

    /// Forward one batch. In [`Mode::Eval`] no graph is recorded.
    fn process_batch(&self, batch: &Batch, mode: Mode) -> Result<BatchOutput>;

    /// Name and shape of each entry of [`Forecaster::params`]
    fn param_specs(&self) -> &[ParamSpec];

    fn params(&self) -> &[Tensor];

    fn params_mut(&mut self) -> &mut [Tensor];

    fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new(self.architecture());
        for (spec, param) in self.param_specs().iter().zip(self.params()) {
            state.push(spec.clone(), param.data().clone());
        }
        state
    }

    /// Replace every parameter's values; all-or-nothing
    fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        if state.architecture != self.architecture() {
            return Err(Error::Serialization(format!(
                "checkpoint architecture '{}' does not match model '{}'",
                state.architecture,
                self.architecture()
            )));
        }
        let values = state.take_matching(self.param_specs())?;
        for (param, values) in self.params_mut().iter_mut().zip(values) {
            *param = Tensor::new(values, true);
        }
        Ok(())
    }
}
