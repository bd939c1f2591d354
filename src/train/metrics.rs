//! Regression error metrics over prediction / ground-truth arrays

use crate::{Error, Result};
use ndarray::{Array1, ArrayBase, Data, Dimension};
use std::fmt;

/// The five error measures reported for a forecast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub mae: f32,
    pub mse: f32,
    pub rmse: f32,
    pub mape: f32,
    pub mspe: f32,
}

impl Metrics {
    /// `[mae, mse, rmse, mape, mspe]`, the layout of `metrics.npy`
    pub fn to_array(&self) -> Array1<f32> {
        Array1::from(vec![self.mae, self.mse, self.rmse, self.mape, self.mspe])
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mse:{:.7}, mae:{:.7}, rmse:{:.7}, mape:{:.7}, mspe:{:.7}",
            self.mse, self.mae, self.rmse, self.mape, self.mspe
        )
    }
}

/// Compute all metrics element-wise over arrays of identical shape.
///
/// Percentage errors divide by the truth, so a zero truth yields an infinite
/// (or NaN) MAPE/MSPE rather than an error.
pub fn metric<S1, S2, D>(pred: &ArrayBase<S1, D>, truth: &ArrayBase<S2, D>) -> Result<Metrics>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    if pred.shape() != truth.shape() {
        return Err(Error::ShapeMismatch {
            expected: truth.shape().to_vec(),
            got: pred.shape().to_vec(),
        });
    }
    if pred.is_empty() {
        return Err(Error::Data("cannot compute metrics over zero samples".into()));
    }

    let (mut abs, mut sq, mut pct, mut sq_pct) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        let err = f64::from(p) - f64::from(t);
        let rel = err / f64::from(t);
        abs += err.abs();
        sq += err * err;
        pct += rel.abs();
        sq_pct += rel * rel;
    }
    let n = pred.len() as f64;
    let mse = sq / n;

    Ok(Metrics {
        mae: (abs / n) as f32,
        mse: mse as f32,
        rmse: mse.sqrt() as f32,
        mape: (pct / n) as f32,
        mspe: (sq_pct / n) as f32,
    })
}
