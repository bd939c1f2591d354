//! Per-channel standardization

use crate::{Error, Result};
use ndarray::{Array1, Array2, Array3, Axis, Zip};

/// Zero-mean, unit-variance scaling fit on the training rows.
///
/// Uses the population standard deviation; a constant channel gets a scale
/// of 1 so it maps to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f32>,
    std: Array1<f32>,
}

impl StandardScaler {
    /// Fit per-column statistics on `[rows, channels]`
    pub fn fit(data: &Array2<f32>) -> Result<Self> {
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::Data("cannot fit scaler on zero rows".into()))?;
        let std = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f32::EPSILON { s } else { 1.0 });
        Ok(Self { mean, std })
    }

    pub fn channels(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, data: &Array2<f32>) -> Array2<f32> {
        (data - &self.mean) / &self.std
    }

    /// Undo [`StandardScaler::transform`] over `[samples, steps, channels]`.
    ///
    /// A single-channel input is broadcast, producing one output channel per
    /// fitted channel.
    pub fn inverse_transform(&self, data: &Array3<f32>) -> Result<Array3<f32>> {
        let (n, steps, c) = data.dim();
        let channels = self.channels();
        if c != channels && c != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![n, steps, channels],
                got: vec![n, steps, c],
            });
        }

        let mut out = Array3::zeros((n, steps, channels));
        for (mut out_row, in_row) in out.lanes_mut(Axis(2)).into_iter().zip(data.lanes(Axis(2))) {
            Zip::indexed(&mut out_row).for_each(|j, v| {
                let x = if c == 1 { in_row[0] } else { in_row[j] };
                *v = x * self.std[j] + self.mean[j];
            });
        }
        Ok(out)
    }
}
