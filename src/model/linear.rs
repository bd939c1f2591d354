//! Channel-independent linear forecaster

use super::{BatchOutput, Forecaster};
use crate::autograd::{add, gather, matmul, Mode};
use crate::data::{Batch, Features};
use crate::io::ParamSpec;
use crate::{Error, Result, Tensor};
use ndarray::{s, Array1, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;

const ARCHITECTURE: &str = "linear";

/// Maps each channel's `seq_len` history to its `pred_len` future with one
/// weight matrix `[seq_len, pred_len]` and bias `[pred_len]` shared by all
/// channels.
///
/// With [`Features::MS`] only the last (target) channel is forecast.
#[derive(Debug, Clone)]
pub struct LinearForecaster {
    seq_len: usize,
    pred_len: usize,
    features: Features,
    specs: Vec<ParamSpec>,
    params: Vec<Tensor>,
}

impl LinearForecaster {
    /// Uniform init in `±1/sqrt(seq_len)` from a seeded generator
    pub fn new(seq_len: usize, pred_len: usize, features: Features, seed: u64) -> Result<Self> {
        if seq_len == 0 || pred_len == 0 {
            return Err(Error::InvalidParameter(
                "seq_len and pred_len must be > 0".into(),
            ));
        }
        let bound = 1.0 / (seq_len as f32).sqrt();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut uniform = |n: usize| -> Tensor {
            Tensor::new(Array1::from_shape_fn(n, |_| rng.gen_range(-bound..bound)), true)
        };
        let weight = uniform(seq_len * pred_len);
        let bias = uniform(pred_len);

        Ok(Self {
            seq_len,
            pred_len,
            features,
            specs: vec![
                ParamSpec::new("linear.weight", vec![seq_len, pred_len]),
                ParamSpec::new("linear.bias", vec![pred_len]),
            ],
            params: vec![weight, bias],
        })
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn pred_len(&self) -> usize {
        self.pred_len
    }

    /// Channels the model forecasts given `c_in` input channels
    fn out_channels(&self, c_in: usize) -> usize {
        match self.features {
            Features::MS => 1,
            Features::M | Features::S => c_in,
        }
    }
}

impl Forecaster for LinearForecaster {
    fn architecture(&self) -> &str {
        ARCHITECTURE
    }

    fn process_batch(&self, batch: &Batch, mode: Mode) -> Result<BatchOutput> {
        let (b, l, c_in) = batch.seq_x.dim();
        let (_, y_len, _) = batch.seq_y.dim();
        let p = self.pred_len;
        if l != self.seq_len || y_len < p || c_in == 0 {
            return Err(Error::ShapeMismatch {
                expected: vec![b, self.seq_len, c_in],
                got: batch.seq_x.shape().to_vec(),
            });
        }
        let c_out = self.out_channels(c_in);
        let first = c_in - c_out;
        let rows = b * c_out;

        // one row per (sample, channel): that channel's history
        let x = batch
            .seq_x
            .slice(s![.., .., first..])
            .permuted_axes([0, 2, 1])
            .iter()
            .copied()
            .collect::<Array1<f32>>();
        let x = Tensor::new(x, false);

        let weight = mode.prepare(&self.params[0]);
        let bias = mode.prepare(&self.params[1]);
        let ones = Tensor::ones(rows, false);

        let projected = matmul(&x, &weight, rows, l, p)?;
        let offset = matmul(&ones, &bias, rows, 1, p)?;
        let flat = add(&projected, &offset)?;

        // [rows = b * c_out, p] -> [b, p, c_out]
        let index: Rc<[usize]> = (0..b)
            .flat_map(|bi| {
                (0..p).flat_map(move |t| (0..c_out).map(move |ci| (bi * c_out + ci) * p + t))
            })
            .collect();
        let prediction = gather(&flat, index)?;

        let truth = batch
            .seq_y
            .slice(s![.., y_len - p.., first..])
            .iter()
            .copied()
            .collect::<Array1<f32>>();

        Ok(BatchOutput {
            prediction,
            truth: Tensor::new(truth, false),
            shape: (b, p, c_out),
        })
    }

    fn param_specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    fn params(&self) -> &[Tensor] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [Tensor] {
        &mut self.params
    }
}

impl LinearForecaster {
    /// Predictions only, as `[batch, pred_len, channels]`
    pub fn predict(&self, batch: &Batch) -> Result<Array3<f32>> {
        self.process_batch(batch, Mode::Eval)?.prediction_array()
    }
}
