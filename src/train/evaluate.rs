//! Inference pass over one file's loader, shared by validation and test

use super::LossFn;
use crate::autograd::Mode;
use crate::data::{DataLoader, TimeSeriesDataset};
use crate::model::Forecaster;
use crate::{Error, Result};
use ndarray::{concatenate, s, Array3, ArrayView3, Axis};

/// Everything one evaluation pass collected
#[derive(Debug, Clone)]
pub struct EvalOutput {
    /// `[samples, pred_len, channels]` in loader order, normalized scale
    pub predictions: Array3<f32>,
    pub truths: Array3<f32>,
    /// Mean batch loss, when a criterion was given
    pub loss: Option<f32>,
    /// Inverse-transformed last channel `(pred, true)`, when requested
    pub restored: Option<(Array3<f32>, Array3<f32>)>,
}

/// Run `model` in eval mode over every batch of `loader`.
///
/// The loader must yield at least one batch; callers report
/// [`Error::EmptyLoader`] with file context before getting here.
pub fn evaluate<M>(
    model: &M,
    loader: &DataLoader,
    criterion: Option<&dyn LossFn>,
    restore: Option<&dyn TimeSeriesDataset>,
) -> Result<EvalOutput>
where
    M: Forecaster + ?Sized,
{
    if loader.is_empty() {
        return Err(Error::Data("evaluation loader yielded no batches".into()));
    }

    let mut preds = Vec::with_capacity(loader.len());
    let mut trues = Vec::with_capacity(loader.len());
    let mut losses = Vec::with_capacity(loader.len());

    for batch in loader {
        let out = model.process_batch(batch, Mode::Eval)?;
        if let Some(criterion) = criterion {
            losses.push(criterion.forward(&out.prediction, &out.truth)?.item());
        }
        preds.push(out.prediction_array()?);
        trues.push(out.truth_array()?);
    }

    let predictions = stack(&preds)?;
    let truths = stack(&trues)?;
    let loss = criterion.map(|_| losses.iter().sum::<f32>() / losses.len() as f32);
    let restored = match restore {
        Some(dataset) => Some((
            last_channel(dataset.inverse_transform(&predictions)?),
            last_channel(dataset.inverse_transform(&truths)?),
        )),
        None => None,
    };

    Ok(EvalOutput {
        predictions,
        truths,
        loss,
        restored,
    })
}

/// Concatenate along the sample axis
pub(crate) fn stack(parts: &[Array3<f32>]) -> Result<Array3<f32>> {
    let views: Vec<ArrayView3<f32>> = parts.iter().map(|a| a.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| Error::Data(format!("cannot pool predictions: {e}")))
}

fn last_channel(data: Array3<f32>) -> Array3<f32> {
    let c = data.shape()[2];
    data.slice(s![.., .., c.saturating_sub(1)..]).to_owned()
}
