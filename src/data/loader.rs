//! Batching of dataset windows

use super::TimeSeriesDataset;
use crate::{Error, Result};
use ndarray::{s, Array3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A stacked group of windows
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `[batch, seq_len, channels]`
    pub seq_x: Array3<f32>,
    /// `[batch, label_len + pred_len, channels]`
    pub seq_y: Array3<f32>,
}

impl Batch {
    pub fn size(&self) -> usize {
        self.seq_x.shape()[0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    pub batch_size: usize,
    pub shuffle: bool,
    pub drop_last: bool,
    pub seed: u64,
}

/// Ordered batches for one pass over a dataset.
///
/// Batches are materialized up front; iteration order is fixed once built,
/// so a loader can be walked any number of times with identical results.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    batches: Vec<Batch>,
}

impl DataLoader {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    /// Group every window of `dataset` into batches
    pub fn from_dataset<D: TimeSeriesDataset + ?Sized>(
        dataset: &D,
        options: LoaderOptions,
    ) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(Error::InvalidParameter("batch_size must be > 0".into()));
        }

        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if options.shuffle {
            let mut rng = StdRng::seed_from_u64(options.seed);
            order.shuffle(&mut rng);
        }

        let batches = order
            .chunks(options.batch_size)
            .filter(|chunk| !options.drop_last || chunk.len() == options.batch_size)
            .map(|chunk| stack(dataset, chunk))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { batches })
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Batch> {
        self.batches.iter()
    }
}

impl<'a> IntoIterator for &'a DataLoader {
    type Item = &'a Batch;
    type IntoIter = std::slice::Iter<'a, Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.iter()
    }
}

/// Stack the windows at `indices`; the first window fixes the batch shape
fn stack<D: TimeSeriesDataset + ?Sized>(dataset: &D, indices: &[usize]) -> Result<Batch> {
    let Some((&first, rest)) = indices.split_first() else {
        return Err(Error::InvalidParameter("cannot stack an empty batch".into()));
    };
    let (first_x, first_y) = dataset.window(first);
    let (x_len, c) = first_x.dim();
    let y_len = first_y.nrows();

    let mut seq_x = Array3::zeros((indices.len(), x_len, c));
    let mut seq_y = Array3::zeros((indices.len(), y_len, c));
    seq_x.slice_mut(s![0, .., ..]).assign(&first_x);
    seq_y.slice_mut(s![0, .., ..]).assign(&first_y);

    for (row, &i) in rest.iter().enumerate() {
        let (x, y) = dataset.window(i);
        seq_x.slice_mut(s![row + 1, .., ..]).assign(&x);
        seq_y.slice_mut(s![row + 1, .., ..]).assign(&y);
    }
    Ok(Batch { seq_x, seq_y })
}
