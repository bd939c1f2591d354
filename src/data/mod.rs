//! Datasets, batching and normalization
//!
//! A [`DataProvider`] owns an ordered collection of files. For each file and
//! [`Split`] it yields a [`TimeSeriesDataset`] (which knows how to undo its own
//! normalization) and a [`DataLoader`] over that split's sliding windows.

mod csv_file;
mod loader;
mod scaler;

pub use csv_file::{CsvDataset, CsvProvider, DataSettings, Features};
pub use loader::{Batch, DataLoader, LoaderOptions};
pub use scaler::StandardScaler;

use crate::Result;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which region of each file to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        })
    }
}

/// One file's split as a sequence of (input, target) windows
pub trait TimeSeriesDataset {
    /// Number of windows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channels per time step in each window
    fn channels(&self) -> usize;

    /// Window `index`: input `[seq_len, c]` and target `[label_len + pred_len, c]`
    fn window(&self, index: usize) -> (Array2<f32>, Array2<f32>);

    /// Map normalized values back to the original scale.
    ///
    /// The last axis is either the full channel count or 1; a single channel
    /// is broadcast against every channel's statistics.
    fn inverse_transform(&self, data: &Array3<f32>) -> Result<Array3<f32>>;
}

/// An ordered, restartable collection of per-file datasets
pub trait DataProvider {
    type Dataset: TimeSeriesDataset;

    /// File names in iteration order
    fn file_names(&self) -> &[String];

    /// Build the dataset and loader for one file's split
    fn get_data(&self, file: &str, split: Split) -> Result<(Self::Dataset, DataLoader)>;
}
