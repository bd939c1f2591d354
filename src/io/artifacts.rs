//! Test-result artifacts (`.npy` arrays and a JSON run summary)

use crate::train::{EpochRecord, Metrics};
use crate::{Error, Result};
use ndarray::{Array3, ArrayBase, Data, Dimension};
use ndarray_npy::WritableElement;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Writes `<prefix>metrics.npy`, `<prefix>pred.npy` and `<prefix>true.npy`
/// into one results directory
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    /// Create `dir` (and parents) if absent
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Aggregate artifacts: `metrics.npy`, `pred.npy`, `true.npy`
    pub fn write_aggregate(
        &self,
        metrics: &Metrics,
        pred: &Array3<f32>,
        truth: &Array3<f32>,
    ) -> Result<()> {
        self.write_set("", metrics, pred, truth)
    }

    /// Per-file artifacts: `<stem>_metrics.npy`, `<stem>_pred.npy`, `<stem>_true.npy`
    pub fn write_per_file(
        &self,
        file_name: &str,
        metrics: &Metrics,
        pred: &Array3<f32>,
        truth: &Array3<f32>,
    ) -> Result<()> {
        self.write_set(&format!("{}_", file_stem(file_name)), metrics, pred, truth)
    }

    fn write_set(
        &self,
        prefix: &str,
        metrics: &Metrics,
        pred: &Array3<f32>,
        truth: &Array3<f32>,
    ) -> Result<()> {
        write_npy(self.dir.join(format!("{prefix}metrics.npy")), &metrics.to_array())?;
        write_npy(self.dir.join(format!("{prefix}pred.npy")), pred)?;
        write_npy(self.dir.join(format!("{prefix}true.npy")), truth)?;
        Ok(())
    }

    /// `history.json`: one record per trained epoch
    pub fn write_history(&self, history: &[EpochRecord]) -> Result<PathBuf> {
        #[derive(Serialize)]
        struct History<'a> {
            epochs: &'a [EpochRecord],
        }
        let path = self.dir.join("history.json");
        let json = serde_json::to_string_pretty(&History { epochs: history })
            .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}")))?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// File name without its final extension (`ETTh1.csv` -> `ETTh1`)
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

fn write_npy<S, D>(path: PathBuf, array: &ArrayBase<S, D>) -> Result<()>
where
    S: Data,
    S::Elem: WritableElement,
    D: Dimension,
{
    ndarray_npy::write_npy(&path, array)
        .map_err(|e| Error::Serialization(format!("{}: {e}", path.display())))
}
