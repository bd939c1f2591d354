//! Per-epoch records and the training summary

use super::Metrics;
use serde::Serialize;

/// What one epoch produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochRecord {
    /// 1-based epoch index
    pub epoch: usize,
    /// Unweighted mean of the per-file train losses
    pub train_loss: f32,
    /// Unweighted mean of the per-file validation losses
    pub vali_loss: f32,
    pub mae: f32,
    pub mse: f32,
    pub rmse: f32,
    pub mape: f32,
    pub mspe: f32,
    /// Batches stepped in this epoch
    pub steps: usize,
    pub duration_secs: f64,
    /// Learning rate the epoch trained with
    pub lr: f32,
}

impl EpochRecord {
    pub fn metrics(&self) -> Metrics {
        Metrics {
            mae: self.mae,
            mse: self.mse,
            rmse: self.rmse,
            mape: self.mape,
            mspe: self.mspe,
        }
    }
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainResult {
    /// Last epoch that ran (1-based)
    pub final_epoch: usize,
    /// Lowest validation loss, the one the restored checkpoint was saved at
    pub best_vali_loss: f32,
    /// Whether early stopping ended the run
    pub stopped_early: bool,
    pub elapsed_secs: f64,
    pub history: Vec<EpochRecord>,
}

/// Tracks training metrics across epochs
#[derive(Clone, Debug, Default)]
pub struct MetricsTracker {
    records: Vec<EpochRecord>,
    /// Training step count over the whole run
    pub steps: usize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_step(&mut self) {
        self.steps += 1;
    }

    pub fn record_epoch(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    pub fn epochs(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<EpochRecord> {
        self.records
    }

    /// Best (minimum) validation loss; NaN entries are ignored
    pub fn best_vali_loss(&self) -> Option<f32> {
        self.records
            .iter()
            .map(|r| r.vali_loss)
            .filter(|l| !l.is_nan())
            .min_by(f32::total_cmp)
    }

    /// Mean train loss over the last `n` epochs
    pub fn avg_train_loss(&self, n: usize) -> Option<f32> {
        if self.records.is_empty() || n == 0 {
            return None;
        }
        let window = &self.records[self.records.len().saturating_sub(n)..];
        Some(window.iter().map(|r| r.train_loss).sum::<f32>() / window.len() as f32)
    }
}
