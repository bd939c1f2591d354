//! Epoch-indexed learning-rate schedules
//!
//! A schedule is a pure function of the (1-based) epoch and its own settings:
//! it never reads optimizer state, so resuming or replaying a run reproduces
//! the same rates.

use super::Optimizer;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Learning-rate adjustment policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LrAdjust {
    /// Halve every epoch: `lr0 * 0.5^(epoch - 1)`
    #[default]
    Type1,
    /// Fixed table of absolute rates at epochs 2, 4, 6, 8, 10, 15, 20
    Type2,
    /// `lr0 * gamma^((epoch - 1) / step_size)`
    Step,
    /// Cosine annealing from `lr0` to `min_lr` over `train_epochs`
    Cosine,
    /// Never adjust
    Constant,
}

const TYPE2_TABLE: [(usize, f32); 7] = [
    (2, 5e-5),
    (4, 1e-5),
    (6, 5e-6),
    (8, 1e-6),
    (10, 5e-7),
    (15, 1e-7),
    (20, 5e-8),
];

/// Schedule settings, copied out of the run configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LrSchedule {
    pub adjust: LrAdjust,
    pub base_lr: f32,
    pub step_size: usize,
    pub gamma: f32,
    pub min_lr: f32,
    pub total_epochs: usize,
}

impl LrSchedule {
    pub fn new(adjust: LrAdjust, base_lr: f32) -> Self {
        Self {
            adjust,
            base_lr,
            step_size: 1,
            gamma: 0.5,
            min_lr: 0.0,
            total_epochs: 10,
        }
    }

    /// Rate for the given 1-based epoch, or `None` when this epoch keeps
    /// whatever rate is already in effect.
    pub fn lr_at(&self, epoch: usize) -> Option<f32> {
        let e = epoch.max(1);
        match self.adjust {
            LrAdjust::Type1 => Some(self.base_lr * 0.5f32.powi(exp(e - 1))),
            LrAdjust::Type2 => TYPE2_TABLE
                .iter()
                .find(|(at, _)| *at == e)
                .map(|&(_, lr)| lr),
            LrAdjust::Step => {
                let steps = (e - 1) / self.step_size.max(1);
                Some(self.base_lr * self.gamma.powi(exp(steps)))
            }
            LrAdjust::Cosine => {
                let total = self.total_epochs.max(1) as f32;
                let progress = (e as f32 / total).min(1.0);
                let decay = 0.5 * (1.0 + (PI * progress).cos());
                Some(self.min_lr + (self.base_lr - self.min_lr) * decay)
            }
            LrAdjust::Constant => None,
        }
    }
}

fn exp(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Set the optimizer's rate for `epoch` if the schedule adjusts there.
///
/// Returns the new rate when it changed.
pub fn apply_schedule(
    optimizer: &mut dyn Optimizer,
    schedule: &LrSchedule,
    epoch: usize,
) -> Option<f32> {
    let lr = schedule.lr_at(epoch)?;
    optimizer.set_lr(lr);
    tracing::info!(epoch, lr, "Updating learning rate");
    Some(lr)
}
