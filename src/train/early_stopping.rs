//! Validation-driven early stopping with checkpoint-on-improvement

use crate::Result;

/// Outcome of feeding one validation loss to the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Loss improved (or was the first seen); a checkpoint was written
    Improved,
    /// No improvement; patience not yet exhausted
    Waiting,
    /// No improvement for `patience` consecutive epochs
    Stop,
}

/// Tracks the best validation score and the run of epochs without
/// improvement.
///
/// Scores are negated losses. A loss improves when its score is at least
/// `best_score + delta`, so an equal loss counts as an improvement with the
/// default delta of zero. A NaN loss never improves.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    delta: f32,
    best_score: Option<f32>,
    val_loss_min: f32,
    counter: usize,
    early_stop: bool,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self::with_delta(patience, 0.0)
    }

    pub fn with_delta(patience: usize, delta: f32) -> Self {
        Self {
            patience,
            delta,
            best_score: None,
            val_loss_min: f32::INFINITY,
            counter: 0,
            early_stop: false,
        }
    }

    /// Feed this epoch's validation loss.
    ///
    /// `save` runs exactly when the loss improves; its error aborts the update
    /// and leaves the monitor state untouched.
    pub fn update<F>(&mut self, val_loss: f32, save: F) -> Result<Verdict>
    where
        F: FnOnce() -> Result<()>,
    {
        let score = -val_loss;
        let improved = !score.is_nan()
            && match self.best_score {
                None => true,
                Some(best) => score >= best + self.delta,
            };

        if improved {
            tracing::info!(
                from = self.val_loss_min,
                to = val_loss,
                "Validation loss decreased, saving model"
            );
            save()?;
            self.best_score = Some(score);
            self.val_loss_min = val_loss;
            self.counter = 0;
            return Ok(Verdict::Improved);
        }

        self.counter += 1;
        tracing::info!(
            counter = self.counter,
            patience = self.patience,
            "EarlyStopping counter"
        );
        if self.counter >= self.patience {
            self.early_stop = true;
            Ok(Verdict::Stop)
        } else {
            Ok(Verdict::Waiting)
        }
    }

    pub fn early_stop(&self) -> bool {
        self.early_stop
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Lowest validation loss that triggered a save
    pub fn val_loss_min(&self) -> f32 {
        self.val_loss_min
    }

    pub fn best_score(&self) -> Option<f32> {
        self.best_score
    }
}
