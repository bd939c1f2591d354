//! Run configuration for the experiment driver

use super::LossKind;
use crate::optim::{Adam, LrAdjust, LrSchedule, Optimizer, SGD};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default progress-log cadence, in batches
pub const DEFAULT_LOG_INTERVAL: usize = 1000;

/// Which optimizer a run constructs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(self, lr: f32, momentum: f32) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::default_params(lr)),
            OptimizerKind::Sgd => Box::new(SGD::new(lr, momentum)),
        }
    }
}

/// Everything [`Experiment`](super::Experiment) needs besides data and model.
///
/// Checked once by [`RunConfig::validate`] when the experiment is built and
/// read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Root for `<setting>/checkpoint.pth`
    pub checkpoints: PathBuf,
    /// Root for `<setting>/*.npy`
    pub results: PathBuf,
    /// Load an existing checkpoint before training
    pub resume: bool,
    /// Non-improving epochs tolerated before stopping
    pub patience: usize,
    /// Minimum improvement in validation loss
    pub delta: f32,
    pub train_epochs: usize,
    pub learning_rate: f32,
    pub lradj: LrAdjust,
    pub lr_step_size: usize,
    pub lr_gamma: f32,
    pub min_lr: f32,
    /// Route backward/step through a gradient scaler
    pub use_amp: bool,
    pub pred_len: usize,
    /// Emit a progress line every this many batches
    pub log_interval: usize,
    pub loss: LossKind,
    pub optimizer: OptimizerKind,
    /// SGD only
    pub momentum: f32,
}

impl RunConfig {
    pub fn new(checkpoints: impl Into<PathBuf>, results: impl Into<PathBuf>) -> Self {
        Self {
            checkpoints: checkpoints.into(),
            results: results.into(),
            resume: false,
            patience: 3,
            delta: 0.0,
            train_epochs: 10,
            learning_rate: 1e-4,
            lradj: LrAdjust::default(),
            lr_step_size: 1,
            lr_gamma: 0.5,
            min_lr: 0.0,
            use_amp: false,
            pred_len: 24,
            log_interval: DEFAULT_LOG_INTERVAL,
            loss: LossKind::default(),
            optimizer: OptimizerKind::default(),
            momentum: 0.0,
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.train_epochs = epochs;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_lradj(mut self, lradj: LrAdjust) -> Self {
        self.lradj = lradj;
        self
    }

    pub fn with_pred_len(mut self, pred_len: usize) -> Self {
        self.pred_len = pred_len;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_amp(mut self, use_amp: bool) -> Self {
        self.use_amp = use_amp;
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.train_epochs == 0 {
            return Err(Error::ConfigError("train_epochs must be > 0".into()));
        }
        if self.patience == 0 {
            return Err(Error::ConfigError("patience must be > 0".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::ConfigError(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        if self.pred_len == 0 {
            return Err(Error::ConfigError("pred_len must be > 0".into()));
        }
        if self.log_interval == 0 {
            return Err(Error::ConfigError("log_interval must be > 0".into()));
        }
        if self.lr_step_size == 0 {
            return Err(Error::ConfigError("lr_step_size must be > 0".into()));
        }
        if self.delta < 0.0 || !self.delta.is_finite() {
            return Err(Error::ConfigError(format!("delta must be >= 0, got {}", self.delta)));
        }
        Ok(())
    }

    /// Schedule over this run's epochs
    pub fn schedule(&self) -> LrSchedule {
        LrSchedule {
            adjust: self.lradj,
            base_lr: self.learning_rate,
            step_size: self.lr_step_size,
            gamma: self.lr_gamma,
            min_lr: self.min_lr,
            total_epochs: self.train_epochs,
        }
    }

    pub fn build_optimizer(&self) -> Box<dyn Optimizer> {
        self.optimizer.build(self.learning_rate, self.momentum)
    }
}
