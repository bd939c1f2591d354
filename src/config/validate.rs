//! Configuration validation

use super::schema::ExperimentSpec;
use crate::Error;

/// Validation error type
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Data root does not exist: {0}")]
    RootPathNotFound(String),

    #[error("Data file does not exist: {0}")]
    DataFileNotFound(String),

    #[error("Target column must not be empty")]
    EmptyTarget,

    #[error("Invalid learning rate: {0} (must be > 0.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid patience: {0} (must be > 0)")]
    InvalidPatience(usize),

    #[error("Invalid window: seq_len={seq_len}, label_len={label_len}, pred_len={pred_len} (need seq_len > 0, pred_len > 0, label_len <= seq_len)")]
    InvalidWindow {
        seq_len: usize,
        label_len: usize,
        pred_len: usize,
    },

    #[error("Unknown model: {0} (must be: linear)")]
    UnknownModel(String),

    #[error("Invalid iteration count: {0} (must be > 0)")]
    InvalidIterations(usize),

    #[error("Invalid log interval: {0} (must be > 0)")]
    InvalidLogInterval(usize),

    #[error("Invalid step size: {0} (must be > 0)")]
    InvalidStepSize(usize),
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::ConfigError(format!("Invalid config: {e}"))
    }
}

/// Validate an experiment specification
///
/// Checks:
/// - The data root (and any listed file) exists
/// - Numeric values are in valid ranges
/// - The model name is known
pub fn validate_config(spec: &ExperimentSpec) -> Result<(), ValidationError> {
    let data = &spec.data;
    if !data.root_path.is_dir() {
        return Err(ValidationError::RootPathNotFound(
            data.root_path.display().to_string(),
        ));
    }
    if let Some(missing) = data.files.iter().find(|f| !data.root_path.join(f).is_file()) {
        return Err(ValidationError::DataFileNotFound(missing.clone()));
    }
    if data.target.trim().is_empty() {
        return Err(ValidationError::EmptyTarget);
    }
    if data.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(data.batch_size));
    }
    if data.seq_len == 0 || data.pred_len == 0 || data.label_len > data.seq_len {
        return Err(ValidationError::InvalidWindow {
            seq_len: data.seq_len,
            label_len: data.label_len,
            pred_len: data.pred_len,
        });
    }

    if spec.model.name != "linear" {
        return Err(ValidationError::UnknownModel(spec.model.name.clone()));
    }

    if !(spec.optimizer.lr.is_finite() && spec.optimizer.lr > 0.0) {
        return Err(ValidationError::InvalidLearningRate(spec.optimizer.lr));
    }

    let training = &spec.training;
    if training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(training.epochs));
    }
    if training.patience == 0 {
        return Err(ValidationError::InvalidPatience(training.patience));
    }
    if training.log_interval == 0 {
        return Err(ValidationError::InvalidLogInterval(training.log_interval));
    }
    if training.lr_step_size == 0 {
        return Err(ValidationError::InvalidStepSize(training.lr_step_size));
    }

    if spec.experiment.itr == 0 {
        return Err(ValidationError::InvalidIterations(spec.experiment.itr));
    }

    Ok(())
}
