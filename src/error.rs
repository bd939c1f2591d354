//! Error types for Pronostico

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Checkpoint not found: {}", .0.display())]
    MissingCheckpoint(PathBuf),

    #[error("Dataset collection is empty")]
    EmptyCollection,

    #[error("Dataset {file} yielded no batches for the {split} split")]
    EmptyLoader { file: String, split: String },

    #[error("Cannot reshape: {0}")]
    Reshape(String),

    #[error("Data error: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, Error>;
