//! # Pronostico: multi-file time-series forecasting
//!
//! Trains one forecasting model across a collection of CSV datasets, with
//! per-epoch validation, early stopping, learning-rate scheduling and a test
//! pass that writes NumPy artifacts.
//!
//! ## Architecture
//!
//! - **autograd**: Tape-based automatic differentiation over flat tensors
//! - **optim**: Optimizers (SGD, Adam), LR schedules, gradient scaling
//! - **data**: CSV datasets, standardization, batching
//! - **model**: The `Forecaster` seam and a linear reference model
//! - **train**: Experiment driver, early stopping, losses and metrics
//! - **io**: SafeTensors checkpoints and `.npy` result artifacts
//! - **viz**: Text plots of test results
//! - **config**: Declarative YAML configuration and CLI arguments

pub mod autograd;
pub mod config;
pub mod data;
pub mod io;
pub mod logging;
pub mod model;
pub mod optim;
pub mod train;
pub mod viz;

pub mod error;

// Re-export commonly used types
pub use autograd::{backward, Tensor};
pub use error::{Error, Result};
