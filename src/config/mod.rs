//! Declarative YAML configuration
//!
//! # Example
//!
//! ```yaml
//! data:
//!   name: ETTh1
//!   root_path: ./dataset/ETT
//!   target: OT
//!   features: M
//!   seq_len: 96
//!   label_len: 48
//!   pred_len: 24
//!
//! optimizer:
//!   name: adam
//!   lr: 1e-4
//!
//! training:
//!   epochs: 10
//!   patience: 3
//!   lradj: type1
//!
//! experiment:
//!   des: Exp
//!   itr: 2
//! ```

mod builder;
mod cli;
mod schema;
mod train;
mod validate;

#[cfg(test)]
mod property_tests;

pub use builder::{build_experiment, build_model, build_provider};
pub use cli::{apply_overrides, parse_args, Cli, Command, TestArgs, TrainArgs, ValidateArgs};
pub use schema::{
    DataSpec, ExperimentMeta, ExperimentSpec, ModelSpec, OptimSpec, OutputSpec, TrainingParams,
};
pub use train::{load_config, test_from_spec, train_from_spec, train_from_yaml, IterationSummary};
pub use validate::{validate_config, ValidationError};
