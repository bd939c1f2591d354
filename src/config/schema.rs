//! YAML schema for experiment configuration

use crate::data::{DataSettings, Features};
use crate::optim::LrAdjust;
use crate::train::{LossKind, OptimizerKind, RunConfig, DEFAULT_LOG_INTERVAL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete experiment specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    /// Where the files are and how they are windowed
    pub data: DataSpec,

    #[serde(default)]
    pub model: ModelSpec,

    #[serde(default)]
    pub optimizer: OptimSpec,

    #[serde(default)]
    pub training: TrainingParams,

    #[serde(default)]
    pub output: OutputSpec,

    #[serde(default)]
    pub experiment: ExperimentMeta,
}

/// Data configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    /// Short dataset name used in the run identifier
    #[serde(default = "default_data_name")]
    pub name: String,

    /// Directory holding the CSV files
    pub root_path: PathBuf,

    /// Explicit file list; empty means every `*.csv` in `root_path`
    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default = "default_target")]
    pub target: String,

    /// Non-numeric column to drop, usually the timestamp
    #[serde(default = "default_date_column")]
    pub date_column: Option<String>,

    #[serde(default)]
    pub features: Features,

    #[serde(default = "default_seq_len")]
    pub seq_len: usize,

    #[serde(default = "default_label_len")]
    pub label_len: usize,

    #[serde(default = "default_pred_len")]
    pub pred_len: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Standardize with train-region statistics
    #[serde(default = "default_true")]
    pub scale: bool,

    /// Seed for shuffling training batches
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Architecture name; `linear` is the only one built in
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Initialization seed; iteration `i` uses `seed + i`
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            seed: default_seed(),
        }
    }
}

/// Optimizer specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimSpec {
    #[serde(default)]
    pub name: OptimizerKind,

    #[serde(default = "default_lr")]
    pub lr: f32,

    /// SGD momentum
    #[serde(default)]
    pub momentum: f32,
}

impl Default for OptimSpec {
    fn default() -> Self {
        Self {
            name: OptimizerKind::default(),
            lr: default_lr(),
            momentum: 0.0,
        }
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Early-stopping patience in epochs
    #[serde(default = "default_patience")]
    pub patience: usize,

    /// Minimum validation-loss improvement
    #[serde(default)]
    pub delta: f32,

    /// Learning-rate adjustment policy
    #[serde(default)]
    pub lradj: LrAdjust,

    #[serde(default = "default_step_size")]
    pub lr_step_size: usize,

    #[serde(default = "default_gamma")]
    pub lr_gamma: f32,

    #[serde(default)]
    pub min_lr: f32,

    /// Mixed precision (dynamic loss scaling)
    #[serde(default)]
    pub use_amp: bool,

    #[serde(default)]
    pub loss: LossKind,

    #[serde(default = "default_log_interval")]
    pub log_interval: usize,

    /// Continue from an existing checkpoint
    #[serde(default)]
    pub resume: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            patience: default_patience(),
            delta: 0.0,
            lradj: LrAdjust::default(),
            lr_step_size: default_step_size(),
            lr_gamma: default_gamma(),
            min_lr: 0.0,
            use_amp: false,
            loss: LossKind::default(),
            log_interval: default_log_interval(),
            resume: false,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(default = "default_checkpoints")]
    pub checkpoints: PathBuf,

    #[serde(default = "default_results")]
    pub results: PathBuf,

    /// Write value-distribution plots after testing
    #[serde(default = "default_true")]
    pub plot: bool,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            checkpoints: default_checkpoints(),
            results: default_results(),
            plot: true,
        }
    }
}

/// Run naming and repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMeta {
    /// Free-form description in the run identifier
    #[serde(default = "default_des")]
    pub des: String,

    /// Independent repetitions
    #[serde(default = "default_itr")]
    pub itr: usize,
}

impl Default for ExperimentMeta {
    fn default() -> Self {
        Self {
            des: default_des(),
            itr: default_itr(),
        }
    }
}

impl ExperimentSpec {
    /// Run identifier of iteration `ii`
    pub fn setting(&self, ii: usize) -> String {
        let d = &self.data;
        format!(
            "{}_{}_ft{}_sl{}_ll{}_pl{}_{}_{}",
            self.model.name,
            d.name,
            d.features.as_str(),
            d.seq_len,
            d.label_len,
            d.pred_len,
            self.experiment.des,
            ii
        )
    }

    pub fn data_settings(&self) -> DataSettings {
        let d = &self.data;
        DataSettings {
            root_path: d.root_path.clone(),
            files: d.files.clone(),
            target: d.target.clone(),
            date_column: d.date_column.clone(),
            features: d.features,
            seq_len: d.seq_len,
            label_len: d.label_len,
            pred_len: d.pred_len,
            batch_size: d.batch_size,
            scale: d.scale,
            seed: d.seed,
        }
    }

    pub fn run_config(&self) -> RunConfig {
        let t = &self.training;
        RunConfig {
            checkpoints: self.output.checkpoints.clone(),
            results: self.output.results.clone(),
            resume: t.resume,
            patience: t.patience,
            delta: t.delta,
            train_epochs: t.epochs,
            learning_rate: self.optimizer.lr,
            lradj: t.lradj,
            lr_step_size: t.lr_step_size,
            lr_gamma: t.lr_gamma,
            min_lr: t.min_lr,
            use_amp: t.use_amp,
            pred_len: self.data.pred_len,
            log_interval: t.log_interval,
            loss: t.loss,
            optimizer: self.optimizer.name,
            momentum: self.optimizer.momentum,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_data_name() -> String {
    "custom".to_string()
}

fn default_target() -> String {
    "OT".to_string()
}

fn default_date_column() -> Option<String> {
    Some("date".to_string())
}

fn default_seq_len() -> usize {
    96
}

fn default_label_len() -> usize {
    48
}

fn default_pred_len() -> usize {
    24
}

fn default_batch_size() -> usize {
    32
}

fn default_seed() -> u64 {
    2021
}

fn default_model_name() -> String {
    "linear".to_string()
}

fn default_lr() -> f32 {
    1e-4
}

fn default_epochs() -> usize {
    10
}

fn default_patience() -> usize {
    3
}

fn default_step_size() -> usize {
    1
}

fn default_gamma() -> f32 {
    0.5
}

fn default_log_interval() -> usize {
    DEFAULT_LOG_INTERVAL
}

fn default_checkpoints() -> PathBuf {
    PathBuf::from("./checkpoints")
}

fn default_results() -> PathBuf {
    PathBuf::from("./results")
}

fn default_des() -> String {
    "Exp".to_string()
}

fn default_itr() -> usize {
    1
}
