//! Training, validation and test orchestration
//!
//! [`Experiment`] drives a [`Forecaster`](crate::model::Forecaster) over all
//! files of a [`DataProvider`](crate::data::DataProvider):
//! - epochs of per-file, per-batch gradient steps
//! - validation at every epoch boundary feeding [`EarlyStopping`]
//! - learning-rate scheduling between epochs
//! - a test pass writing `.npy` artifacts and plots
//!
//! # Example
//!
//! ```no_run
//! use pronostico::data::{CsvProvider, DataSettings, Features};
//! use pronostico::model::LinearForecaster;
//! use pronostico::train::{Experiment, RunConfig};
//!
//! # fn main() -> pronostico::Result<()> {
//! let settings = DataSettings::new("./dataset", "OT");
//! let model = LinearForecaster::new(settings.seq_len, settings.pred_len, Features::M, 2021)?;
//! let config = RunConfig::new("./checkpoints", "./results").with_pred_len(settings.pred_len);
//!
//! let mut exp = Experiment::new(config, CsvProvider::new(settings)?, model)?;
//! let result = exp.train("linear_run_0")?;
//! println!("best vali loss {:.4}", result.best_vali_loss);
//! exp.test("linear_run_0", false, true)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod early_stopping;
mod evaluate;
mod experiment;
mod history;
mod loss;
mod metrics;

pub use config::{OptimizerKind, RunConfig, DEFAULT_LOG_INTERVAL};
pub use early_stopping::{EarlyStopping, Verdict};
pub use evaluate::{evaluate, EvalOutput};
pub use experiment::Experiment;
pub use history::{EpochRecord, MetricsTracker, TrainResult};
pub use loss::{L1Loss, LossFn, LossKind, MSELoss};
pub use metrics::{metric, Metrics};
