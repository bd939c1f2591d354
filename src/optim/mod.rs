//! Optimizers, learning-rate schedules and loss scaling

mod adam;
mod optimizer;
mod scaler;
mod scheduler;
mod sgd;

pub use adam::Adam;
pub use optimizer::Optimizer;
pub use scaler::GradScaler;
pub use scheduler::{apply_schedule, LrAdjust, LrSchedule};
pub use sgd::SGD;
