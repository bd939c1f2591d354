//! Persistence: model checkpoints and test artifacts
//!
//! Checkpoints hold a [`StateDict`] in SafeTensors encoding under the
//! conventional `checkpoint.pth` name. Test results are NumPy `.npy` arrays.

mod artifacts;
mod checkpoint;
mod state;

pub use artifacts::{file_stem, ResultWriter};
pub use checkpoint::{checkpoint_path, read_state, write_state, CHECKPOINT_FILE};
pub use state::{ParamSpec, StateDict, FORMAT_VERSION};
