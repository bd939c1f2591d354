//! Checkpoint persistence in SafeTensors encoding

use super::state::{ParamSpec, StateDict, FORMAT_VERSION};
use crate::{Error, Result};
use ndarray::Array1;
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the best-so-far snapshot inside a run directory
pub const CHECKPOINT_FILE: &str = "checkpoint.pth";

/// `<checkpoints>/<setting>/checkpoint.pth`
pub fn checkpoint_path(checkpoints: &Path, setting: &str) -> PathBuf {
    checkpoints.join(setting).join(CHECKPOINT_FILE)
}

/// Serialize a state dict, replacing any existing file
pub fn write_state(state: &StateDict, path: &Path) -> Result<()> {
    let encoded: Vec<(&str, Vec<u8>, Vec<usize>)> = state
        .entries
        .iter()
        .map(|(spec, values)| {
            let bytes = match values.as_slice() {
                Some(slice) => bytemuck::cast_slice::<f32, u8>(slice).to_vec(),
                None => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            };
            (spec.name.as_str(), bytes, spec.shape.clone())
        })
        .collect();

    let views = encoded
        .iter()
        .map(|(name, bytes, shape)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (*name, view))
                .map_err(|e| Error::Serialization(format!("tensor '{name}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut metadata = HashMap::new();
    metadata.insert("architecture".to_string(), state.architecture.clone());
    metadata.insert("format_version".to_string(), FORMAT_VERSION.to_string());

    let bytes = safetensors::serialize(views, &Some(metadata))
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read a state dict written by [`write_state`]
pub fn read_state(path: &Path) -> Result<StateDict> {
    if !path.exists() {
        return Err(Error::MissingCheckpoint(path.to_path_buf()));
    }
    let data = std::fs::read(path)?;

    let (_, header) = SafeTensors::read_metadata(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;
    let architecture = header
        .metadata()
        .as_ref()
        .and_then(|m| m.get("architecture").cloned())
        .unwrap_or_else(|| "unknown".to_string());

    let tensors = SafeTensors::deserialize(&data)
        .map_err(|e| Error::Serialization(format!("SafeTensors parsing failed: {e}")))?;

    let mut state = StateDict::new(architecture);
    for (name, view) in tensors.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(Error::Serialization(format!(
                "tensor '{name}' has dtype {:?}, expected F32",
                view.dtype()
            )));
        }
        // the byte buffer is not guaranteed to be 4-byte aligned
        let values: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        state.push(ParamSpec::new(name, view.shape().to_vec()), Array1::from(values));
    }
    Ok(state)
}
