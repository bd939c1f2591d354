//! Named parameter snapshots

use crate::{Error, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version tag written into every checkpoint
pub const FORMAT_VERSION: &str = "1";

/// Name and logical shape of one trainable parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub shape: Vec<usize>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, shape: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Ordered `name -> values` mapping plus the architecture that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct StateDict {
    pub architecture: String,
    pub entries: Vec<(ParamSpec, Array1<f32>)>,
}

impl StateDict {
    pub fn new(architecture: impl Into<String>) -> Self {
        Self {
            architecture: architecture.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, spec: ParamSpec, values: Array1<f32>) {
        self.entries.push((spec, values));
    }

    pub fn get(&self, name: &str) -> Option<&Array1<f32>> {
        self.entries
            .iter()
            .find(|(spec, _)| spec.name == name)
            .map(|(_, values)| values)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values for each of `specs`, in that order, checking shapes.
    ///
    /// Extra entries are ignored; a missing name or a size mismatch is an
    /// error and nothing is returned.
    pub fn take_matching(&self, specs: &[ParamSpec]) -> Result<Vec<Array1<f32>>> {
        let by_name: HashMap<&str, (&ParamSpec, &Array1<f32>)> = self
            .entries
            .iter()
            .map(|(spec, values)| (spec.name.as_str(), (spec, values)))
            .collect();

        specs
            .iter()
            .map(|want| {
                let (have, values) = by_name.get(want.name.as_str()).ok_or_else(|| {
                    Error::Serialization(format!("checkpoint is missing parameter '{}'", want.name))
                })?;
                if values.len() != want.numel() || have.numel() != want.numel() {
                    return Err(Error::ShapeMismatch {
                        expected: want.shape.clone(),
                        got: have.shape.clone(),
                    });
                }
                Ok((*values).clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateDict {
        let mut state = StateDict::new("linear");
        state.push(ParamSpec::new("w", vec![2, 2]), Array1::from(vec![1.0, 2.0, 3.0, 4.0]));
        state.push(ParamSpec::new("b", vec![2]), Array1::from(vec![0.5, 0.5]));
        state
    }

    #[test]
    fn test_take_matching_reorders_by_spec() {
        let specs = vec![ParamSpec::new("b", vec![2]), ParamSpec::new("w", vec![2, 2])];
        let values = sample().take_matching(&specs).unwrap();
        assert_eq!(values[0].to_vec(), vec![0.5, 0.5]);
        assert_eq!(values[1].len(), 4);
    }

    #[test]
    fn test_missing_name() {
        let specs = vec![ParamSpec::new("gamma", vec![2])];
        assert!(matches!(
            sample().take_matching(&specs),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let specs = vec![ParamSpec::new("w", vec![3, 2])];
        assert!(matches!(
            sample().take_matching(&specs),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
