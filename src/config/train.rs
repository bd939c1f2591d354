//! Running experiments from YAML configuration

use super::builder::build_experiment;
use super::schema::ExperimentSpec;
use super::validate::validate_config;
use crate::error::{Error, Result};
use crate::train::{Metrics, TrainResult};
use std::fs;
use std::path::Path;
use tracing::info;

/// What one iteration produced
#[derive(Debug, Clone)]
pub struct IterationSummary {
    pub setting: String,
    pub train: TrainResult,
    /// `None` when testing was skipped
    pub test: Option<Metrics>,
}

/// Load, parse and validate an experiment file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<ExperimentSpec> {
    let path = config_path.as_ref();
    let yaml_content = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    let spec: ExperimentSpec = serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))?;

    validate_config(&spec)?;
    Ok(spec)
}

/// Train every iteration of `spec`, testing each unless `skip_test`.
///
/// Each iteration starts from a freshly initialized model and writes under
/// its own setting.
pub fn train_from_spec(spec: &ExperimentSpec, skip_test: bool) -> Result<Vec<IterationSummary>> {
    validate_config(spec)?;
    let mut summaries = Vec::with_capacity(spec.experiment.itr);

    for ii in 0..spec.experiment.itr {
        let setting = spec.setting(ii);
        let mut exp = build_experiment(spec, ii)?;

        info!(setting = %setting, "start training");
        let train = exp.train(&setting)?;

        let test = if skip_test {
            None
        } else {
            info!(setting = %setting, "testing");
            Some(exp.test(&setting, false, spec.output.plot)?)
        };
        summaries.push(IterationSummary {
            setting,
            train,
            test,
        });
    }
    Ok(summaries)
}

/// Test iteration `ii` from its saved checkpoint
pub fn test_from_spec(spec: &ExperimentSpec, ii: usize) -> Result<Metrics> {
    validate_config(spec)?;
    let setting = spec.setting(ii);
    let mut exp = build_experiment(spec, ii)?;
    info!(setting = %setting, "testing");
    exp.test(&setting, true, spec.output.plot)
}

/// Load `config_path` and train it
pub fn train_from_yaml<P: AsRef<Path>>(config_path: P) -> Result<Vec<IterationSummary>> {
    let spec = load_config(config_path)?;
    train_from_spec(&spec, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_load_bad_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"data: [unterminated").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_load_runs_validation() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"data:\n  root_path: /definitely/not/here\n").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigError(m) if m.contains("does not exist")));
    }
}
