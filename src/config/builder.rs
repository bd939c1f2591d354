//! Build experiment components from configuration

use super::schema::ExperimentSpec;
use crate::data::CsvProvider;
use crate::error::{Error, Result};
use crate::model::LinearForecaster;
use crate::train::Experiment;

/// The data provider every iteration reads from
pub fn build_provider(spec: &ExperimentSpec) -> Result<CsvProvider> {
    CsvProvider::new(spec.data_settings())
}

/// A freshly initialized model for iteration `ii`
pub fn build_model(spec: &ExperimentSpec, ii: usize) -> Result<LinearForecaster> {
    match spec.model.name.as_str() {
        "linear" => LinearForecaster::new(
            spec.data.seq_len,
            spec.data.pred_len,
            spec.data.features,
            spec.model.seed.wrapping_add(ii as u64),
        ),
        name => Err(Error::ConfigError(format!(
            "Unknown model: {name}. Supported: linear"
        ))),
    }
}

/// Experiment for iteration `ii`: fresh model, fresh provider
pub fn build_experiment(
    spec: &ExperimentSpec,
    ii: usize,
) -> Result<Experiment<CsvProvider, LinearForecaster>> {
    Experiment::new(spec.run_config(), build_provider(spec)?, build_model(spec, ii)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataProvider;
    use crate::model::Forecaster;

    fn spec() -> ExperimentSpec {
        serde_yaml::from_str("data:\n  root_path: .\n  files: [a.csv]\n  seq_len: 8\n  label_len: 4\n  pred_len: 2\n").unwrap()
    }

    #[test]
    fn test_build_model_geometry() {
        let model = build_model(&spec(), 0).unwrap();
        assert_eq!(model.seq_len(), 8);
        assert_eq!(model.pred_len(), 2);
        assert_eq!(model.param_specs()[0].shape, vec![8, 2]);
    }

    #[test]
    fn test_iterations_get_distinct_initialization() {
        let a = build_model(&spec(), 0).unwrap();
        let b = build_model(&spec(), 1).unwrap();
        assert_ne!(a.params()[0].data(), b.params()[0].data());
        let again = build_model(&spec(), 0).unwrap();
        assert_eq!(a.params()[0].data(), again.params()[0].data());
    }

    #[test]
    fn test_unknown_model() {
        let mut s = spec();
        s.model.name = "transformer".into();
        assert!(matches!(build_model(&s, 0), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_build_experiment_uses_listed_files() {
        let exp = build_experiment(&spec(), 0).unwrap();
        assert_eq!(exp.provider().file_names(), ["a.csv".to_string()]);
        assert_eq!(exp.config().pred_len, 2);
    }
}
