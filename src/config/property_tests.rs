//! Property tests for the experiment schema

#[cfg(test)]
mod tests {
    use crate::config::schema::*;
    use crate::config::validate::{validate_config, ValidationError};
    use crate::data::Features;
    use crate::optim::LrAdjust;
    use crate::train::{LossKind, OptimizerKind};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn arb_name() -> impl Strategy<Value = String> {
        prop::string::string_regex("[A-Za-z][A-Za-z0-9]{0,10}").unwrap()
    }

    fn arb_features() -> impl Strategy<Value = Features> {
        prop_oneof![Just(Features::M), Just(Features::S), Just(Features::MS)]
    }

    fn arb_lradj() -> impl Strategy<Value = LrAdjust> {
        prop_oneof![
            Just(LrAdjust::Type1),
            Just(LrAdjust::Type2),
            Just(LrAdjust::Step),
            Just(LrAdjust::Cosine),
            Just(LrAdjust::Constant),
        ]
    }

    fn arb_data_spec() -> impl Strategy<Value = DataSpec> {
        (arb_name(), arb_features(), 1usize..512, 0usize..512, 1usize..256, 1usize..128)
            .prop_map(|(name, features, seq_len, label_len, pred_len, batch_size)| DataSpec {
                name,
                root_path: PathBuf::from("."),
                files: Vec::new(),
                target: "OT".to_string(),
                date_column: Some("date".to_string()),
                features,
                seq_len,
                label_len: label_len.min(seq_len),
                pred_len,
                batch_size,
                scale: true,
                seed: 2021,
            })
    }

    fn arb_spec() -> impl Strategy<Value = ExperimentSpec> {
        (
            arb_data_spec(),
            prop_oneof![Just(OptimizerKind::Adam), Just(OptimizerKind::Sgd)],
            1e-6f32..1.0,
            arb_lradj(),
            1usize..50,
            1usize..10,
            1usize..5,
            prop_oneof![Just(LossKind::Mse), Just(LossKind::Mae)],
        )
            .prop_map(|(data, name, lr, lradj, epochs, patience, itr, loss)| ExperimentSpec {
                data,
                model: ModelSpec::default(),
                optimizer: OptimSpec {
                    name,
                    lr,
                    momentum: 0.0,
                },
                training: TrainingParams {
                    epochs,
                    patience,
                    lradj,
                    loss,
                    ..TrainingParams::default()
                },
                output: OutputSpec::default(),
                experiment: ExperimentMeta {
                    des: "Exp".to_string(),
                    itr,
                },
            })
    }

    proptest! {
        #[test]
        fn prop_yaml_roundtrip(spec in arb_spec()) {
            let yaml = serde_yaml::to_string(&spec).unwrap();
            let back: ExperimentSpec = serde_yaml::from_str(&yaml).unwrap();
            prop_assert_eq!(spec, back);
        }

        #[test]
        fn prop_generated_specs_validate(spec in arb_spec()) {
            prop_assert_eq!(validate_config(&spec), Ok(()));
        }

        #[test]
        fn prop_run_config_mirrors_spec(spec in arb_spec()) {
            let run = spec.run_config();
            prop_assert!(run.validate().is_ok());
            prop_assert_eq!(run.train_epochs, spec.training.epochs);
            prop_assert_eq!(run.pred_len, spec.data.pred_len);
            prop_assert_eq!(run.learning_rate, spec.optimizer.lr);
        }

        #[test]
        fn prop_settings_are_distinct_per_iteration(spec in arb_spec(), a in 0usize..10, b in 0usize..10) {
            prop_assume!(a != b);
            prop_assert_ne!(spec.setting(a), spec.setting(b));
            let expected_suffix = format!("_{a}");
            prop_assert!(spec.setting(a).ends_with(&expected_suffix));
        }

        #[test]
        fn prop_zero_batch_rejected(spec in arb_spec()) {
            let mut spec = spec;
            spec.data.batch_size = 0;
            prop_assert_eq!(validate_config(&spec), Err(ValidationError::InvalidBatchSize(0)));
        }
    }
}
