//! End-to-end runs over real CSV files: YAML in, checkpoints and `.npy` out.

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array3};
use ndarray_npy::read_npy;
use pronostico::config::{build_experiment, build_model, load_config, train_from_spec, ExperimentSpec};
use pronostico::data::{DataProvider, Split};
use pronostico::io::read_state;
use pronostico::model::Forecaster;
use pronostico::train::MSELoss;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const ROWS: usize = 200;

fn write_series(dir: &Path, name: &str, phase: f32) {
    let mut f = fs::File::create(dir.join(name)).unwrap();
    writeln!(f, "date,a,b,OT").unwrap();
    for i in 0..ROWS {
        let t = i as f32 * 0.2 + phase;
        writeln!(
            f,
            "2021-01-{:02} {:02}:00,{},{},{}",
            1 + i / 24,
            i % 24,
            t.sin(),
            (0.5 * t).cos() * 2.0,
            10.0 + 3.0 * t.sin() + 0.1 * i as f32
        )
        .unwrap();
    }
}

fn setup(files: &[&str]) -> (TempDir, ExperimentSpec) {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    write_series(&data, "north.csv", 0.0);
    write_series(&data, "south.csv", 1.3);

    let files = files
        .iter()
        .map(|f| format!("\"{f}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let yaml = format!(
        r#"
data:
  name: grid
  root_path: {root}
  files: [{files}]
  seq_len: 16
  label_len: 8
  pred_len: 4
  batch_size: 8
model:
  name: linear
  seed: 7
optimizer:
  name: adam
  lr: 0.005
training:
  epochs: 2
  patience: 3
  lradj: type1
output:
  checkpoints: {root_out}/checkpoints
  results: {root_out}/results
  plot: true
experiment:
  des: e2e
  itr: 1
"#,
        root = data.display(),
        root_out = dir.path().display(),
    );
    let config = dir.path().join("config.yaml");
    fs::write(&config, yaml).unwrap();
    let spec = load_config(&config).unwrap();
    (dir, spec)
}

#[test]
fn test_two_files_write_aggregate_and_per_file_artifacts() {
    let (dir, spec) = setup(&["north.csv", "south.csv"]);
    let summaries = train_from_spec(&spec, false).unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.setting, "linear_grid_ftM_sl16_ll8_pl4_e2e_0");
    assert_eq!(summary.train.history.len(), 2);
    assert!(summary.train.best_vali_loss.is_finite());

    let results = dir.path().join("results").join(&summary.setting);
    for name in [
        "metrics.npy",
        "pred.npy",
        "true.npy",
        "north_metrics.npy",
        "north_pred.npy",
        "north_true.npy",
        "south_metrics.npy",
        "south_pred.npy",
        "south_true.npy",
        "volatility_values_distribution.txt",
    ] {
        assert!(results.join(name).exists(), "missing {name}");
    }

    // 56 test rows -> 37 windows -> 4 full batches of 8 per file
    let north: Array3<f32> = read_npy(results.join("north_pred.npy")).unwrap();
    assert_eq!(north.shape(), &[32, 4, 3]);
    // pooled aggregate keeps only the target channel
    let pred: Array3<f32> = read_npy(results.join("pred.npy")).unwrap();
    let truth: Array3<f32> = read_npy(results.join("true.npy")).unwrap();
    assert_eq!(pred.shape(), &[64, 4, 1]);
    assert_eq!(truth.shape(), pred.shape());

    // truths are back on the original scale of OT (roughly 10..40)
    assert!(truth.iter().all(|v| *v > 5.0 && *v < 40.0));

    let metrics: Array1<f32> = read_npy(results.join("metrics.npy")).unwrap();
    let reported = summary.test.as_ref().unwrap();
    assert_eq!(metrics.len(), 5);
    assert_abs_diff_eq!(metrics[0], reported.mae, epsilon = 1e-5);
    assert_abs_diff_eq!(metrics[1], reported.mse, epsilon = 1e-4);

    let history = dir
        .path()
        .join("checkpoints")
        .join(&summary.setting)
        .join("history.json");
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(history).unwrap()).unwrap();
    assert_eq!(json["epochs"].as_array().unwrap().len(), 2);
}

#[test]
fn test_checkpoint_reproduces_predictions_in_fresh_model() {
    let (_dir, spec) = setup(&["north.csv"]);
    let setting = spec.setting(0);
    let mut exp = build_experiment(&spec, 0).unwrap();
    exp.train(&setting).unwrap();

    let state = read_state(&exp.checkpoint_path(&setting)).unwrap();
    assert_eq!(state.architecture, "linear");

    // a different iteration index gives a different initialization
    let mut fresh = build_model(&spec, 3).unwrap();
    fresh.load_state_dict(&state).unwrap();

    let (_, loader) = exp.provider().get_data("north.csv", Split::Test).unwrap();
    for batch in loader.iter() {
        let want = exp.model().predict(batch).unwrap();
        let got = fresh.predict(batch).unwrap();
        assert_eq!(want, got);
    }
}

#[test]
fn test_validation_is_invariant_to_file_order() {
    let (_a, forward) = setup(&["north.csv", "south.csv"]);
    let (_b, backward) = setup(&["south.csv", "north.csv"]);

    let exp_f = build_experiment(&forward, 0).unwrap();
    let exp_b = build_experiment(&backward, 0).unwrap();
    let (loss_f, metrics_f) = exp_f.vali(Split::Val, &MSELoss).unwrap();
    let (loss_b, metrics_b) = exp_b.vali(Split::Val, &MSELoss).unwrap();

    assert_abs_diff_eq!(loss_f, loss_b, epsilon = 1e-5);
    assert_abs_diff_eq!(metrics_f.mse, metrics_b.mse, epsilon = 1e-5);
    assert_abs_diff_eq!(metrics_f.mae, metrics_b.mae, epsilon = 1e-5);
}

#[test]
fn test_single_iteration_test_reloads_checkpoint() {
    let (dir, spec) = setup(&["north.csv"]);
    let summaries = train_from_spec(&spec, true).unwrap();
    assert!(summaries[0].test.is_none());
    assert!(!dir.path().join("results").exists());

    let metrics = pronostico::config::test_from_spec(&spec, 0).unwrap();
    assert!(metrics.mse.is_finite());
    let results = dir.path().join("results").join(spec.setting(0));
    assert!(results.join("pred.npy").exists());
    assert!(!results.join("north_pred.npy").exists());
}
