//! Text plots of test results
//!
//! Plots are rendered as plain text and saved next to the `.npy` artifacts
//! so they can be read over SSH without a plotting stack.

mod distribution;

pub use distribution::{plot_values_distribution, render_histogram, HistogramConfig};

use crate::{Error, Result};
use ndarray::{s, Array3, ArrayView1};
use std::path::{Path, PathBuf};

/// Renders one panel from truth and prediction series
pub type PlotFn = fn(ArrayView1<'_, f32>, ArrayView1<'_, f32>) -> String;

/// Groups a horizon-1 result is folded into before plotting
pub const PLOT_GROUPS: usize = 120;

/// Panels drawn for a horizon-1 result
pub const SINGLE_STEP_PANELS: usize = 6;

/// One named figure: a feature rendered panel by panel
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub name: String,
    pub panels: Vec<String>,
}

impl Figure {
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, panel) in self.panels.iter().enumerate() {
            out.push_str(&format!("{} [{}]\n", self.name, i));
            out.push_str(panel);
            out.push('\n');
        }
        out
    }

    /// Write to `<dir>/<name>_<kind>.txt`
    pub fn save(&self, dir: &Path, kind: &str) -> Result<PathBuf> {
        let path = dir.join(format!("{}_{kind}.txt", self.name));
        std::fs::write(&path, self.render())?;
        Ok(path)
    }
}

/// Apply `plot_fn` to `panels` slices along axis 1 for each named feature.
///
/// `trues` and `preds` are `[samples, steps, channels]`; panel `i` of feature
/// `f` plots column `[.., i, f]`.
pub fn map_plot_function(
    trues: &Array3<f32>,
    preds: &Array3<f32>,
    plot_fn: PlotFn,
    names: &[&str],
    features: &[usize],
    panels: usize,
) -> Result<Vec<Figure>> {
    if trues.shape() != preds.shape() {
        return Err(Error::ShapeMismatch {
            expected: trues.shape().to_vec(),
            got: preds.shape().to_vec(),
        });
    }
    let (_, steps, channels) = trues.dim();
    if panels > steps {
        return Err(Error::InvalidParameter(format!(
            "{panels} panels requested but only {steps} steps"
        )));
    }

    names
        .iter()
        .zip(features)
        .map(|(&name, &feature)| {
            if feature >= channels {
                return Err(Error::InvalidParameter(format!(
                    "feature {feature} out of range for {channels} channels"
                )));
            }
            let panels = (0..panels)
                .map(|i| {
                    plot_fn(
                        trues.slice(s![.., i, feature]),
                        preds.slice(s![.., i, feature]),
                    )
                })
                .collect();
            Ok(Figure {
                name: name.to_string(),
                panels,
            })
        })
        .collect()
}

/// Fold `[n, 1, 1]` results into `(groups, n / groups, 1)`
pub fn group_for_plot(data: &Array3<f32>, groups: usize) -> Result<Array3<f32>> {
    let n = data.len();
    if groups == 0 || n == 0 || n % groups != 0 {
        return Err(Error::Reshape(format!(
            "{n} values cannot be split into {groups} equal groups"
        )));
    }
    Array3::from_shape_vec((groups, n / groups, 1), data.iter().copied().collect())
        .map_err(|e| Error::Reshape(e.to_string()))
}

/// Value-distribution plots for pooled test results, saved into `dir`.
///
/// Multi-step horizons get one panel per step. A single-step horizon is first
/// folded into [`PLOT_GROUPS`] groups and plotted over at most
/// [`SINGLE_STEP_PANELS`] of them.
pub fn plot_test_results(
    trues: &Array3<f32>,
    preds: &Array3<f32>,
    pred_len: usize,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let figures = if pred_len > 1 {
        map_plot_function(
            trues,
            preds,
            plot_values_distribution,
            &["volatility"],
            &[0],
            pred_len,
        )?
    } else {
        let trues = group_for_plot(trues, PLOT_GROUPS)?;
        let preds = group_for_plot(preds, PLOT_GROUPS)?;
        let panels = SINGLE_STEP_PANELS.min(trues.shape()[1]);
        map_plot_function(
            &trues,
            &preds,
            plot_values_distribution,
            &["volatility"],
            &[0],
            panels,
        )?
    };

    let paths = figures
        .iter()
        .map(|f| f.save(dir, "values_distribution"))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(count = paths.len(), dir = %dir.display(), "Saved plots");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_group_600_into_120_by_5() {
        let data = Array3::from_shape_fn((600, 1, 1), |(i, _, _)| i as f32);
        let grouped = group_for_plot(&data, PLOT_GROUPS).unwrap();
        assert_eq!(grouped.dim(), (120, 5, 1));
        assert_eq!(grouped[[1, 0, 0]], 5.0);
    }

    #[test]
    fn test_group_601_is_rejected() {
        let data = Array3::zeros((601, 1, 1));
        assert!(matches!(
            group_for_plot(&data, PLOT_GROUPS),
            Err(Error::Reshape(_))
        ));
    }

    #[test]
    fn test_map_plot_function_panels() {
        let t = Array3::from_shape_fn((8, 3, 2), |(i, j, k)| (i + j + k) as f32);
        let figures = map_plot_function(&t, &t, plot_values_distribution, &["a", "b"], &[0, 1], 3)
            .unwrap();
        assert_eq!(figures.len(), 2);
        assert_eq!(figures[1].name, "b");
        assert_eq!(figures[0].panels.len(), 3);
    }

    #[test]
    fn test_map_plot_function_rejects_bad_requests() {
        let t = Array3::zeros((4, 2, 1));
        assert!(map_plot_function(&t, &t, plot_values_distribution, &["a"], &[0], 3).is_err());
        assert!(map_plot_function(&t, &t, plot_values_distribution, &["a"], &[1], 1).is_err());
        let other = Array3::zeros((4, 2, 2));
        assert!(map_plot_function(&t, &other, plot_values_distribution, &["a"], &[0], 1).is_err());
    }

    #[test]
    fn test_plot_test_results_writes_file() {
        let dir = TempDir::new().unwrap();
        let t = Array3::from_shape_fn((10, 4, 1), |(i, j, _)| (i * j) as f32);
        let paths = plot_test_results(&t, &t, 4, dir.path()).unwrap();
        assert_eq!(paths, vec![dir.path().join("volatility_values_distribution.txt")]);
        let text = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(text.contains("volatility [3]"));
    }

    #[test]
    fn test_single_step_needs_multiple_of_120() {
        let dir = TempDir::new().unwrap();
        let ok = Array3::zeros((240, 1, 1));
        assert!(plot_test_results(&ok, &ok, 1, dir.path()).is_ok());
        let bad = Array3::zeros((241, 1, 1));
        assert!(matches!(
            plot_test_results(&bad, &bad, 1, dir.path()),
            Err(Error::Reshape(_))
        ));
    }
}
