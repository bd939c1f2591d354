//! Text histograms comparing truth and prediction value distributions

use ndarray::ArrayView1;

/// Histogram layout
#[derive(Debug, Clone, Copy)]
pub struct HistogramConfig {
    pub bins: usize,
    /// Longest bar, in characters
    pub width: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self { bins: 12, width: 40 }
    }
}

/// Side-by-side histograms of `trues` and `preds` over a shared value range
pub fn plot_values_distribution(trues: ArrayView1<'_, f32>, preds: ArrayView1<'_, f32>) -> String {
    render_histogram(trues, preds, HistogramConfig::default())
}

pub fn render_histogram(
    trues: ArrayView1<'_, f32>,
    preds: ArrayView1<'_, f32>,
    config: HistogramConfig,
) -> String {
    let finite = trues.iter().chain(preds.iter()).copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return "  (no finite values)\n".to_string();
    }

    let bins = config.bins.max(1);
    let true_counts = counts(trues, min, max, bins);
    let pred_counts = counts(preds, min, max, bins);
    let peak = true_counts
        .iter()
        .chain(pred_counts.iter())
        .copied()
        .max()
        .unwrap_or(0)
        .max(1);
    let bar = |n: usize| n * config.width / peak;
    let step = (max - min) / bins as f32;

    let mut out = format!(
        "  range [{min:.4}, {max:.4}]  n_true={} n_pred={}\n",
        trues.len(),
        preds.len()
    );
    for b in 0..bins {
        let lo = min + step * b as f32;
        out.push_str(&format!(
            "  {lo:>10.4} | true {:<w$} {:>5}\n",
            "#".repeat(bar(true_counts[b])),
            true_counts[b],
            w = config.width
        ));
        out.push_str(&format!(
            "  {:>10} | pred {:<w$} {:>5}\n",
            "",
            "=".repeat(bar(pred_counts[b])),
            pred_counts[b],
            w = config.width
        ));
    }
    out
}

fn counts(values: ArrayView1<'_, f32>, min: f32, max: f32, bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    let range = max - min;
    for &v in values.iter().filter(|v| v.is_finite()) {
        let idx = if range == 0.0 {
            0
        } else {
            (((v - min) / range) * bins as f32) as usize
        };
        counts[idx.min(bins - 1)] += 1;
    }
    counts
}
