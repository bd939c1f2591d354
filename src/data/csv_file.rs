//! CSV-backed datasets
//!
//! Each file is a header row plus one row per time step. An optional date
//! column is dropped, the target column is moved last, and rows are split
//! chronologically: the first 70% train, the last 20% test, validation in
//! between. Validation and test borders start `seq_len` rows early so their
//! first window has a full look-back.

use super::{DataLoader, LoaderOptions, Split, StandardScaler, TimeSeriesDataset};
use crate::{Error, Result};
use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::{Path, PathBuf};

/// Which channels feed the model and which are forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Features {
    /// All channels in, all channels out
    #[default]
    M,
    /// Target channel only
    S,
    /// All channels in, target channel out
    MS,
}

impl Features {
    pub fn as_str(&self) -> &'static str {
        match self {
            Features::M => "M",
            Features::S => "S",
            Features::MS => "MS",
        }
    }
}

/// Window geometry and loading options shared by every file
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub root_path: PathBuf,
    pub files: Vec<String>,
    pub target: String,
    pub date_column: Option<String>,
    pub features: Features,
    pub seq_len: usize,
    pub label_len: usize,
    pub pred_len: usize,
    pub batch_size: usize,
    pub scale: bool,
    pub seed: u64,
}

impl DataSettings {
    /// Every `*.csv` under `root_path`, `date` column dropped, 96 -> 24 windows
    pub fn new(root_path: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            files: Vec::new(),
            target: target.into(),
            date_column: Some("date".to_string()),
            features: Features::M,
            seq_len: 96,
            label_len: 48,
            pred_len: 24,
            batch_size: 32,
            scale: true,
            seed: 2021,
        }
    }

    /// Reject geometries whose windows cannot be cut
    pub fn check_window(&self) -> Result<()> {
        if self.seq_len == 0 || self.pred_len == 0 || self.label_len > self.seq_len {
            return Err(Error::InvalidParameter(format!(
                "invalid window: seq_len={}, label_len={}, pred_len={} \
                 (need seq_len > 0, pred_len > 0, label_len <= seq_len)",
                self.seq_len, self.label_len, self.pred_len
            )));
        }
        Ok(())
    }
}

/// One file's split, normalized with statistics from the train region
#[derive(Debug, Clone)]
pub struct CsvDataset {
    /// Normalized rows covering the split plus its look-back
    data: Array2<f32>,
    scaler: Option<StandardScaler>,
    seq_len: usize,
    label_len: usize,
    pred_len: usize,
}

impl CsvDataset {
    /// Load `path` and cut out the rows for `split`
    pub fn load(path: &Path, settings: &DataSettings, split: Split) -> Result<Self> {
        let raw = read_table(path, settings)?;
        Self::from_rows(raw, settings, split)
    }

    /// Build from a raw `[rows, channels]` table already in model channel order
    pub fn from_rows(raw: Array2<f32>, settings: &DataSettings, split: Split) -> Result<Self> {
        settings.check_window()?;
        let rows = raw.nrows();
        let num_train = rows * 7 / 10;
        let num_test = rows * 2 / 10;
        let num_val = rows - num_train - num_test;
        let seq_len = settings.seq_len;

        let (border1, border2) = match split {
            Split::Train => (0, num_train),
            Split::Val => (num_train.saturating_sub(seq_len), num_train + num_val),
            Split::Test => ((rows - num_test).saturating_sub(seq_len), rows),
        };

        let scaler = if settings.scale {
            Some(StandardScaler::fit(&raw.slice(s![..num_train, ..]).to_owned())?)
        } else {
            None
        };
        let region = raw.slice(s![border1..border2, ..]).to_owned();
        let data = match &scaler {
            Some(scaler) => scaler.transform(&region),
            None => region,
        };

        Ok(Self {
            data,
            scaler,
            seq_len,
            label_len: settings.label_len,
            pred_len: settings.pred_len,
        })
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }
}

impl TimeSeriesDataset for CsvDataset {
    fn len(&self) -> usize {
        (self.rows() + 1).saturating_sub(self.seq_len + self.pred_len)
    }

    fn channels(&self) -> usize {
        self.data.ncols()
    }

    fn window(&self, index: usize) -> (Array2<f32>, Array2<f32>) {
        let s_end = index + self.seq_len;
        let r_begin = s_end - self.label_len;
        let r_end = r_begin + self.label_len + self.pred_len;
        (
            self.data.slice(s![index..s_end, ..]).to_owned(),
            self.data.slice(s![r_begin..r_end, ..]).to_owned(),
        )
    }

    fn inverse_transform(&self, data: &Array3<f32>) -> Result<Array3<f32>> {
        match &self.scaler {
            Some(scaler) => scaler.inverse_transform(data),
            None => Ok(data.clone()),
        }
    }
}

/// Parse a CSV file into `[rows, channels]` with the target last
fn read_table(path: &Path, settings: &DataSettings) -> Result<Array2<f32>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::Data(format!("{}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::Data(format!("{}: {e}", path.display())))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let target = headers
        .iter()
        .position(|h| *h == settings.target)
        .ok_or_else(|| {
            Error::Data(format!(
                "{}: target column '{}' not found",
                path.display(),
                settings.target
            ))
        })?;
    let date = settings
        .date_column
        .as_ref()
        .and_then(|d| headers.iter().position(|h| h == d));

    let columns: Vec<usize> = match settings.features {
        Features::S => vec![target],
        Features::M | Features::MS => (0..headers.len())
            .filter(|&i| i != target && Some(i) != date)
            .chain(std::iter::once(target))
            .collect(),
    };

    let mut values = Vec::new();
    let mut rows = 0;
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::Data(format!("{}: {e}", path.display())))?;
        for &col in &columns {
            let field = record.get(col).unwrap_or("").trim();
            let value: f32 = field.parse().map_err(|_| {
                Error::Data(format!(
                    "{}: row {}, column '{}': '{field}' is not a number",
                    path.display(),
                    line + 2,
                    headers[col]
                ))
            })?;
            values.push(value);
        }
        rows += 1;
    }

    Array2::from_shape_vec((rows, columns.len()), values)
        .map_err(|e| Error::Data(format!("{}: {e}", path.display())))
}

/// Serves one [`CsvDataset`] per file under `root_path`.
///
/// Shuffled training loaders draw a fresh seed on every request so that each
/// epoch sees a different order while the whole run stays reproducible.
#[derive(Debug)]
pub struct CsvProvider {
    settings: DataSettings,
    files: Vec<String>,
    requests: Cell<u64>,
}

impl CsvProvider {
    /// Use `settings.files`, or every `*.csv` in `root_path` sorted by name
    pub fn new(settings: DataSettings) -> Result<Self> {
        settings.check_window()?;
        let files = if settings.files.is_empty() {
            discover(&settings.root_path)?
        } else {
            settings.files.clone()
        };
        Ok(Self {
            settings,
            files,
            requests: Cell::new(0),
        })
    }

    pub fn settings(&self) -> &DataSettings {
        &self.settings
    }

    fn loader_options(&self, split: Split) -> LoaderOptions {
        let request = self.requests.get();
        self.requests.set(request + 1);
        LoaderOptions {
            batch_size: self.settings.batch_size,
            shuffle: split == Split::Train,
            drop_last: split != Split::Val,
            seed: self.settings.seed.wrapping_add(request),
        }
    }
}

impl super::DataProvider for CsvProvider {
    type Dataset = CsvDataset;

    fn file_names(&self) -> &[String] {
        &self.files
    }

    fn get_data(&self, file: &str, split: Split) -> Result<(CsvDataset, DataLoader)> {
        let path = self.settings.root_path.join(file);
        let dataset = CsvDataset::load(&path, &self.settings, split)?;
        let loader = DataLoader::from_dataset(&dataset, self.loader_options(split))?;
        tracing::debug!(file, %split, windows = dataset.len(), batches = loader.len(), "Loaded split");
        Ok((dataset, loader))
    }
}

fn discover(root: &Path) -> Result<Vec<String>> {
    let mut files: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "csv"))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataProvider;
    use std::io::Write;
    use tempfile::TempDir;

    fn settings(root: &Path, features: Features) -> DataSettings {
        DataSettings {
            root_path: root.to_path_buf(),
            files: Vec::new(),
            target: "OT".into(),
            date_column: Some("date".into()),
            features,
            seq_len: 4,
            label_len: 2,
            pred_len: 2,
            batch_size: 2,
            scale: true,
            seed: 1,
        }
    }

    fn write_csv(dir: &Path, name: &str, rows: usize) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        writeln!(f, "date,OT,load").unwrap();
        for i in 0..rows {
            writeln!(f, "2020-01-01 {i:02}:00,{},{}", i as f32, 100.0 + i as f32).unwrap();
        }
    }

    #[test]
    fn test_target_moves_last_and_date_dropped() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "a.csv", 10);
        let table = read_table(&dir.path().join("a.csv"), &settings(dir.path(), Features::M)).unwrap();
        assert_eq!(table.dim(), (10, 2));
        assert_eq!(table[[3, 0]], 103.0);
        assert_eq!(table[[3, 1]], 3.0);

        let single = read_table(&dir.path().join("a.csv"), &settings(dir.path(), Features::S)).unwrap();
        assert_eq!(single.dim(), (10, 1));
    }

    #[test]
    fn test_split_borders() {
        let s = settings(Path::new("."), Features::M);
        let raw = Array2::from_shape_fn((100, 1), |(i, _)| i as f32);
        let train = CsvDataset::from_rows(raw.clone(), &s, Split::Train).unwrap();
        let val = CsvDataset::from_rows(raw.clone(), &s, Split::Val).unwrap();
        let test = CsvDataset::from_rows(raw, &s, Split::Test).unwrap();
        assert_eq!(train.rows(), 70);
        // 10 validation rows plus 4 look-back rows
        assert_eq!(val.rows(), 14);
        assert_eq!(test.rows(), 24);
        // windows = rows - seq_len - pred_len + 1
        assert_eq!(test.len(), 19);
    }

    #[test]
    fn test_window_layout_and_inverse() {
        let mut s = settings(Path::new("."), Features::M);
        s.scale = false;
        let raw = Array2::from_shape_fn((20, 1), |(i, _)| i as f32);
        let ds = CsvDataset::from_rows(raw, &s, Split::Train).unwrap();
        let (x, y) = ds.window(1);
        assert_eq!(x.column(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
        // label overlaps the last two inputs, then two future steps
        assert_eq!(y.column(0).to_vec(), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_scaled_roundtrip_through_inverse() {
        let s = settings(Path::new("."), Features::M);
        let raw = Array2::from_shape_fn((30, 2), |(i, j)| (i * (j + 1)) as f32);
        let ds = CsvDataset::from_rows(raw, &s, Split::Train).unwrap();
        let (_, y) = ds.window(0);
        let restored = ds.inverse_transform(&y.insert_axis(ndarray::Axis(0))).unwrap();
        assert!((restored[[0, 3, 1]] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_provider_discovers_sorted_files() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "b.csv", 40);
        write_csv(dir.path(), "a.csv", 40);
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let provider = CsvProvider::new(settings(dir.path(), Features::MS)).unwrap();
        assert_eq!(provider.file_names(), &["a.csv".to_string(), "b.csv".to_string()]);

        let (ds, loader) = provider.get_data("a.csv", Split::Train).unwrap();
        assert_eq!(ds.channels(), 2);
        assert!(!loader.is_empty());
        assert!(loader.iter().all(|b| b.size() == 2));
    }

    #[test]
    fn test_label_longer_than_input_rejected() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "a.csv", 40);
        let mut s = settings(dir.path(), Features::M);
        s.label_len = 6;

        let err = CsvProvider::new(s.clone()).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(ref m) if m.contains("label_len=6")), "{err}");

        let raw = Array2::from_shape_fn((40, 1), |(i, _)| i as f32);
        assert!(matches!(
            CsvDataset::from_rows(raw, &s, Split::Train),
            Err(Error::InvalidParameter(_))
        ));

        s.label_len = 4;
        s.pred_len = 0;
        assert!(CsvProvider::new(s).is_err());
    }

    #[test]
    fn test_label_equal_to_input_is_accepted() {
        let mut s = settings(Path::new("."), Features::M);
        s.label_len = s.seq_len;
        s.scale = false;
        let raw = Array2::from_shape_fn((20, 1), |(i, _)| i as f32);
        let ds = CsvDataset::from_rows(raw, &s, Split::Train).unwrap();
        let (_, y) = ds.window(0);
        assert_eq!(y.column(0).to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_non_numeric_field_reports_location() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.csv"), "date,OT\nd0,1.0\nd1,oops\n").unwrap();
        let err = read_table(&dir.path().join("bad.csv"), &settings(dir.path(), Features::S))
            .unwrap_err()
            .to_string();
        assert!(err.contains("row 3"), "{err}");
    }

    #[test]
    fn test_missing_target_column() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.csv"), "date,load\nd0,1.0\n").unwrap();
        assert!(read_table(&dir.path().join("x.csv"), &settings(dir.path(), Features::M)).is_err());
    }
}
