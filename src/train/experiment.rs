//! Multi-file train / validate / test driver

use super::evaluate::{evaluate, stack};
use super::{metric, EarlyStopping, EpochRecord, LossFn, Metrics, MetricsTracker, RunConfig, TrainResult};
use crate::autograd::{backward, Mode};
use crate::data::{DataLoader, DataProvider, Split};
use crate::io::{checkpoint_path, read_state, write_state, ResultWriter};
use crate::model::Forecaster;
use crate::optim::{apply_schedule, GradScaler};
use crate::{viz, Error, Result};
use ndarray::Array3;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns one model and trains it over every file of a [`DataProvider`].
///
/// Files are visited in the provider's order each epoch. The epoch loss is
/// the unweighted mean of per-file mean losses, while validation and test
/// metrics are computed over the pooled predictions of all files.
pub struct Experiment<P, M> {
    config: RunConfig,
    provider: P,
    model: M,
}

impl<P, M> Experiment<P, M>
where
    P: DataProvider,
    M: Forecaster,
{
    /// Validates `config` once; it is read-only afterwards
    pub fn new(config: RunConfig, provider: P, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            provider,
            model,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// `<checkpoints>/<setting>/checkpoint.pth`
    pub fn checkpoint_path(&self, setting: &str) -> PathBuf {
        checkpoint_path(&self.config.checkpoints, setting)
    }

    /// Replace the model parameters with a saved snapshot
    pub fn load_checkpoint(&mut self, setting: &str) -> Result<()> {
        let path = self.checkpoint_path(setting);
        let state = read_state(&path)?;
        self.model.load_state_dict(&state)?;
        info!(path = %path.display(), "Loaded checkpoint");
        Ok(())
    }

    fn files(&self) -> Result<Vec<String>> {
        let files = self.provider.file_names().to_vec();
        if files.is_empty() {
            return Err(Error::EmptyCollection);
        }
        Ok(files)
    }

    fn load_split(&self, file: &str, split: Split) -> Result<(P::Dataset, DataLoader)> {
        let (dataset, loader) = self.provider.get_data(file, split)?;
        if loader.is_empty() {
            return Err(Error::EmptyLoader {
                file: file.to_string(),
                split: split.to_string(),
            });
        }
        Ok((dataset, loader))
    }

    /// Train for up to `train_epochs` epochs, then restore the best snapshot.
    pub fn train(&mut self, setting: &str) -> Result<TrainResult> {
        let files = self.files()?;
        let run_dir = self.config.checkpoints.join(setting);
        std::fs::create_dir_all(&run_dir)?;
        let path = self.checkpoint_path(setting);

        if self.config.resume {
            if path.exists() {
                self.load_checkpoint(setting)?;
            } else {
                warn!(path = %path.display(), "Resume requested but no checkpoint found, starting fresh");
            }
        }

        let mut optimizer = self.config.build_optimizer();
        let criterion = self.config.loss.build();
        let mut scaler = self.config.use_amp.then(GradScaler::default);
        let schedule = self.config.schedule();
        let mut early_stopping = EarlyStopping::with_delta(self.config.patience, self.config.delta);
        let mut tracker = MetricsTracker::new();
        let run_start = Instant::now();

        info!(
            setting,
            files = files.len(),
            epochs = self.config.train_epochs,
            optimizer = optimizer.name(),
            loss = criterion.name(),
            amp = scaler.is_some(),
            "Start training"
        );

        for epoch in 0..self.config.train_epochs {
            let epoch_start = Instant::now();
            let lr = optimizer.lr();
            let mut iter_count = 0usize;
            let mut train_loss = Vec::with_capacity(files.len());

            for (file_idx, file) in files.iter().enumerate() {
                let (_, loader) = self.load_split(file, Split::Train)?;
                let mut running = 0.0f32;

                for (i, batch) in loader.iter().enumerate() {
                    iter_count += 1;
                    optimizer.zero_grad(self.model.params_mut());

                    let out = self.model.process_batch(batch, Mode::Train)?;
                    let mut loss = criterion.forward(&out.prediction, &out.truth)?;
                    let value = loss.item();
                    running += value;

                    if (i + 1) % self.config.log_interval == 0 {
                        let elapsed = epoch_start.elapsed().as_secs_f64();
                        info!(
                            iters = i + 1,
                            epoch = epoch + 1,
                            file = file_idx,
                            loss = format_args!("{value:.7}"),
                            speed = format_args!("{:.4}s/iter", elapsed / iter_count as f64),
                            "Training progress"
                        );
                    }

                    match scaler.as_mut() {
                        Some(scaler) => {
                            scaler.scale_backward(&mut loss);
                            let stepped = scaler.step(optimizer.as_mut(), self.model.params_mut());
                            scaler.update(stepped);
                        }
                        None => {
                            backward(&mut loss, None);
                            optimizer.step(self.model.params_mut());
                        }
                    }
                    tracker.increment_step();
                }

                let file_loss = running / loader.len() as f32;
                info!(file, loss = file_loss, "File train loss");
                train_loss.push(file_loss);
            }

            let epoch_train_loss = train_loss.iter().sum::<f32>() / train_loss.len() as f32;
            let (vali_loss, metrics) = self.vali(Split::Val, criterion.as_ref())?;
            let duration = epoch_start.elapsed().as_secs_f64();

            info!(
                epoch = epoch + 1,
                steps = iter_count,
                train_loss = format_args!("{epoch_train_loss:.7}"),
                vali_loss = format_args!("{vali_loss:.7}"),
                cost_min = format_args!("{:.2}", duration / 60.0),
                "Epoch done"
            );
            debug!(epoch = epoch + 1, %metrics, "Validation metrics");

            tracker.record_epoch(EpochRecord {
                epoch: epoch + 1,
                train_loss: epoch_train_loss,
                vali_loss,
                mae: metrics.mae,
                mse: metrics.mse,
                rmse: metrics.rmse,
                mape: metrics.mape,
                mspe: metrics.mspe,
                steps: iter_count,
                duration_secs: duration,
                lr,
            });

            let model = &self.model;
            early_stopping.update(vali_loss, || write_state(&model.state_dict(), &path))?;
            if early_stopping.early_stop() {
                info!(epoch = epoch + 1, "Early stopping");
                break;
            }

            apply_schedule(optimizer.as_mut(), &schedule, epoch + 1);
        }

        if let Some(scaler) = &scaler {
            debug!(
                scale = scaler.scale(),
                overflows = scaler.overflow_count(),
                "Gradient scaler summary"
            );
        }

        self.load_checkpoint(setting)?;
        ResultWriter::create(&run_dir)?.write_history(tracker.records())?;

        Ok(TrainResult {
            final_epoch: tracker.epochs(),
            best_vali_loss: early_stopping.val_loss_min(),
            stopped_early: early_stopping.early_stop(),
            elapsed_secs: run_start.elapsed().as_secs_f64(),
            history: tracker.into_records(),
        })
    }

    /// Loss (mean of per-file means) and pooled metrics over `split`
    pub fn vali(&self, split: Split, criterion: &dyn LossFn) -> Result<(f32, Metrics)> {
        let files = self.files()?;
        let mut losses = Vec::with_capacity(files.len());
        let mut preds = Vec::with_capacity(files.len());
        let mut trues = Vec::with_capacity(files.len());

        for file in &files {
            let (_, loader) = self.load_split(file, split)?;
            let out = evaluate(&self.model, &loader, Some(criterion), None)?;
            if let Some(loss) = out.loss {
                losses.push(loss);
            }
            preds.push(out.predictions);
            trues.push(out.truths);
        }

        let metrics = metric(&stack(&preds)?, &stack(&trues)?)?;
        let loss = losses.iter().sum::<f32>() / losses.len() as f32;
        Ok((loss, metrics))
    }

    /// Predict the test split of every file and write result artifacts.
    ///
    /// Per-file artifacts (normalized scale) are only written when there is
    /// more than one file. The aggregate artifacts hold the inverse-transformed
    /// target channel of all files pooled.
    pub fn test(&mut self, setting: &str, load: bool, plot: bool) -> Result<Metrics> {
        let files = self.files()?;
        if load {
            self.load_checkpoint(setting)?;
        }
        let writer = ResultWriter::create(self.config.results.join(setting))?;
        let per_file = files.len() > 1;

        let mut preds: Vec<Array3<f32>> = Vec::with_capacity(files.len());
        let mut trues: Vec<Array3<f32>> = Vec::with_capacity(files.len());

        for file in &files {
            let (dataset, loader) = self.load_split(file, Split::Test)?;
            let out = evaluate(&self.model, &loader, None, Some(&dataset))?;
            debug!(file, shape = ?out.predictions.shape(), "Test predictions");

            let file_metrics = metric(&out.predictions, &out.truths)?;
            info!(file, "{file_metrics}");
            if per_file {
                writer.write_per_file(file, &file_metrics, &out.predictions, &out.truths)?;
            }

            let (pred, truth) = out
                .restored
                .ok_or_else(|| Error::Data(format!("{file}: inverse transform missing")))?;
            preds.push(pred);
            trues.push(truth);
        }

        let preds = stack(&preds)?;
        let trues = stack(&trues)?;
        debug!(shape = ?preds.shape(), "Pooled test predictions");

        let metrics = metric(&preds, &trues)?;
        info!("mse:{}, mae:{}", metrics.mse, metrics.mae);
        writer.write_aggregate(&metrics, &preds, &trues)?;

        if plot {
            viz::plot_test_results(&trues, &preds, self.config.pred_len, writer.dir())?;
        }
        Ok(metrics)
    }
}
