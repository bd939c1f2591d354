//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! pronostico train config.yaml
//! pronostico train config.yaml --epochs 20 --lr 0.0005 --patience 5
//! pronostico train config.yaml --resume --skip-test
//! pronostico test config.yaml --itr 1
//! pronostico validate config.yaml
//! ```

use super::ExperimentSpec;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pronostico: multi-file time-series forecasting
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "pronostico")]
#[command(version)]
#[command(about = "Train, validate and test forecasting models over a collection of CSV datasets")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train (and by default test) every iteration of an experiment
    Train(TrainArgs),

    /// Test a trained iteration from its saved checkpoint
    Test(TestArgs),

    /// Validate a configuration file without training
    Validate(ValidateArgs),
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Override early-stopping patience
    #[arg(short, long)]
    pub patience: Option<usize>,

    /// Continue from an existing checkpoint
    #[arg(short, long)]
    pub resume: bool,

    /// Train only; do not run the test pass
    #[arg(long)]
    pub skip_test: bool,

    /// Do not write plots after testing
    #[arg(long)]
    pub no_plot: bool,
}

/// Arguments for the test command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TestArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Iteration whose checkpoint to load
    #[arg(short, long, default_value = "0")]
    pub itr: usize,

    /// Do not write plots
    #[arg(long)]
    pub no_plot: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show the resolved configuration
    #[arg(short, long)]
    pub detailed: bool,
}

/// Parse command line arguments
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to an ExperimentSpec
pub fn apply_overrides(spec: &mut ExperimentSpec, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(lr) = args.lr {
        spec.optimizer.lr = lr;
    }
    if let Some(patience) = args.patience {
        spec.training.patience = patience;
    }
    if args.resume {
        spec.training.resume = true;
    }
    if args.no_plot {
        spec.output.plot = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_command() {
        let cli = parse_args(["pronostico", "train", "config.yaml"]).unwrap();
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.config, PathBuf::from("config.yaml"));
                assert!(!args.resume && !args.skip_test && !args.no_plot);
                assert_eq!(args.epochs, None);
            }
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_train_overrides() {
        let cli = parse_args([
            "pronostico",
            "train",
            "c.yaml",
            "--epochs",
            "5",
            "--lr",
            "0.01",
            "--patience",
            "2",
            "--resume",
            "--skip-test",
            "--no-plot",
        ])
        .unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.epochs, Some(5));
        assert_eq!(args.lr, Some(0.01));
        assert_eq!(args.patience, Some(2));
        assert!(args.resume && args.skip_test && args.no_plot);

        let mut spec: ExperimentSpec = serde_yaml::from_str("data:\n  root_path: .\n").unwrap();
        apply_overrides(&mut spec, &args);
        assert_eq!(spec.training.epochs, 5);
        assert_eq!(spec.optimizer.lr, 0.01);
        assert_eq!(spec.training.patience, 2);
        assert!(spec.training.resume);
        assert!(!spec.output.plot);
    }

    #[test]
    fn test_parse_test_command() {
        let cli = parse_args(["pronostico", "test", "c.yaml", "--itr", "2", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Command::Test(TestArgs {
                config: PathBuf::from("c.yaml"),
                itr: 2,
                no_plot: false,
            })
        );
    }

    #[test]
    fn test_parse_validate_quiet() {
        let cli = parse_args(["pronostico", "-q", "validate", "c.yaml"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Validate(_)));
    }

    #[test]
    fn test_missing_config_is_error() {
        assert!(parse_args(["pronostico", "train"]).is_err());
        assert!(parse_args(["pronostico", "serve", "c.yaml"]).is_err());
    }
}
