//! Pronostico CLI
//!
//! # Usage
//!
//! ```bash
//! # Train every iteration, then test each
//! pronostico train config.yaml
//!
//! # Train with overrides, no test pass
//! pronostico train config.yaml --epochs 10 --lr 0.001 --skip-test
//!
//! # Test iteration 1 from its checkpoint
//! pronostico test config.yaml --itr 1
//!
//! # Validate config
//! pronostico validate config.yaml --detailed
//! ```

use clap::Parser;
use pronostico::config::{
    apply_overrides, load_config, test_from_spec, train_from_spec, Cli, Command, TestArgs,
    TrainArgs, ValidateArgs,
};
use pronostico::logging::{init_logging, LogLevel};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_logging(LogLevel::from_flags(cli.verbose, cli.quiet));

    let result = match cli.command {
        Command::Train(args) => run_train(args),
        Command::Test(args) => run_test(args),
        Command::Validate(args) => run_validate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_train(args: TrainArgs) -> pronostico::Result<()> {
    info!(config = %args.config.display(), "Training");
    let mut spec = load_config(&args.config)?;
    apply_overrides(&mut spec, &args);

    let summaries = train_from_spec(&spec, args.skip_test)?;
    for summary in &summaries {
        info!(
            setting = %summary.setting,
            epochs = summary.train.final_epoch,
            best_vali_loss = summary.train.best_vali_loss,
            stopped_early = summary.train.stopped_early,
            "Iteration finished"
        );
        if let Some(metrics) = &summary.test {
            info!(setting = %summary.setting, "{metrics}");
        }
    }
    info!("Training complete");
    Ok(())
}

fn run_test(args: TestArgs) -> pronostico::Result<()> {
    info!(config = %args.config.display(), itr = args.itr, "Testing");
    let mut spec = load_config(&args.config)?;
    if args.no_plot {
        spec.output.plot = false;
    }
    let metrics = test_from_spec(&spec, args.itr)?;
    info!("{metrics}");
    Ok(())
}

fn run_validate(args: ValidateArgs) -> pronostico::Result<()> {
    info!(config = %args.config.display(), "Validating");
    let spec = load_config(&args.config)?;
    info!("Configuration is valid");

    if args.detailed {
        println!("Configuration Summary:");
        println!("  Data root: {}", spec.data.root_path.display());
        if spec.data.files.is_empty() {
            println!("  Files: all *.csv");
        } else {
            println!("  Files: {}", spec.data.files.join(", "));
        }
        println!(
            "  Target: {} (features {})",
            spec.data.target,
            spec.data.features.as_str()
        );
        println!(
            "  Window: seq_len={} label_len={} pred_len={}",
            spec.data.seq_len, spec.data.label_len, spec.data.pred_len
        );
        println!("  Batch size: {}", spec.data.batch_size);
        println!();
        println!("  Model: {}", spec.model.name);
        println!("  Optimizer: {:?} (lr={})", spec.optimizer.name, spec.optimizer.lr);
        println!(
            "  Epochs: {} (patience {}, lradj {:?})",
            spec.training.epochs, spec.training.patience, spec.training.lradj
        );
        println!("  Loss: {:?}", spec.training.loss);
        println!("  Mixed precision: {}", spec.training.use_amp);
        println!();
        println!("  Checkpoints: {}", spec.output.checkpoints.display());
        println!("  Results: {}", spec.output.results.display());
        for ii in 0..spec.experiment.itr {
            println!("  Setting {ii}: {}", spec.setting(ii));
        }
    }
    Ok(())
}
