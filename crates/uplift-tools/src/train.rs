//! uplift-train
//!
//! Prepares the dataset, fits the configured uplift strategies, reports
//! uplift@k on the holdout partition, and writes one artifact per
//! strategy.

use clap::Parser;
use tracing::info;

use uplift_models::training;
use uplift_tools::{init_logging, TrainCli};

fn main() -> anyhow::Result<()> {
    let cli = TrainCli::parse();
    init_logging(cli.verbose);

    let config = cli.training_config()?;
    info!(
        "Training {:?} with data from {} into {}",
        config.strategies,
        config.data_dir.display(),
        config.output_dir.display()
    );

    for report in training::run(&config)? {
        println!(
            "{}: {} ({} train / {} test rows)",
            report.strategy,
            report.path.display(),
            report.train_rows,
            report.test_rows
        );
        for (metric, value) in &report.metrics {
            println!("  {} = {:.4}", metric, value);
        }
    }

    Ok(())
}
