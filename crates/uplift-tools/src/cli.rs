use clap::Parser;
use std::path::PathBuf;
use uplift_core::settings::SETTINGS_FILE;
use uplift_models::{StrategyKind, TrainingConfig};

/// Printed for any invocation of `uplift-choose` other than one valid choice
pub const CHOOSE_USAGE: &str = "Usage error: The script takes exactly 1 argument: {default, alt}";

#[derive(Parser, Debug)]
#[command(name = "uplift-choose")]
#[command(version, about = "Point the model settings file at the default or alt artifact")]
pub struct ChooseCli {
    /// Artifact to serve: default (solo model) or alt (two models)
    pub choice: String,

    /// Model settings file to rewrite
    #[arg(long, env = "UPLIFT_MODEL_CONFIG", default_value = SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug, Default)]
#[command(name = "uplift-train")]
#[command(version, about = "Train uplift models and write their artifacts")]
pub struct TrainCli {
    /// Training configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Strategy to train; repeat for several (default: solo and two)
    #[arg(short, long, value_parser = parse_strategy)]
    pub strategy: Vec<StrategyKind>,

    /// Directory holding df_features.parquet and df_train.parquet
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory artifacts are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Random seed for the split and the learners
    #[arg(long)]
    pub seed: Option<u64>,

    /// Holdout fraction
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Rows to generate when no dataset exists
    #[arg(long)]
    pub rows: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl TrainCli {
    /// Configuration file (or defaults) with command line overrides applied
    pub fn training_config(&self) -> uplift_core::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_file(path)?,
            None => TrainingConfig::default(),
        };

        if !self.strategy.is_empty() {
            config.strategies = self.strategy.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(test_size) = self.test_size {
            config.test_size = test_size;
        }
        if let Some(rows) = self.rows {
            config.synthetic_rows = rows;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_strategy(s: &str) -> Result<StrategyKind, String> {
    s.parse().map_err(|e: uplift_core::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_cli_parses_one_choice() {
        let cli = ChooseCli::try_parse_from(["uplift-choose", "alt"]).unwrap();
        assert_eq!(cli.choice, "alt");
    }

    #[test]
    fn test_choose_cli_rejects_wrong_arity() {
        assert!(ChooseCli::try_parse_from(["uplift-choose"]).is_err());
        assert!(ChooseCli::try_parse_from(["uplift-choose", "default", "alt"]).is_err());
    }

    #[test]
    fn test_train_overrides() {
        let cli = TrainCli::try_parse_from([
            "uplift-train",
            "--strategy",
            "two",
            "--seed",
            "7",
            "--test-size",
            "0.2",
            "--rows",
            "1000",
        ])
        .unwrap();
        let config = cli.training_config().unwrap();
        assert_eq!(config.strategies, vec![StrategyKind::Two]);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.synthetic_rows, 1000);
    }

    #[test]
    fn test_train_defaults() {
        let config = TrainCli::try_parse_from(["uplift-train"]).unwrap().training_config().unwrap();
        assert_eq!(config, TrainingConfig::default());
    }

    #[test]
    fn test_train_rejects_bad_values() {
        assert!(TrainCli::try_parse_from(["uplift-train", "--strategy", "three"]).is_err());
        let cli = TrainCli::try_parse_from(["uplift-train", "--test-size", "1.5"]).unwrap();
        assert!(cli.training_config().is_err());
    }
}
