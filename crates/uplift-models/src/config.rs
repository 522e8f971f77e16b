//! Training configuration

use crate::learner::LearnerConfig;
use crate::strategy::{StrategyKind, TwoModelsMethod};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uplift_core::{Error, Result};

/// Training run configuration, loadable from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Directory holding `df_features.parquet` and `df_train.parquet`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Strategies to train, one artifact each
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    #[serde(default)]
    pub two_models_method: TwoModelsMethod,

    #[serde(default)]
    pub learner: LearnerConfig,

    /// Columns to treat as categorical
    #[serde(default = "default_cat_features")]
    pub cat_features: Vec<String>,

    /// Holdout fraction
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Split and learner seed; `None` draws from entropy
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,

    /// Stratify the split on treatment x target
    #[serde(default = "default_true")]
    pub stratify: bool,

    /// Rows generated when no dataset is on disk
    #[serde(default = "default_synthetic_rows")]
    pub synthetic_rows: usize,

    /// Smoothing weight of categorical target statistics
    #[serde(default = "default_prior_weight")]
    pub prior_weight: f64,

    /// Fraction used for uplift@k
    #[serde(default = "default_uplift_k")]
    pub uplift_k: f64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_strategies() -> Vec<StrategyKind> {
    vec![StrategyKind::Solo, StrategyKind::Two]
}

fn default_cat_features() -> Vec<String> {
    vec!["gender".to_string()]
}

fn default_test_size() -> f64 {
    0.3
}

fn default_seed() -> Option<u64> {
    Some(42)
}

fn default_true() -> bool {
    true
}

fn default_synthetic_rows() -> usize {
    5000
}

fn default_prior_weight() -> f64 {
    1.0
}

fn default_uplift_k() -> f64 {
    0.3
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            strategies: default_strategies(),
            two_models_method: TwoModelsMethod::default(),
            learner: LearnerConfig::default(),
            cat_features: default_cat_features(),
            test_size: default_test_size(),
            seed: default_seed(),
            stratify: default_true(),
            synthetic_rows: default_synthetic_rows(),
            prior_weight: default_prior_weight(),
            uplift_k: default_uplift_k(),
        }
    }
}

impl TrainingConfig {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid training config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(Error::config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !(self.uplift_k > 0.0 && self.uplift_k <= 1.0) {
            return Err(Error::config(format!(
                "uplift_k must be in (0, 1], got {}",
                self.uplift_k
            )));
        }
        if self.strategies.is_empty() {
            return Err(Error::config("at least one strategy is required"));
        }
        if self.prior_weight < 0.0 {
            return Err(Error::config("prior_weight must not be negative"));
        }
        Ok(())
    }
}
