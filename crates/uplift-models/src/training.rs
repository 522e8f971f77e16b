//! Offline training pipeline
//!
//! prepare data -> split -> fit strategy -> uplift@k on holdout -> artifact

use crate::artifact::Artifact;
use crate::config::TrainingConfig;
use crate::dataset::{synthetic_retail, Table, UpliftDataset};
use crate::estimator::Estimator;
use crate::metrics::{uplift_at_k, UpliftAtKStrategy};
use crate::strategy::{SoloModel, StrategyKind, TwoModels, UpliftModel};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uplift_core::Result;

/// Feature table file inside the data directory
pub const FEATURES_FILE: &str = "df_features.parquet";

/// Treatment/target table file inside the data directory
pub const LABELS_FILE: &str = "df_train.parquet";

/// Outcome of training one strategy
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub strategy: StrategyKind,
    pub path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: BTreeMap<String, f64>,
}

/// Where the artifact of a strategy is written
pub fn artifact_path(output_dir: impl AsRef<Path>, kind: StrategyKind) -> PathBuf {
    output_dir
        .as_ref()
        .join(format!("{}_model.json", kind.artifact_prefix()))
}

/// Load the dataset from `data_dir`, generating and persisting a synthetic
/// one when the tables are not there yet.
pub fn prepare_dataset(config: &TrainingConfig) -> Result<UpliftDataset> {
    let features_path = config.data_dir.join(FEATURES_FILE);
    let labels_path = config.data_dir.join(LABELS_FILE);

    let (features, labels) = if features_path.exists() && labels_path.exists() {
        info!("Loading dataset from {}", config.data_dir.display());
        (Table::read(&features_path)?, Table::read(&labels_path)?)
    } else {
        if features_path.exists() != labels_path.exists() {
            warn!(
                "Only one of {} and {} exists, regenerating both",
                FEATURES_FILE, LABELS_FILE
            );
        }
        let seed = config.seed.unwrap_or(0);
        info!(
            "No dataset in {}, generating {} synthetic rows (seed {})",
            config.data_dir.display(),
            config.synthetic_rows,
            seed
        );
        let (features, labels) = synthetic_retail(config.synthetic_rows, seed);
        features.write(&features_path)?;
        labels.write(&labels_path)?;
        (features, labels)
    };

    let data = UpliftDataset::from_tables(&features, &labels)?;
    info!(
        "Dataset ready: {} rows, {} treated, {} columns",
        data.len(),
        data.treated_count(),
        data.columns.len()
    );
    Ok(data)
}

/// Fit one strategy on the training partition
pub fn fit_strategy(kind: StrategyKind, train: &UpliftDataset, config: &TrainingConfig) -> Result<UpliftModel> {
    let learner = match config.seed {
        Some(seed) => config.learner.with_seed(seed),
        None => config.learner.clone(),
    };
    let model = match kind {
        StrategyKind::Solo => UpliftModel::Solo(SoloModel::fit(
            train,
            &learner,
            &config.cat_features,
            config.prior_weight,
        )?),
        StrategyKind::Two => UpliftModel::Two(TwoModels::fit(
            train,
            &learner,
            config.two_models_method,
            &config.cat_features,
            config.prior_weight,
        )?),
    };
    Ok(model)
}

/// uplift@k for every slicing strategy; failures are logged and skipped
pub fn evaluate(model: &UpliftModel, test: &UpliftDataset, k: f64) -> Result<BTreeMap<String, f64>> {
    let scores = model.predict(&test.rows)?;
    let mut metrics = BTreeMap::new();
    for strategy in UpliftAtKStrategy::ALL {
        let key = format!("uplift@{}_{}", k, strategy);
        match uplift_at_k(&test.target, &scores, &test.treatment, k, strategy) {
            Ok(value) => {
                info!("{} {} = {:.4}", model.name(), key, value);
                metrics.insert(key, value);
            }
            Err(e) => warn!("Could not compute {} for {}: {}", key, model.name(), e),
        }
    }
    Ok(metrics)
}

/// Fit, evaluate, and persist one strategy
pub fn train_strategy(
    kind: StrategyKind,
    train: &UpliftDataset,
    test: &UpliftDataset,
    config: &TrainingConfig,
) -> Result<TrainingReport> {
    let model = fit_strategy(kind, train, config)?;
    let metrics = evaluate(&model, test, config.uplift_k)?;

    let path = artifact_path(&config.output_dir, kind);
    Artifact::new(format!("{}_model", kind.artifact_prefix()), model)
        .with_metrics(metrics.clone())
        .save(&path)?;

    Ok(TrainingReport {
        strategy: kind,
        path,
        train_rows: train.len(),
        test_rows: test.len(),
        metrics,
    })
}

/// Full training run over every configured strategy
pub fn run(config: &TrainingConfig) -> Result<Vec<TrainingReport>> {
    config.validate()?;
    let data = prepare_dataset(config)?;
    let (train, test) = data.train_test_split(config.test_size, config.seed, config.stratify)?;
    info!("Split into {} train and {} test rows", train.len(), test.len());

    config
        .strategies
        .iter()
        .map(|&kind| train_strategy(kind, &train, &test, config))
        .collect()
}
