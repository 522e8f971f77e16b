//! End-to-end training pipeline tests

use std::fs;
use tempfile::TempDir;

use uplift_core::FeatureValue;
use uplift_models::prelude::*;
use uplift_models::training::{self, FEATURES_FILE, LABELS_FILE};
use uplift_models::{BoostingParams, ForestParams, Table};

fn quick_config(dir: &TempDir) -> TrainingConfig {
    TrainingConfig {
        data_dir: dir.path().join("data"),
        output_dir: dir.path().join("models"),
        synthetic_rows: 500,
        learner: LearnerConfig::GradientBoosting(BoostingParams {
            iterations: 15,
            depth: 3,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn probe_row() -> Vec<FeatureValue> {
    vec![
        FeatureValue::from(58i64),
        FeatureValue::from("M"),
        FeatureValue::from(1499201232i64),
        FeatureValue::from(1504293512.0),
        FeatureValue::from(5092280.0),
    ]
}

#[test]
fn test_default_run_produces_switchable_artifacts() {
    let dir = TempDir::new().unwrap();
    let config = quick_config(&dir);

    let reports = training::run(&config).unwrap();
    let names: Vec<_> = reports
        .iter()
        .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["one_model.json", "two_model.json"]);

    for report in reports {
        let artifact = Artifact::load(&report.path).unwrap();
        let scores = artifact.predict(&[probe_row(), probe_row()]).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0], scores[1]);
    }
}

#[test]
fn test_training_is_deterministic_for_seed() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let mut config_a = quick_config(&a);
    let mut config_b = quick_config(&b);
    config_a.strategies = vec![StrategyKind::Solo];
    config_b.strategies = vec![StrategyKind::Solo];

    let ra = training::run(&config_a).unwrap();
    let rb = training::run(&config_b).unwrap();
    assert_eq!(ra[0].metrics, rb[0].metrics);

    let ma = Artifact::load(&ra[0].path).unwrap();
    let mb = Artifact::load(&rb[0].path).unwrap();
    assert_eq!(ma.model, mb.model);
}

#[test]
fn test_existing_tables_are_used() {
    let dir = TempDir::new().unwrap();
    let mut config = quick_config(&dir);
    config.strategies = vec![StrategyKind::Two];
    config.two_models_method = TwoModelsMethod::DdrTreatment;
    config.learner = LearnerConfig::RandomForest(ForestParams {
        n_trees: 10,
        ..Default::default()
    });

    let (features, labels) = uplift_models::synthetic_retail(300, 99);
    features.write(config.data_dir.join(FEATURES_FILE)).unwrap();
    labels.write(config.data_dir.join(LABELS_FILE)).unwrap();

    let reports = training::run(&config).unwrap();
    assert_eq!(reports[0].train_rows + reports[0].test_rows, 300);

    // tables are left as they were
    let reread = Table::read(config.data_dir.join(FEATURES_FILE)).unwrap();
    assert_eq!(reread, features);
}

#[test]
fn test_corrupt_table_aborts_run() {
    let dir = TempDir::new().unwrap();
    let config = quick_config(&dir);
    fs::create_dir_all(&config.data_dir).unwrap();
    fs::write(config.data_dir.join(FEATURES_FILE), "[]").unwrap();
    fs::write(config.data_dir.join(LABELS_FILE), "[]").unwrap();

    assert!(training::run(&config).is_err());
    assert!(!config.output_dir.join("one_model.json").exists());
}
