//! Trained artifact persistence
//!
//! An artifact is a JSON envelope around a fitted [`UpliftModel`] plus the
//! bookkeeping the serving side logs at startup. It is written once per
//! training run and only ever replaced, never mutated.

use crate::estimator::Estimator;
use crate::strategy::{StrategyKind, UpliftModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};
use uplift_core::{Error, FeatureRow, Result};

/// Envelope version understood by this build
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Serialized trained estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub format_version: u32,
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub strategy: StrategyKind,
    /// Input column names in order
    pub columns: Vec<String>,
    /// Holdout metrics recorded at training time
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    pub model: UpliftModel,
}

impl Artifact {
    pub fn new(name: impl Into<String>, model: UpliftModel) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            name: name.into(),
            trained_at: Utc::now(),
            strategy: model.kind(),
            columns: model.columns().to_vec(),
            metrics: BTreeMap::new(),
            model,
        }
    }

    pub fn with_metrics(mut self, metrics: BTreeMap<String, f64>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Write the artifact, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;

        info!(
            "Saved {} artifact '{}' to {}",
            self.strategy,
            self.name,
            path.display()
        );
        Ok(())
    }

    /// Read and validate an artifact
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            Error::artifact(format!("failed to read {}: {}", path.display(), e))
        })?;
        let digest = Sha256::digest(&bytes);
        debug!("Artifact {} sha256={:x}", path.display(), digest);

        let artifact: Artifact = serde_json::from_slice(&bytes).map_err(|e| {
            Error::artifact(format!("failed to parse {}: {}", path.display(), e))
        })?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::artifact(format!(
                "{} has format version {}, expected {}",
                path.display(),
                artifact.format_version,
                ARTIFACT_FORMAT_VERSION
            )));
        }
        if artifact.strategy != artifact.model.kind() {
            return Err(Error::artifact(format!(
                "{} declares strategy '{}' but holds a '{}' model",
                path.display(),
                artifact.strategy,
                artifact.model.kind()
            )));
        }

        info!(
            "Loaded {} artifact '{}' trained at {} ({} columns, sha256 {:x})",
            artifact.strategy,
            artifact.name,
            artifact.trained_at.to_rfc3339(),
            artifact.columns.len(),
            digest
        );
        Ok(artifact)
    }
}

impl Estimator for Artifact {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>> {
        self.model.predict(rows)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boosting::BoostingParams;
    use crate::dataset::{synthetic_retail, UpliftDataset};
    use crate::learner::LearnerConfig;
    use crate::strategy::SoloModel;
    use tempfile::TempDir;

    fn fitted() -> UpliftModel {
        let (features, labels) = synthetic_retail(200, 1);
        let data = UpliftDataset::from_tables(&features, &labels).unwrap();
        let learner = LearnerConfig::GradientBoosting(BoostingParams {
            iterations: 5,
            ..Default::default()
        });
        UpliftModel::Solo(SoloModel::fit(&data, &learner, &["gender".to_string()], 1.0).unwrap())
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models").join("one_model.json");

        let mut metrics = BTreeMap::new();
        metrics.insert("uplift@30%_overall".to_string(), 0.05);
        let artifact = Artifact::new("solo", fitted()).with_metrics(metrics);
        artifact.save(&path).unwrap();

        let loaded = Artifact::load(&path).unwrap();
        assert_eq!(loaded, artifact);
        assert_eq!(loaded.strategy, StrategyKind::Solo);
        assert_eq!(loaded.columns.len(), 5);
    }

    #[test]
    fn test_version_mismatch_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one_model.json");
        let mut artifact = Artifact::new("solo", fitted());
        artifact.format_version = ARTIFACT_FORMAT_VERSION + 1;
        artifact.save(&path).unwrap();

        let err = Artifact::load(&path).unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
        assert!(err.to_string().contains("format version"));
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Artifact::load(dir.path().join("absent.json")),
            Err(Error::Artifact(_))
        ));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, b"{not json").unwrap();
        assert!(matches!(Artifact::load(&corrupt), Err(Error::Artifact(_))));
    }
}
