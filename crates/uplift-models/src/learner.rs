//! Base learner selection

use crate::boosting::{BoostingParams, GradientBoostingClassifier};
use crate::estimator::BinaryClassifier;
use crate::forest::{ForestParams, RandomForestClassifier};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use uplift_core::Result;

/// Which classifier family an uplift strategy is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LearnerConfig {
    GradientBoosting(BoostingParams),
    RandomForest(ForestParams),
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self::GradientBoosting(BoostingParams::default())
    }
}

impl LearnerConfig {
    /// Unfitted learner for this configuration
    pub fn build(&self) -> BaseLearner {
        match self {
            Self::GradientBoosting(params) => {
                BaseLearner::GradientBoosting(GradientBoostingClassifier::new(params.clone()))
            }
            Self::RandomForest(params) => {
                BaseLearner::RandomForest(RandomForestClassifier::new(params.clone()))
            }
        }
    }

    /// Same configuration with a different seed
    pub fn with_seed(&self, seed: u64) -> Self {
        match self {
            Self::GradientBoosting(params) => Self::GradientBoosting(BoostingParams {
                seed,
                ..params.clone()
            }),
            Self::RandomForest(params) => Self::RandomForest(ForestParams {
                seed,
                ..params.clone()
            }),
        }
    }
}

/// Serializable classifier used inside uplift strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BaseLearner {
    GradientBoosting(GradientBoostingClassifier),
    RandomForest(RandomForestClassifier),
}

impl BaseLearner {
    fn inner(&self) -> &dyn BinaryClassifier {
        match self {
            Self::GradientBoosting(m) => m,
            Self::RandomForest(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn BinaryClassifier {
        match self {
            Self::GradientBoosting(m) => m,
            Self::RandomForest(m) => m,
        }
    }
}

impl BinaryClassifier for BaseLearner {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &Matrix) -> Result<Vec<f64>> {
        self.inner().predict_proba(x)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}
