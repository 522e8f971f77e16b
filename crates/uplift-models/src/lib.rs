//! Uplift models
//!
//! Estimators and the offline training pipeline behind the uplift
//! predictor:
//! - Base learners: histogram gradient boosting and random forest
//! - Uplift strategies: solo model (S-learner) and two models (T-learner
//!   with vanilla and dependent variants)
//! - Holdout evaluation with uplift@k
//! - JSON artifacts the serving runtime loads at startup

pub mod artifact;
pub mod boosting;
pub mod columnar;
pub mod config;
pub mod dataset;
pub mod encoding;
pub mod estimator;
pub mod forest;
pub mod learner;
pub mod matrix;
pub mod metrics;
pub mod strategy;
pub mod training;
pub mod tree;

pub use artifact::{Artifact, ARTIFACT_FORMAT_VERSION};
pub use boosting::{BoostingParams, GradientBoostingClassifier};
pub use config::TrainingConfig;
pub use dataset::{synthetic_retail, Table, TableFormat, UpliftDataset};
pub use encoding::FeatureEncoder;
pub use estimator::{BinaryClassifier, Estimator};
pub use forest::{ForestParams, MaxFeatures, RandomForestClassifier};
pub use learner::{BaseLearner, LearnerConfig};
pub use matrix::Matrix;
pub use metrics::{uplift_at_k, UpliftAtKStrategy};
pub use strategy::{SoloModel, StrategyKind, TwoModels, TwoModelsMethod, UpliftModel};
pub use training::{artifact_path, TrainingReport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifact::Artifact;
    pub use crate::config::TrainingConfig;
    pub use crate::estimator::{BinaryClassifier, Estimator};
    pub use crate::learner::LearnerConfig;
    pub use crate::strategy::{StrategyKind, TwoModelsMethod, UpliftModel};
}
