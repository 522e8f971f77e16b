//! Uplift strategies built from binary classifiers
//!
//! - Solo model: one classifier on pooled data with the treatment flag as
//!   an extra feature; uplift is `p(x, 1) - p(x, 0)`.
//! - Two models: one classifier per arm; uplift is `p_t(x) - p_c(x)`. The
//!   dependent variants feed one arm's score into the other arm's model.

use crate::dataset::UpliftDataset;
use crate::encoding::FeatureEncoder;
use crate::estimator::{BinaryClassifier, Estimator};
use crate::learner::{BaseLearner, LearnerConfig};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uplift_core::{Error, FeatureRow, Result};

/// Strategy family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Solo,
    Two,
}

impl StrategyKind {
    /// File name prefix of the artifact produced for this strategy
    pub fn artifact_prefix(&self) -> &'static str {
        match self {
            Self::Solo => "one",
            Self::Two => "two",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solo => f.write_str("solo"),
            Self::Two => f.write_str("two"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "solo" => Ok(Self::Solo),
            "two" => Ok(Self::Two),
            other => Err(Error::invalid_argument(format!(
                "unknown strategy '{}', expected 'solo' or 'two'",
                other
            ))),
        }
    }
}

/// How the two-model strategy couples its arms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoModelsMethod {
    /// Independent models
    #[default]
    Vanilla,
    /// Treatment model also sees the control model's score
    DdrControl,
    /// Control model also sees the treatment model's score
    DdrTreatment,
}

fn arm_indices(treatment: &[f64], arm: f64) -> Vec<usize> {
    treatment
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == arm)
        .map(|(i, _)| i)
        .collect()
}

fn select(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| values[i]).collect()
}

/// Single shared classifier with the treatment flag as the last feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoloModel {
    encoder: FeatureEncoder,
    learner: BaseLearner,
}

impl SoloModel {
    pub fn fit(
        data: &UpliftDataset,
        learner: &LearnerConfig,
        cat_features: &[String],
        prior_weight: f64,
    ) -> Result<Self> {
        let encoder = FeatureEncoder::fit(
            &data.columns,
            &data.rows,
            &data.target,
            cat_features,
            prior_weight,
        )?;
        let x = encoder.transform(&data.rows)?.with_column(&data.treatment)?;

        let mut model = learner.build();
        model.fit(&x, &data.target)?;
        info!(
            "Fitted solo model ({}) on {} rows, {} treated",
            model.name(),
            data.len(),
            data.treated_count()
        );

        Ok(Self {
            encoder,
            learner: model,
        })
    }

    fn uplift(&self, x: &Matrix) -> Result<Vec<f64>> {
        let treated = self.learner.predict_proba(&x.with_constant_column(1.0))?;
        let control = self.learner.predict_proba(&x.with_constant_column(0.0))?;
        Ok(treated.iter().zip(&control).map(|(t, c)| t - c).collect())
    }
}

/// Separate classifiers for the treated and control arms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoModels {
    method: TwoModelsMethod,
    encoder: FeatureEncoder,
    treatment_model: BaseLearner,
    control_model: BaseLearner,
}

impl TwoModels {
    pub fn fit(
        data: &UpliftDataset,
        learner: &LearnerConfig,
        method: TwoModelsMethod,
        cat_features: &[String],
        prior_weight: f64,
    ) -> Result<Self> {
        let treated = arm_indices(&data.treatment, 1.0);
        let control = arm_indices(&data.treatment, 0.0);
        if treated.is_empty() || control.is_empty() {
            return Err(Error::model(format!(
                "two-model strategy needs both arms, got {} treated and {} control rows",
                treated.len(),
                control.len()
            )));
        }

        let encoder = FeatureEncoder::fit(
            &data.columns,
            &data.rows,
            &data.target,
            cat_features,
            prior_weight,
        )?;
        let x = encoder.transform(&data.rows)?;
        let (x_t, y_t) = (x.select_rows(&treated), select(&data.target, &treated));
        let (x_c, y_c) = (x.select_rows(&control), select(&data.target, &control));

        let mut treatment_model = learner.build();
        let mut control_model = learner.build();

        match method {
            TwoModelsMethod::Vanilla => {
                treatment_model.fit(&x_t, &y_t)?;
                control_model.fit(&x_c, &y_c)?;
            }
            TwoModelsMethod::DdrControl => {
                control_model.fit(&x_c, &y_c)?;
                let score = control_model.predict_proba(&x_t)?;
                treatment_model.fit(&x_t.with_column(&score)?, &y_t)?;
            }
            TwoModelsMethod::DdrTreatment => {
                treatment_model.fit(&x_t, &y_t)?;
                let score = treatment_model.predict_proba(&x_c)?;
                control_model.fit(&x_c.with_column(&score)?, &y_c)?;
            }
        }
        info!(
            "Fitted two-model strategy ({:?}, {}) on {} treated and {} control rows",
            method,
            treatment_model.name(),
            treated.len(),
            control.len()
        );

        Ok(Self {
            method,
            encoder,
            treatment_model,
            control_model,
        })
    }

    pub fn method(&self) -> TwoModelsMethod {
        self.method
    }

    fn uplift(&self, x: &Matrix) -> Result<Vec<f64>> {
        let (treated, control) = match self.method {
            TwoModelsMethod::Vanilla => (
                self.treatment_model.predict_proba(x)?,
                self.control_model.predict_proba(x)?,
            ),
            TwoModelsMethod::DdrControl => {
                let control = self.control_model.predict_proba(x)?;
                let treated = self.treatment_model.predict_proba(&x.with_column(&control)?)?;
                (treated, control)
            }
            TwoModelsMethod::DdrTreatment => {
                let treated = self.treatment_model.predict_proba(x)?;
                let control = self.control_model.predict_proba(&x.with_column(&treated)?)?;
                (treated, control)
            }
        };
        Ok(treated.iter().zip(&control).map(|(t, c)| t - c).collect())
    }
}

/// Any fitted uplift strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum UpliftModel {
    Solo(SoloModel),
    Two(TwoModels),
}

impl UpliftModel {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Solo(_) => StrategyKind::Solo,
            Self::Two(_) => StrategyKind::Two,
        }
    }

    fn encoder(&self) -> &FeatureEncoder {
        match self {
            Self::Solo(m) => &m.encoder,
            Self::Two(m) => &m.encoder,
        }
    }

    /// Input column names in order
    pub fn columns(&self) -> &[String] {
        self.encoder().columns()
    }
}

impl Estimator for UpliftModel {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>> {
        let encoder = self.encoder();
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = encoder.transform(rows)?;
        match self {
            Self::Solo(m) => m.uplift(&x),
            Self::Two(m) => m.uplift(&x),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Solo(_) => "solo_model",
            Self::Two(_) => "two_models",
        }
    }
}
