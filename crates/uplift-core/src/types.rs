//! Core types for feature rows and prediction payloads

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar inside a feature row.
///
/// Rows are heterogeneous: numeric and categorical columns are mixed and
/// only the estimator knows which is which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Boolean flag, encoded as 0/1 for numeric columns
    Bool(bool),

    /// Numeric value (integers are widened to f64)
    Number(f64),

    /// Text value, usually a category label
    Text(String),

    /// JSON null
    Missing,
}

impl FeatureValue {
    /// Numeric view of this value, `None` for text that is not a number.
    ///
    /// Missing values map to NaN.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Missing => Some(f64::NAN),
        }
    }

    /// Category label for this value, `None` when missing.
    ///
    /// Whole numbers are rendered without a fractional part so that `1`
    /// and `1.0` land in the same category.
    pub fn category(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Missing => None,
        }
    }

    /// Whether this value is text
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Missing => write!(f, "null"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered sequence of feature values for one customer
pub type FeatureRow = Vec<FeatureValue>;

/// Body of the `predict_request` input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Feature rows to score; absent means no rows
    #[serde(default)]
    pub data: Vec<FeatureRow>,
}

/// Structured outcome of a prediction call.
///
/// A failed prediction is still a well-formed result: callers inspect
/// `success` instead of relying on transport errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Whether the estimator produced predictions
    pub success: bool,

    /// One uplift score per input row, null on failure
    pub prediction: Option<Vec<f64>>,
}

impl PredictionResult {
    /// Successful result carrying predictions
    pub fn success(prediction: Vec<f64>) -> Self {
        Self {
            success: true,
            prediction: Some(prediction),
        }
    }

    /// Unsuccessful result without predictions
    pub fn failure() -> Self {
        Self {
            success: false,
            prediction: None,
        }
    }
}

impl<E> From<std::result::Result<Vec<f64>, E>> for PredictionResult {
    fn from(outcome: std::result::Result<Vec<f64>, E>) -> Self {
        match outcome {
            Ok(prediction) => Self::success(prediction),
            Err(_) => Self::failure(),
        }
    }
}
