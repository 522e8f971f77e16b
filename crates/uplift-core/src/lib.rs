//! Uplift Core
//!
//! Core types, traits, and utilities shared across the uplift predictor.
//!
//! This crate provides:
//! - Error types and result handling
//! - Feature row and prediction result types
//! - Open Inference (V2) protocol payloads and the BYTES/JSON codec
//! - The model settings file and the artifact switcher

pub mod codec;
pub mod error;
pub mod protocol;
pub mod settings;
pub mod types;

pub use error::{Error, Result};
pub use protocol::{Datatype, InferenceRequest, InferenceResponse, RequestInput, ResponseOutput};
pub use settings::{select, select_by_name, ModelChoice, ModelSettings, SelectOutcome};
pub use types::{FeatureRow, FeatureValue, PredictRequest, PredictionResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::protocol::{InferenceRequest, InferenceResponse, RequestInput, ResponseOutput};
    pub use crate::settings::{ModelChoice, ModelSettings};
    pub use crate::types::{FeatureRow, FeatureValue, PredictRequest, PredictionResult};
}
