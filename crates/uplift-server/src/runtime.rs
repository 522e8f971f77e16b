//! Model runtimes plugged into the inference host
//!
//! A runtime has two hooks: `initialize` loads whatever the model settings
//! point at, `predict` turns one V2 inference request into one response.

use async_trait::async_trait;
use metrics::{counter, histogram};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use uplift_core::codec::{decode_json_inputs, encode_bytes_output, encode_double_json, JSON_CONTENT_TYPE};
use uplift_core::protocol::{Datatype, MetadataTensor, ModelMetadata};
use uplift_core::{Error, InferenceRequest, InferenceResponse, ModelSettings, PredictRequest, PredictionResult, Result};
use uplift_models::{Artifact, Estimator};

use crate::uri::resolve_artifact_uri;

/// Input carrying the JSON-encoded feature rows
pub const PREDICT_INPUT: &str = "predict_request";

/// Output carrying the JSON-encoded prediction result
pub const PREDICTION_OUTPUT: &str = "prediction_output";

/// Host-side contract of a model runtime
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Load the model; any error aborts host startup
    async fn initialize(&self) -> Result<()>;

    /// Serve one inference request
    async fn predict(&self, request: InferenceRequest) -> Result<InferenceResponse>;

    /// Model name as exposed on the V2 routes
    fn name(&self) -> &str;

    /// Model version, when the settings carry one
    fn version(&self) -> Option<&str>;

    /// Whether `initialize` has completed
    fn is_ready(&self) -> bool;

    /// V2 metadata for `GET /v2/models/{name}`
    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            name: self.name().to_string(),
            versions: self.version().map(|v| vec![v.to_string()]).unwrap_or_default(),
            platform: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// Runtime serving an uplift artifact
pub struct UpliftRuntime {
    settings: ModelSettings,
    settings_dir: PathBuf,
    estimator: RwLock<Option<Arc<dyn Estimator>>>,
}

impl UpliftRuntime {
    /// Runtime that loads its artifact on `initialize`.
    ///
    /// Relative artifact URIs resolve against `settings_dir`.
    pub fn new(settings: ModelSettings, settings_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            settings_dir: settings_dir.into(),
            estimator: RwLock::new(None),
        }
    }

    /// Runtime that is ready immediately with the given estimator
    pub fn with_estimator(settings: ModelSettings, estimator: Arc<dyn Estimator>) -> Self {
        Self {
            settings,
            settings_dir: PathBuf::from("."),
            estimator: RwLock::new(Some(estimator)),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn estimator(&self) -> Result<Arc<dyn Estimator>> {
        self.estimator
            .read()
            .clone()
            .ok_or_else(|| Error::NotReady(self.settings.name.clone()))
    }
}

/// Decode the feature rows and score them.
///
/// The `predict_request` input is required; inside it a missing `data`
/// field means no rows.
fn score(estimator: &dyn Estimator, request: &InferenceRequest) -> Result<Vec<f64>> {
    let mut inputs = decode_json_inputs(request)?;
    let predict_request = match inputs.remove(PREDICT_INPUT) {
        Some(Value::Null) | None => {
            return Err(Error::codec(format!("missing input '{}'", PREDICT_INPUT)))
        }
        Some(value) => serde_json::from_value::<PredictRequest>(value)
            .map_err(|e| Error::codec(format!("invalid {}: {}", PREDICT_INPUT, e)))?,
    };
    debug!(
        "Scoring {} rows with {}",
        predict_request.data.len(),
        estimator.name()
    );
    estimator.predict(&predict_request.data)
}

fn load_artifact(path: &Path) -> Result<Arc<dyn Estimator>> {
    let artifact = Artifact::load(path)?;
    Ok(Arc::new(artifact))
}

#[async_trait]
impl ModelRuntime for UpliftRuntime {
    async fn initialize(&self) -> Result<()> {
        let path = resolve_artifact_uri(&self.settings.parameters.uri, &self.settings_dir)?;
        info!(
            "Loading model '{}' from {}",
            self.settings.name,
            path.display()
        );

        let estimator = tokio::task::spawn_blocking(move || load_artifact(&path))
            .await
            .map_err(|e| Error::internal(format!("artifact loader panicked: {}", e)))??;

        *self.estimator.write() = Some(estimator);
        info!("Model '{}' is ready", self.settings.name);
        Ok(())
    }

    async fn predict(&self, request: InferenceRequest) -> Result<InferenceResponse> {
        let estimator = self.estimator()?;
        counter!("uplift_requests_total", "model" => self.settings.name.clone()).increment(1);

        let start = Instant::now();
        let id = request.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

        let outcome = tokio::task::spawn_blocking(move || score(estimator.as_ref(), &request))
            .await
            .map_err(|e| Error::internal(format!("prediction task panicked: {}", e)))
            .and_then(|r| r);

        if let Err(e) = &outcome {
            warn!("Prediction failed for request {}: {}", id, e);
            counter!("uplift_prediction_failures_total", "model" => self.settings.name.clone())
                .increment(1);
        }
        let result = PredictionResult::from(outcome);
        histogram!("uplift_predict_latency_us").record(start.elapsed().as_micros() as f64);

        let payload = encode_double_json(&result)?;
        let output = encode_bytes_output(PREDICTION_OUTPUT, &payload, JSON_CONTENT_TYPE)?;

        Ok(InferenceResponse {
            model_name: self.settings.name.clone(),
            model_version: self.settings.parameters.version.clone(),
            id: Some(id),
            parameters: None,
            outputs: vec![output],
        })
    }

    fn name(&self) -> &str {
        &self.settings.name
    }

    fn version(&self) -> Option<&str> {
        self.settings.parameters.version.as_deref()
    }

    fn is_ready(&self) -> bool {
        self.estimator.read().is_some()
    }

    fn metadata(&self) -> ModelMetadata {
        let bytes_tensor = |name: &str| MetadataTensor {
            name: name.to_string(),
            datatype: Datatype::Bytes,
            shape: vec![-1],
            parameters: None,
        };
        ModelMetadata {
            name: self.settings.name.clone(),
            versions: self.version().map(|v| vec![v.to_string()]).unwrap_or_default(),
            platform: self.settings.implementation.clone(),
            inputs: vec![bytes_tensor(PREDICT_INPUT)],
            outputs: vec![bytes_tensor(PREDICTION_OUTPUT)],
        }
    }
}
