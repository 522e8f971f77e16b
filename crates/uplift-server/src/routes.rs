//! HTTP routes and handlers (Open Inference V2 REST)

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use uplift_core::protocol::{ModelMetadata, ServerMetadata};
use uplift_core::{Error, InferenceRequest, InferenceResponse};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/v2/health/live", get(live))
        .route("/v2/health/ready", get(ready))
        .route("/v2", get(server_metadata))
        .route("/v2/models/:name", get(model_metadata))
        .route("/v2/models/:name/ready", get(model_ready))
        .route("/v2/models/:name/infer", post(infer))
        .route("/v2/models/:name/versions/:version/infer", post(infer_version))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn live() -> StatusCode {
    StatusCode::OK
}

async fn ready(State(state): State<AppState>) -> StatusCode {
    if state.runtime.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn server_metadata(State(state): State<AppState>) -> Json<ServerMetadata> {
    Json(ServerMetadata {
        name: state.config.server_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        extensions: Vec::new(),
    })
}

async fn model_metadata(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ModelMetadata>, AppError> {
    check_model(&state, &name, None)?;
    Ok(Json(state.runtime.metadata()))
}

async fn model_ready(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    check_model(&state, &name, None)?;
    Ok(if state.runtime.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    })
}

async fn infer(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<InferenceResponse>, AppError> {
    run_inference(state, &name, None, &body).await
}

async fn infer_version(
    State(state): State<AppState>,
    Path((name, version)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<InferenceResponse>, AppError> {
    run_inference(state, &name, Some(&version), &body).await
}

async fn run_inference(
    state: AppState,
    name: &str,
    version: Option<&str>,
    body: &[u8],
) -> Result<Json<InferenceResponse>, AppError> {
    check_model(&state, name, version)?;

    let request: InferenceRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("invalid inference request: {}", e)))?;
    debug!(
        "Inference request for {} with {} inputs",
        name,
        request.inputs.len()
    );

    if !state.runtime.is_ready() {
        return Err(AppError::Unavailable(format!("model '{}' is not ready", name)));
    }

    let response = state.runtime.predict(request).await?;
    Ok(Json(response))
}

/// The host serves exactly one model; any other name or version is unknown
fn check_model(state: &AppState, name: &str, version: Option<&str>) -> Result<(), AppError> {
    if name != state.runtime.name() {
        return Err(AppError::NotFound(format!("model '{}' not found", name)));
    }
    if let Some(requested) = version {
        if state.runtime.version() != Some(requested) {
            return Err(AppError::NotFound(format!(
                "model '{}' version '{}' not found",
                name, requested
            )));
        }
    }
    Ok(())
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}

async fn fallback() -> AppError {
    AppError::NotFound("route not found".to_string())
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    InvalidRequest(String),
    Unavailable(String),
    InternalError(String),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotReady(_) => AppError::Unavailable(err.to_string()),
            Error::InvalidArgument(_) | Error::Codec(_) | Error::Shape(_) => {
                AppError::InvalidRequest(err.to_string())
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidRequest(msg) => {
                warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
