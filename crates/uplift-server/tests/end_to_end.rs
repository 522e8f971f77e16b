//! Train, switch, load, and serve

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use uplift_core::codec::decode_double_json;
use uplift_core::settings::SETTINGS_FILE;
use uplift_core::{select, ModelChoice};
use uplift_models::training;
use uplift_models::{BoostingParams, LearnerConfig, StrategyKind, TrainingConfig};
use uplift_server::{create_router, AppState, RuntimeRegistry, ServerConfig};

fn train_into(dir: &TempDir, strategies: Vec<StrategyKind>) {
    let config = TrainingConfig {
        data_dir: dir.path().join("data"),
        output_dir: dir.path().to_path_buf(),
        strategies,
        synthetic_rows: 400,
        learner: LearnerConfig::GradientBoosting(BoostingParams {
            iterations: 10,
            depth: 3,
            ..Default::default()
        }),
        ..Default::default()
    };
    training::run(&config).unwrap();
}

async fn serve_one_request(dir: &TempDir) -> Value {
    let config = ServerConfig {
        settings_path: dir.path().join(SETTINGS_FILE),
        ..Default::default()
    };
    let state = AppState::initialize(config, &RuntimeRegistry::default(), None)
        .await
        .unwrap();
    assert!(state.runtime.is_ready());

    let rows = r#"{"data": [[58,"M",1499201232,1504293512.0,5092280.0],[23,"F",1520000000,null,null]]}"#;
    let body = json!({
        "inputs": [{"name": "predict_request", "shape": [rows.len()], "datatype": "BYTES", "data": [rows]}]
    });
    let request = Request::builder()
        .method("POST")
        .uri("/v2/models/uplift-predictor/infer")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let response: Value = serde_json::from_slice(&bytes).unwrap();
    let text = response["outputs"][0]["data"][0].as_str().unwrap().to_string();
    decode_double_json(text.as_bytes()).unwrap()
}

#[tokio::test]
async fn test_trained_solo_model_serves_predictions() {
    let dir = TempDir::new().unwrap();
    train_into(&dir, vec![StrategyKind::Solo]);
    select(ModelChoice::Default, dir.path().join(SETTINGS_FILE)).unwrap();

    let payload = serve_one_request(&dir).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["prediction"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_switching_to_alt_serves_two_models() {
    let dir = TempDir::new().unwrap();
    train_into(&dir, vec![StrategyKind::Solo, StrategyKind::Two]);
    select(ModelChoice::Alt, dir.path().join(SETTINGS_FILE)).unwrap();

    let payload = serve_one_request(&dir).await;
    assert_eq!(payload["success"], true);
    for score in payload["prediction"].as_array().unwrap() {
        let score = score.as_f64().unwrap();
        assert!((-1.0..=1.0).contains(&score));
    }
}

#[tokio::test]
async fn test_startup_fails_when_artifact_is_missing() {
    let dir = TempDir::new().unwrap();
    select(ModelChoice::Alt, dir.path().join(SETTINGS_FILE)).unwrap();

    let config = ServerConfig {
        settings_path: dir.path().join(SETTINGS_FILE),
        ..Default::default()
    };
    let result = AppState::initialize(config, &RuntimeRegistry::default(), None).await;
    assert!(result.is_err());
}
