//! Process-level tests for uplift-choose

use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn choose(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_uplift-choose"))
        .args(args)
        .env("UPLIFT_MODEL_CONFIG", dir.path().join("model-config.json"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn written(dir: &TempDir) -> Value {
    let text = fs::read_to_string(dir.path().join("model-config.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_default_and_alt_write_their_uri() {
    let dir = TempDir::new().unwrap();
    for (choice, uri) in [("default", "one_model.json"), ("alt", "two_model.json")] {
        let output = choose(&dir, &[choice]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("model-config.json"));

        let settings = written(&dir);
        assert_eq!(settings["parameters"]["uri"], uri);
        assert_eq!(settings["name"], "uplift-predictor");
        assert_eq!(settings["implementation"], "uplift_server.UpliftRuntime");
    }
}

#[test]
fn test_settings_are_indented_with_four_spaces() {
    let dir = TempDir::new().unwrap();
    assert!(choose(&dir, &["default"]).status.success());
    let text = fs::read_to_string(dir.path().join("model-config.json")).unwrap();
    assert!(text.contains("\n    \"name\": \"uplift-predictor\""));
}

#[test]
fn test_missing_file_is_created_with_notice() {
    let dir = TempDir::new().unwrap();
    let output = choose(&dir, &["alt"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("was not found and will be created"));
    assert!(dir.path().join("model-config.json").exists());
}

#[test]
fn test_invalid_choice_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let output = choose(&dir, &["solo"]);
    assert_eq!(output.status.code(), Some(255));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage error: The script takes exactly 1 argument: {default, alt}"));
    assert!(!dir.path().join("model-config.json").exists());
}

#[test]
fn test_wrong_arity_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    for args in [&[][..], &["default", "alt"][..]] {
        let output = choose(&dir, args);
        assert_eq!(output.status.code(), Some(255));
        assert!(!dir.path().join("model-config.json").exists());
    }
}

#[test]
fn test_invalid_choice_keeps_existing_file() {
    let dir = TempDir::new().unwrap();
    assert!(choose(&dir, &["alt"]).status.success());
    let before = written(&dir);

    assert_eq!(choose(&dir, &["both"]).status.code(), Some(255));
    assert_eq!(written(&dir), before);
}
