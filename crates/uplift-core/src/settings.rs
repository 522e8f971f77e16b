//! Model settings file and the artifact switcher
//!
//! The settings file is the only link between training output and the
//! serving host: it names the model, the runtime that serves it, and the
//! artifact the runtime loads at startup.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Default settings file name, relative to the working directory
pub const SETTINGS_FILE: &str = "model-config.json";

/// Name the model is served under
pub const MODEL_NAME: &str = "uplift-predictor";

/// Runtime locator resolved by the server's runtime registry
pub const RUNTIME_IMPLEMENTATION: &str = "uplift_server.UpliftRuntime";

/// Settings document read by the serving host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Name the model is served under
    pub name: String,

    /// Runtime locator
    pub implementation: String,

    /// Runtime parameters
    pub parameters: ModelParameters,
}

/// Parameters handed to the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Artifact location, relative to the settings file or absolute
    pub uri: String,

    /// Optional model version reported in responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ModelSettings {
    /// Settings for the uplift runtime pointing at `uri`
    pub fn for_uri(uri: impl Into<String>) -> Self {
        Self {
            name: MODEL_NAME.to_string(),
            implementation: RUNTIME_IMPLEMENTATION.to_string(),
            parameters: ModelParameters {
                uri: uri.into(),
                version: None,
            },
        }
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read settings {}: {}", path.display(), e))
        })?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as JSON with a 4-space indent
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;

        let mut file = fs::File::create(path.as_ref())?;
        file.write_all(&buf)?;
        file.flush()?;
        Ok(())
    }

    /// Check required fields are populated
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("settings name must not be empty"));
        }
        if self.implementation.trim().is_empty() {
            return Err(Error::config("settings implementation must not be empty"));
        }
        if self.parameters.uri.trim().is_empty() {
            return Err(Error::config("settings parameters.uri must not be empty"));
        }
        Ok(())
    }
}

/// Which pre-trained artifact the host should serve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    /// Solo-model strategy
    Default,
    /// Two-model strategy
    Alt,
}

impl ModelChoice {
    /// All accepted selectors
    pub const ALL: [ModelChoice; 2] = [ModelChoice::Default, ModelChoice::Alt];

    /// Artifact file name produced by training for this choice
    pub fn artifact_uri(&self) -> &'static str {
        match self {
            Self::Default => "one_model.json",
            Self::Alt => "two_model.json",
        }
    }

    /// Selector string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Alt => "alt",
        }
    }

    /// Settings document for this choice
    pub fn settings(&self) -> ModelSettings {
        ModelSettings::for_uri(self.artifact_uri())
    }
}

impl FromStr for ModelChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(Self::Default),
            "alt" => Ok(Self::Alt),
            other => Err(Error::invalid_argument(format!(
                "invalid model type '{}', choose either 'default' or 'alt'",
                other
            ))),
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a settings switch
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOutcome {
    /// File that was written
    pub path: PathBuf,

    /// Whether a previous settings file was replaced
    pub replaced: bool,

    /// Document that was written
    pub settings: ModelSettings,
}

/// Overwrite the settings file at `path` so it points at the artifact for
/// `choice`. A missing file is not an error; it is created.
pub fn select(choice: ModelChoice, path: impl AsRef<Path>) -> Result<SelectOutcome> {
    let path = path.as_ref();
    let settings = choice.settings();

    let replaced = match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed previous settings file {}", path.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(
                "Notice: the file {} was not found and will be created",
                path.display()
            );
            false
        }
        Err(e) => return Err(e.into()),
    };

    settings.save(path)?;
    info!(
        "Model settings for '{}' written to {} (uri: {})",
        choice,
        path.display(),
        settings.parameters.uri
    );

    Ok(SelectOutcome {
        path: path.to_path_buf(),
        replaced,
        settings,
    })
}

/// Parse `selector` and switch the settings file.
///
/// The selector is validated before the file system is touched.
pub fn select_by_name(selector: &str, path: impl AsRef<Path>) -> Result<SelectOutcome> {
    let choice: ModelChoice = selector.parse()?;
    select(choice, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_each_choice_writes_its_uri() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        for choice in ModelChoice::ALL {
            select(choice, &path).unwrap();
            let written = ModelSettings::load(&path).unwrap();
            assert_eq!(written.parameters.uri, choice.artifact_uri());
            assert_eq!(written.name, MODEL_NAME);
            assert_eq!(written.implementation, RUNTIME_IMPLEMENTATION);
        }
    }

    #[test]
    fn test_invalid_choice_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let err = select_by_name("solo", &path).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let outcome = select(ModelChoice::Alt, &path).unwrap();
        assert!(!outcome.replaced);
        assert!(path.exists());
    }

    #[test]
    fn test_switch_overwrites_instead_of_merging() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"{"name": "old", "implementation": "x", "parameters": {"uri": "a", "version": "7"}, "extra": 1}"#,
        )
        .unwrap();

        let outcome = select(ModelChoice::Default, &path).unwrap();
        assert!(outcome.replaced);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("extra").is_none());
        assert!(raw["parameters"].get("version").is_none());
        assert_eq!(raw["name"], MODEL_NAME);
    }

    #[test]
    fn test_settings_use_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        select(ModelChoice::Default, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n    \"name\": \"uplift-predictor\""));
        assert!(content.contains("\n        \"uri\": \"one_model.json\""));
    }

    #[test]
    fn test_load_rejects_empty_uri() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"{"name": "m", "implementation": "x", "parameters": {"uri": ""}}"#,
        )
        .unwrap();

        assert!(matches!(ModelSettings::load(&path), Err(Error::Config(_))));
    }
}
