//! Artifact URI resolution
//!
//! `parameters.uri` in the model settings may be:
//! - a path relative to the directory holding the settings file
//! - an absolute path
//! - a `file://` URL

use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Artifact location errors
#[derive(Debug, Error)]
pub enum UriError {
    #[error("Invalid artifact URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URI scheme '{0}' is not supported, only local files and file:// are")]
    UnsupportedScheme(String),

    #[error("URL '{0}' does not name a local file path")]
    NotALocalPath(String),

    #[error("Artifact URI must not be empty")]
    Empty,

    #[error("Artifact not found at {0}")]
    NotFound(PathBuf),
}

impl From<UriError> for uplift_core::Error {
    fn from(err: UriError) -> Self {
        uplift_core::Error::artifact(err.to_string())
    }
}

/// Resolve `uri` to an existing artifact file.
///
/// Relative paths are taken against `base_dir`.
pub fn resolve_artifact_uri(uri: &str, base_dir: &Path) -> Result<PathBuf, UriError> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(UriError::Empty);
    }

    let path = if uri.contains("://") {
        let url = Url::parse(uri)?;
        match url.scheme() {
            "file" => url
                .to_file_path()
                .map_err(|_| UriError::NotALocalPath(uri.to_string()))?,
            scheme => return Err(UriError::UnsupportedScheme(scheme.to_string())),
        }
    } else {
        let candidate = PathBuf::from(uri);
        if candidate.is_absolute() {
            candidate
        } else {
            base_dir.join(candidate)
        }
    };

    if !path.is_file() {
        return Err(UriError::NotFound(path));
    }
    Ok(path)
}
