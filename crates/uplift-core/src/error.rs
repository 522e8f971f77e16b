//! Error types for the uplift predictor

/// Result type alias using the uplift predictor's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for uplift predictor operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied a value outside the accepted set
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Payload decoding errors
    #[error("codec error: {0}")]
    Codec(String),

    /// Feature rows that do not match the expected layout
    #[error("shape error: {0}")]
    Shape(String),

    /// Estimator fitting or prediction errors
    #[error("model error: {0}")]
    Model(String),

    /// Artifact resolution or deserialization errors
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Model has not been initialized yet
    #[error("model '{0}' is not ready")]
    NotReady(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new codec error
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Create a new shape error
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
