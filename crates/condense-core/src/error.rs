use thiserror::Error;

/// Top-level error type for the Condense service.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for CondenseError` so that the `?` operator works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CondenseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CondenseError {
    fn from(err: toml::de::Error) -> Self {
        CondenseError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CondenseError {
    fn from(err: serde_json::Error) -> Self {
        CondenseError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Condense operations.
pub type Result<T> = std::result::Result<T, CondenseError>;
