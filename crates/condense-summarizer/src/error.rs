use condense_core::CondenseError;
use thiserror::Error;

/// Errors that can occur while summarizing.
///
/// None of these reach callers of [`crate::Summarizer::summarize`]; they are
/// recovered locally and recorded in the summary's provenance.
#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("model load failed: {0}")]
    ModelLoad(String),
    #[error("model inference failed: {0}")]
    ModelInference(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("tokenization failed: {0}")]
    Tokenization(String),
    #[error("cannot read {path}: {reason}")]
    FileRead { path: String, reason: String },
}

impl From<SummarizerError> for CondenseError {
    fn from(err: SummarizerError) -> Self {
        match err {
            SummarizerError::FileRead { .. } => CondenseError::Storage(err.to_string()),
            other => CondenseError::Summarization(other.to_string()),
        }
    }
}
