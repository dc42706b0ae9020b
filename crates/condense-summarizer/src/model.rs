//! Abstractive model trait and a mock implementation.
//!
//! - `OnnxBartModel` (in [`crate::onnx`]) runs an exported encoder-decoder
//!   model through ONNX Runtime. This is the production backend.
//! - `MockSummarizationModel` returns canned output or fails on purpose, for
//!   testing the fallback paths without a model on disk.

use std::sync::Arc;

use crate::error::SummarizerError;

/// Length constraints for generated text, in model tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
}

impl GenerationParams {
    pub fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length: min_length.min(max_length),
        }
    }
}

/// A pretrained sequence-to-sequence summarization model.
///
/// Implementations must decode deterministically: the same input and
/// parameters always produce the same text. Loaded models are shared
/// read-only across threads.
pub trait SummarizationModel: Send + Sync {
    /// Generate a summary of `text`.
    fn generate(&self, text: &str, params: &GenerationParams) -> Result<String, SummarizerError>;

    /// Short identifier for logs and health output.
    fn name(&self) -> &str;
}

/// Produces a model on demand. Called at most once per lifecycle.
pub type ModelLoader =
    Box<dyn Fn() -> Result<Arc<dyn SummarizationModel>, SummarizerError> + Send + Sync>;

// ---------------------------------------------------------------------------
// MockSummarizationModel
// ---------------------------------------------------------------------------

/// Mock model for tests and development.
#[derive(Debug, Clone)]
pub enum MockSummarizationModel {
    /// Always returns this text.
    Fixed(String),
    /// Always fails with this message.
    Failing(String),
    /// Returns the first `max_length` whitespace-separated words of the input.
    Truncating,
}

impl MockSummarizationModel {
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::Fixed(text.into())
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::Failing(reason.into())
    }

    /// Loader that hands out this mock.
    pub fn loader(self) -> ModelLoader {
        let model: Arc<dyn SummarizationModel> = Arc::new(self);
        Box::new(move || Ok(Arc::clone(&model)))
    }
}

impl SummarizationModel for MockSummarizationModel {
    fn generate(&self, text: &str, params: &GenerationParams) -> Result<String, SummarizerError> {
        match self {
            Self::Fixed(out) => Ok(out.clone()),
            Self::Failing(reason) => Err(SummarizerError::ModelInference(reason.clone())),
            Self::Truncating => Ok(text
                .split_whitespace()
                .take(params.max_length)
                .collect::<Vec<_>>()
                .join(" ")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Loader that always fails, as when the model files are missing.
pub fn unavailable_loader(reason: impl Into<String>) -> ModelLoader {
    let reason = reason.into();
    Box::new(move || Err(SummarizerError::ModelLoad(reason.clone())))
}
