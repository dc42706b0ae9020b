//! Condense summarizer crate - sentence splitting, TF-IDF extraction, and
//! model-backed abstractive summaries.
//!
//! Provides:
//! - Sentence boundary detection that respects abbreviations and decimals
//! - Extractive summaries ranked by TF-IDF sentence weight
//! - Abstractive summaries from an ONNX encoder-decoder (`onnx` feature)
//! - A [`Summarizer`] that falls back to extractive output when the model
//!   cannot be loaded or fails at inference time

pub mod error;
pub mod extractive;
pub mod lifecycle;
pub mod model;
pub mod onnx;
pub mod preprocess;
pub mod stopwords;
pub mod summarizer;

pub use error::SummarizerError;
pub use extractive::{extractive_summarize, ExtractiveSummarizer, TfIdfModel};
pub use lifecycle::{ModelLifecycle, ModelState};
pub use model::{
    unavailable_loader, GenerationParams, MockSummarizationModel, ModelLoader, SummarizationModel,
};
pub use onnx::{onnx_loader, OnnxBartModel};
pub use preprocess::{preprocess, Sentence};
pub use summarizer::Summarizer;
