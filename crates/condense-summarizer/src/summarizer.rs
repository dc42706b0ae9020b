//! Summarizer orchestrator: dispatches to the extractive or abstractive path.
//!
//! Every call carries its own [`SummarizeOptions`], so a single `Summarizer`
//! can be shared behind an `Arc` by concurrent requests. The only state it
//! holds is the model lifecycle and the defaults fixed at construction.

use std::path::Path;

use condense_core::{Provenance, SummarizeOptions, Summary, SummaryMethod};
use tracing::{debug, error, info, warn};

use crate::error::SummarizerError;
use crate::extractive::ExtractiveSummarizer;
use crate::lifecycle::{ModelLifecycle, ModelState};
use crate::model::{GenerationParams, ModelLoader};

/// Text summarizer with extractive ranking and an optional abstractive model.
#[derive(Debug)]
pub struct Summarizer {
    extractive: ExtractiveSummarizer,
    lifecycle: ModelLifecycle,
    defaults: SummarizeOptions,
}

impl Summarizer {
    /// Build a summarizer.
    ///
    /// When `defaults.method` is abstractive the model is loaded now. If that
    /// load fails the default method is downgraded to extractive for the
    /// lifetime of this instance. Otherwise loading waits for the first
    /// abstractive request.
    pub fn new(defaults: SummarizeOptions, loader: ModelLoader) -> Self {
        let lifecycle = ModelLifecycle::new(loader);
        let mut defaults = defaults;

        if defaults.method == SummaryMethod::Abstractive && !lifecycle.preload() {
            warn!("Abstractive model unavailable; defaulting to extractive summarization");
            defaults.method = SummaryMethod::Extractive;
        }

        info!(
            method = %defaults.method,
            model = lifecycle.state().as_str(),
            "Summarizer initialized"
        );

        Self {
            extractive: ExtractiveSummarizer::new(),
            lifecycle,
            defaults,
        }
    }

    /// Options used by [`Summarizer::summarize_default`].
    pub fn default_options(&self) -> SummarizeOptions {
        self.defaults
    }

    pub fn model_state(&self) -> ModelState {
        self.lifecycle.state()
    }

    /// Summarize `text` with the given options.
    ///
    /// Never fails. Empty or whitespace-only input yields an empty summary;
    /// abstractive failures fall back to the extractive result.
    pub fn summarize(&self, text: &str, opts: &SummarizeOptions) -> Summary {
        if text.trim().is_empty() {
            return Summary::empty(opts.method);
        }
        match opts.method {
            SummaryMethod::Extractive => self.extractive_summary(text),
            SummaryMethod::Abstractive => self.abstractive_summarize(text, opts),
        }
    }

    /// Summarize `text` with the construction-time defaults.
    pub fn summarize_default(&self, text: &str) -> Summary {
        self.summarize(text, &self.defaults)
    }

    /// Summarize a UTF-8 text file.
    ///
    /// A file that cannot be read or decoded is logged and yields an empty
    /// summary tagged [`Provenance::Unreadable`].
    pub fn summarize_file(&self, path: &Path, opts: &SummarizeOptions) -> Summary {
        match self.try_summarize_file(path, opts) {
            Ok(summary) => summary,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to summarize file");
                Summary::unreadable(opts.method, e.to_string())
            }
        }
    }

    /// Like [`Summarizer::summarize_file`], but read failures are returned.
    pub fn try_summarize_file(
        &self,
        path: &Path,
        opts: &SummarizeOptions,
    ) -> Result<Summary, SummarizerError> {
        let text = std::fs::read_to_string(path).map_err(|e| SummarizerError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), bytes = text.len(), "Read input file");
        Ok(self.summarize(&text, opts))
    }

    fn extractive_summary(&self, text: &str) -> Summary {
        let extract = self.extractive.summarize(text);
        let provenance = if extract.passthrough {
            Provenance::Passthrough
        } else {
            Provenance::Native
        };
        Summary {
            text: extract.text,
            method: SummaryMethod::Extractive,
            provenance,
        }
    }

    /// Abstractive summary of non-empty `text`, falling back to extractive
    /// output when the model is unavailable or fails.
    pub fn abstractive_summarize(&self, text: &str, opts: &SummarizeOptions) -> Summary {
        match self.generate(text, opts) {
            Ok(generated) => Summary {
                text: generated,
                method: SummaryMethod::Abstractive,
                provenance: Provenance::Native,
            },
            Err(e) => {
                warn!(error = %e, "Abstractive summarization failed; using extractive fallback");
                Summary {
                    text: self.extractive.summarize(text).text,
                    method: SummaryMethod::Extractive,
                    provenance: Provenance::Fallback {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    fn generate(&self, text: &str, opts: &SummarizeOptions) -> Result<String, SummarizerError> {
        let model = self.lifecycle.acquire()?;
        let params = GenerationParams::new(opts.max_length, opts.min_length);
        let out = model.generate(text, &params)?;
        if out.trim().is_empty() {
            return Err(SummarizerError::ModelInference(
                "model returned empty output".to_string(),
            ));
        }
        Ok(out)
    }
}
