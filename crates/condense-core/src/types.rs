use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CondenseError;

// =============================================================================
// Enums
// =============================================================================

/// How a summary is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMethod {
    /// Select a subset of the original sentences by TF-IDF weight.
    #[default]
    Extractive,
    /// Generate new text with a pretrained encoder-decoder model.
    Abstractive,
}

impl SummaryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extractive => "extractive",
            Self::Abstractive => "abstractive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "extractive" => Some(Self::Extractive),
            "abstractive" => Some(Self::Abstractive),
            _ => None,
        }
    }
}

impl fmt::Display for SummaryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryMethod {
    type Err = CondenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim().to_ascii_lowercase().as_str()).ok_or_else(|| {
            CondenseError::Config(format!(
                "Unknown summarization method '{}'. Must be one of: extractive, abstractive",
                s
            ))
        })
    }
}

// =============================================================================
// Per-call options
// =============================================================================

/// Options for a single summarization call.
///
/// Passed by reference into every call instead of being stored on the
/// summarizer, so concurrent requests never observe each other's settings.
/// `max_length` and `min_length` only constrain abstractive generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeOptions {
    pub method: SummaryMethod,
    pub max_length: usize,
    pub min_length: usize,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            method: SummaryMethod::Extractive,
            max_length: 150,
            min_length: 40,
        }
    }
}

impl SummarizeOptions {
    pub fn new(method: SummaryMethod, max_length: usize, min_length: usize) -> Self {
        Self {
            method,
            max_length,
            min_length,
        }
    }

    pub fn extractive() -> Self {
        Self::default()
    }

    pub fn abstractive(max_length: usize, min_length: usize) -> Self {
        Self::new(SummaryMethod::Abstractive, max_length, min_length)
    }

    /// Copy of these options with a different method.
    pub fn with_method(self, method: SummaryMethod) -> Self {
        Self { method, ..self }
    }

    /// Check the length bounds.
    pub fn validate(&self) -> Result<(), CondenseError> {
        if self.max_length == 0 {
            return Err(CondenseError::Config(
                "max_length must be greater than 0".to_string(),
            ));
        }
        if self.min_length > self.max_length {
            return Err(CondenseError::Config(format!(
                "min_length ({}) must not exceed max_length ({})",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Results
// =============================================================================

/// Where the text of a [`Summary`] came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Produced by the requested method.
    Native,
    /// Document was too short to shorten and is returned unchanged.
    Passthrough,
    /// Abstractive generation failed or was unavailable; the extractive
    /// ranker produced the text instead.
    Fallback { reason: String },
    /// Input was empty or whitespace only.
    EmptyInput,
    /// The input file could not be read as UTF-8 text.
    Unreadable { reason: String },
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Passthrough => "passthrough",
            Self::Fallback { .. } => "fallback",
            Self::EmptyInput => "empty_input",
            Self::Unreadable { .. } => "unreadable",
        }
    }

    /// Whether this result was recovered from a failure.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback { .. } | Self::Unreadable { .. })
    }
}

/// A summary string tagged with how it was produced.
///
/// `text` is always usable as a best-effort result; `provenance` lets callers
/// tell an empty document apart from a failed read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    /// The method that actually produced `text`.
    pub method: SummaryMethod,
    pub provenance: Provenance,
}

impl Summary {
    pub fn empty(method: SummaryMethod) -> Self {
        Self {
            text: String::new(),
            method,
            provenance: Provenance::EmptyInput,
        }
    }

    pub fn unreadable(method: SummaryMethod, reason: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            method,
            provenance: Provenance::Unreadable {
                reason: reason.into(),
            },
        }
    }
}
