//! Extractive summarization by TF-IDF sentence ranking.
//!
//! Every sentence is treated as a document. Weights follow the usual
//! smoothed TF-IDF scheme: raw term counts, `idf = ln((1 + n) / (1 + df)) + 1`,
//! and L2-normalized rows. A sentence scores the sum of its row.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::preprocess::{preprocess, Sentence};
use crate::stopwords::is_stop_word;

/// Documents with this many sentences or fewer are returned unchanged.
pub const PASSTHROUGH_MAX_SENTENCES: usize = 3;
/// Lower bound on the number of selected sentences.
pub const MIN_SUMMARY_SENTENCES: usize = 3;
/// Upper bound on the number of selected sentences.
pub const MAX_SUMMARY_SENTENCES: usize = 10;

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static token pattern"))
}

/// Lowercase scoring terms of `text`: words of two or more word characters
/// that are not stop words.
pub fn terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Number of sentences to keep for a document of `n` sentences:
/// roughly a third, never fewer than 3 and never more than 10.
pub fn target_sentence_count(n: usize) -> usize {
    (n / 3).clamp(MIN_SUMMARY_SENTENCES, MAX_SUMMARY_SENTENCES)
}

/// TF-IDF weights fitted to a single document's sentences.
///
/// Built fresh for each call and discarded afterwards.
#[derive(Debug, Clone)]
pub struct TfIdfModel {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    scores: Vec<f64>,
}

impl TfIdfModel {
    /// Fit the model to `sentences` and score each one.
    pub fn fit(sentences: &[Sentence<'_>]) -> Self {
        let n = sentences.len();
        let tokenized: Vec<Vec<String>> = sentences.iter().map(|s| terms(s.text)).collect();

        let mut vocabulary = BTreeMap::new();
        for tokens in &tokenized {
            for t in tokens {
                if !vocabulary.contains_key(t) {
                    vocabulary.insert(t.clone(), 0);
                }
            }
        }
        // Column ids in sorted term order.
        for (col, id) in vocabulary.values_mut().enumerate() {
            *id = col;
        }

        let mut df = vec![0usize; vocabulary.len()];
        let counts: Vec<BTreeMap<usize, usize>> = tokenized
            .iter()
            .map(|tokens| {
                let mut row = BTreeMap::new();
                for t in tokens {
                    *row.entry(vocabulary[t]).or_insert(0) += 1;
                }
                for col in row.keys() {
                    df[*col] += 1;
                }
                row
            })
            .collect();

        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n as f64) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let scores = counts
            .iter()
            .map(|row| {
                let weights: Vec<f64> = row
                    .iter()
                    .map(|(&col, &tf)| tf as f64 * idf[col])
                    .collect();
                let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    weights.iter().map(|w| w / norm).sum()
                } else {
                    0.0
                }
            })
            .collect();

        Self {
            vocabulary,
            idf,
            scores,
        }
    }

    /// Per-sentence scores in document order.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Inverse document frequency of a lowercase term, if it was seen.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&col| self.idf[col])
    }

    /// Indices of the `k` highest-scoring sentences, in document order.
    ///
    /// Equal scores are broken in favour of the lower index.
    pub fn top_indices(&self, k: usize) -> Vec<usize> {
        let mut ranked: Vec<usize> = (0..self.scores.len()).collect();
        ranked.sort_by(|&a, &b| {
            self.scores[b]
                .total_cmp(&self.scores[a])
                .then_with(|| a.cmp(&b))
        });
        ranked.truncate(k);
        ranked.sort_unstable();
        ranked
    }
}

/// Result of an extractive pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Extract {
    pub text: String,
    /// Selected sentence indices in document order. Empty on passthrough.
    pub selected: Vec<usize>,
    /// Number of sentences detected in the input.
    pub sentence_count: usize,
    /// The input was short enough to be returned unchanged.
    pub passthrough: bool,
}

/// Stateless TF-IDF extractive summarizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, text: &str) -> Extract {
        let sentences = preprocess(text);
        let n = sentences.len();

        if n <= PASSTHROUGH_MAX_SENTENCES {
            return Extract {
                text: text.to_string(),
                selected: Vec::new(),
                sentence_count: n,
                passthrough: true,
            };
        }

        let model = TfIdfModel::fit(&sentences);
        let selected = model.top_indices(target_sentence_count(n));
        let text = selected
            .iter()
            .map(|&i| sentences[i].text)
            .collect::<Vec<_>>()
            .join(" ");

        tracing::debug!(
            sentences = n,
            selected = selected.len(),
            vocabulary = model.vocabulary_size(),
            "Extractive summary built"
        );

        Extract {
            text,
            selected,
            sentence_count: n,
            passthrough: false,
        }
    }
}

/// Extractive summary of `text` as a plain string.
pub fn extractive_summarize(text: &str) -> String {
    ExtractiveSummarizer::new().summarize(text).text
}
