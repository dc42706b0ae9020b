//! ONNX Runtime backend for an exported BART-style encoder-decoder.
//!
//! The model directory must contain:
//! - `encoder_model.onnx` (inputs `input_ids`, `attention_mask`)
//! - `decoder_model.onnx` (inputs `input_ids`, `encoder_attention_mask`,
//!   `encoder_hidden_states`; output `logits`)
//! - `tokenizer.json`, the HuggingFace fast-tokenizer file
//!
//! Decoding is greedy so output is reproducible. Generation starts from the
//! decoder start token, forces BOS as the first token, suppresses EOS until
//! `min_length`, forbids repeated n-grams, and stops at EOS or `max_length`.
//!
//! Requires the `onnx` feature. Without it, [`OnnxBartModel::load`] always
//! fails and abstractive requests fall back to extractive.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use condense_core::config::SummarizerSettings;

use crate::error::SummarizerError;
use crate::model::{ModelLoader, SummarizationModel};

pub const ENCODER_FILE: &str = "encoder_model.onnx";
pub const DECODER_FILE: &str = "decoder_model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Default model directory name under `~/.condense/models`.
pub const DEFAULT_MODEL_NAME: &str = "bart-large-cnn";

const BOS_TOKEN_ID: i64 = 0;
const EOS_TOKEN_ID: i64 = 2;
const DECODER_START_TOKEN_ID: i64 = 2;

/// Resolve the configured model directory, defaulting to
/// `~/.condense/models/bart-large-cnn`.
pub fn resolve_model_dir(model_dir: &str) -> PathBuf {
    if !model_dir.is_empty() {
        return PathBuf::from(model_dir);
    }
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".condense")
        .join("models")
        .join(DEFAULT_MODEL_NAME)
}

/// Check that every required file is present in `dir`.
pub fn check_model_dir(dir: &Path) -> Result<(), SummarizerError> {
    for file in [ENCODER_FILE, DECODER_FILE, TOKENIZER_FILE] {
        let path = dir.join(file);
        if !path.exists() {
            return Err(SummarizerError::ModelLoad(format!(
                "{} not found at {}",
                file,
                path.display()
            )));
        }
    }
    Ok(())
}

/// Loader for the ONNX backend described by `settings`.
pub fn onnx_loader(settings: &SummarizerSettings) -> ModelLoader {
    let dir = resolve_model_dir(&settings.model_dir);
    let max_input_tokens = settings.max_input_tokens;
    let no_repeat_ngram_size = settings.no_repeat_ngram_size;
    Box::new(move || {
        let model = OnnxBartModel::load(&dir, max_input_tokens, no_repeat_ngram_size)?;
        let model: Arc<dyn SummarizationModel> = Arc::new(model);
        Ok(model)
    })
}

// ---------------------------------------------------------------------------
// Decoding rules
// ---------------------------------------------------------------------------

/// Tokens that would complete an n-gram already present in `history`.
pub fn banned_ngram_tokens(history: &[i64], n: usize) -> Vec<i64> {
    if n == 0 || history.len() + 1 < n {
        return Vec::new();
    }
    let prefix = &history[history.len() + 1 - n..];
    let mut banned: Vec<i64> = history
        .windows(n)
        .filter(|w| &w[..n - 1] == prefix)
        .map(|w| w[n - 1])
        .collect();
    banned.sort_unstable();
    banned.dedup();
    banned
}

/// Choose the next decoder token given the logits for the last position.
///
/// `history` holds every decoder token so far, the start token included.
/// Equal logits resolve to the lowest token id.
pub fn next_token(
    logits: &[f32],
    history: &[i64],
    max_length: usize,
    min_length: usize,
    no_repeat_ngram_size: usize,
) -> i64 {
    let cur_len = history.len();
    if cur_len == 1 {
        return BOS_TOKEN_ID;
    }
    if cur_len + 1 >= max_length {
        return EOS_TOKEN_ID;
    }

    let banned = banned_ngram_tokens(history, no_repeat_ngram_size);
    let suppress_eos = cur_len < min_length;

    let mut best: Option<(usize, f32)> = None;
    for (id, &score) in logits.iter().enumerate() {
        let token = id as i64;
        if !score.is_finite()
            || (suppress_eos && token == EOS_TOKEN_ID)
            || banned.binary_search(&token).is_ok()
        {
            continue;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((id, score));
        }
    }
    best.map_or(EOS_TOKEN_ID, |(id, _)| id as i64)
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[cfg(feature = "onnx")]
mod backend {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use ort::session::Session;
    use ort::value::TensorRef;
    use tokenizers::Tokenizer;
    use tracing::{debug, info};

    use super::*;
    use crate::model::GenerationParams;

    /// BART-style summarizer running on ONNX Runtime.
    pub struct OnnxBartModel {
        encoder: Mutex<Session>,
        decoder: Mutex<Session>,
        tokenizer: Arc<Tokenizer>,
        name: String,
        max_input_tokens: usize,
        no_repeat_ngram_size: usize,
    }

    fn open_session(path: &Path) -> Result<Session, SummarizerError> {
        Session::builder()
            .map_err(|e| SummarizerError::ModelLoad(format!("ONNX session builder: {}", e)))?
            .with_intra_threads(1)
            .map_err(|e| SummarizerError::ModelLoad(format!("ONNX set threads: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| {
                SummarizerError::ModelLoad(format!("ONNX load {}: {}", path.display(), e))
            })
    }

    impl OnnxBartModel {
        /// Load encoder, decoder and tokenizer from `dir`.
        pub fn load(
            dir: &Path,
            max_input_tokens: usize,
            no_repeat_ngram_size: usize,
        ) -> Result<Self, SummarizerError> {
            check_model_dir(dir)?;

            let encoder = open_session(&dir.join(ENCODER_FILE))?;
            let decoder = open_session(&dir.join(DECODER_FILE))?;
            let tokenizer = Tokenizer::from_file(dir.join(TOKENIZER_FILE)).map_err(|e| {
                SummarizerError::ModelLoad(format!("Failed to load tokenizer: {}", e))
            })?;

            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());

            info!(model = %dir.display(), "Loaded ONNX summarization model");

            Ok(Self {
                encoder: Mutex::new(encoder),
                decoder: Mutex::new(decoder),
                tokenizer: Arc::new(tokenizer),
                name,
                max_input_tokens: max_input_tokens.max(2),
                no_repeat_ngram_size,
            })
        }

        fn encode_input(&self, text: &str) -> Result<Vec<i64>, SummarizerError> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| SummarizerError::Tokenization(e.to_string()))?;
            let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            if ids.len() > self.max_input_tokens {
                debug!(
                    tokens = ids.len(),
                    limit = self.max_input_tokens,
                    "Truncating model input"
                );
                ids.truncate(self.max_input_tokens - 1);
                ids.push(EOS_TOKEN_ID);
            }
            Ok(ids)
        }

        /// Run the encoder; returns hidden states as `(seq_len, hidden, data)`.
        fn run_encoder(
            &self,
            ids: &[i64],
        ) -> Result<(usize, usize, Vec<f32>), SummarizerError> {
            let seq_len = ids.len();
            let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), ids.to_vec())
                .map_err(|e| SummarizerError::ModelInference(format!("input_ids array: {}", e)))?;
            let mask_array = ndarray::Array2::from_elem((1, seq_len), 1i64);

            let ids_ref = TensorRef::from_array_view(&ids_array).map_err(|e| {
                SummarizerError::ModelInference(format!("TensorRef input_ids: {}", e))
            })?;
            let mask_ref = TensorRef::from_array_view(&mask_array).map_err(|e| {
                SummarizerError::ModelInference(format!("TensorRef attention_mask: {}", e))
            })?;

            let mut session = self.encoder.lock().map_err(|e| {
                SummarizerError::ModelInference(format!("Encoder lock poisoned: {}", e))
            })?;
            let outputs = session
                .run(ort::inputs![
                    "input_ids" => ids_ref,
                    "attention_mask" => mask_ref
                ])
                .map_err(|e| SummarizerError::ModelInference(format!("Encoder run: {}", e)))?;

            // [1, seq_len, hidden]
            let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
                SummarizerError::ModelInference(format!("Extract hidden states: {}", e))
            })?;
            let dims: Vec<i64> = shape.iter().copied().collect();
            let hidden = match dims.as_slice() {
                [_, s, h] if *s as usize == seq_len => *h as usize,
                other => {
                    return Err(SummarizerError::ModelInference(format!(
                        "Unexpected encoder output shape: {:?}",
                        other
                    )))
                }
            };
            Ok((seq_len, hidden, data.to_vec()))
        }

        /// Logits for the last decoder position.
        fn decode_step(
            &self,
            history: &[i64],
            encoder_mask: &ndarray::Array2<i64>,
            hidden_states: &ndarray::Array3<f32>,
        ) -> Result<Vec<f32>, SummarizerError> {
            let dec_len = history.len();
            let ids_array = ndarray::Array2::from_shape_vec((1, dec_len), history.to_vec())
                .map_err(|e| {
                    SummarizerError::ModelInference(format!("decoder ids array: {}", e))
                })?;

            let ids_ref = TensorRef::from_array_view(&ids_array).map_err(|e| {
                SummarizerError::ModelInference(format!("TensorRef decoder ids: {}", e))
            })?;
            let mask_ref = TensorRef::from_array_view(encoder_mask).map_err(|e| {
                SummarizerError::ModelInference(format!("TensorRef encoder mask: {}", e))
            })?;
            let states_ref = TensorRef::from_array_view(hidden_states).map_err(|e| {
                SummarizerError::ModelInference(format!("TensorRef hidden states: {}", e))
            })?;

            let mut session = self.decoder.lock().map_err(|e| {
                SummarizerError::ModelInference(format!("Decoder lock poisoned: {}", e))
            })?;
            let outputs = session
                .run(ort::inputs![
                    "input_ids" => ids_ref,
                    "encoder_attention_mask" => mask_ref,
                    "encoder_hidden_states" => states_ref
                ])
                .map_err(|e| SummarizerError::ModelInference(format!("Decoder run: {}", e)))?;

            // [1, dec_len, vocab]
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| SummarizerError::ModelInference(format!("Extract logits: {}", e)))?;
            let vocab = shape.last().copied().unwrap_or(0) as usize;
            if vocab == 0 || data.len() < dec_len * vocab {
                return Err(SummarizerError::ModelInference(format!(
                    "Unexpected logits shape: {:?}",
                    shape.iter().collect::<Vec<_>>()
                )));
            }
            let offset = (dec_len - 1) * vocab;
            Ok(data[offset..offset + vocab].to_vec())
        }
    }

    impl SummarizationModel for OnnxBartModel {
        fn generate(
            &self,
            text: &str,
            params: &GenerationParams,
        ) -> Result<String, SummarizerError> {
            let ids = self.encode_input(text)?;
            let (seq_len, hidden, states) = self.run_encoder(&ids)?;

            let encoder_mask = ndarray::Array2::from_elem((1, seq_len), 1i64);
            let hidden_states = ndarray::Array3::from_shape_vec((1, seq_len, hidden), states)
                .map_err(|e| SummarizerError::ModelInference(format!("hidden states: {}", e)))?;

            // The start token counts toward max_length.
            let max_length = params.max_length.max(2);
            let mut history = vec![DECODER_START_TOKEN_ID];
            while history.len() < max_length {
                let logits = self.decode_step(&history, &encoder_mask, &hidden_states)?;
                let token = next_token(
                    &logits,
                    &history,
                    max_length,
                    params.min_length,
                    self.no_repeat_ngram_size,
                );
                history.push(token);
                if token == EOS_TOKEN_ID {
                    break;
                }
            }

            let out: Vec<u32> = history[1..].iter().map(|&t| t as u32).collect();
            let text = self
                .tokenizer
                .decode(&out, true)
                .map_err(|e| SummarizerError::Tokenization(e.to_string()))?;

            debug!(
                input_tokens = seq_len,
                output_tokens = out.len(),
                "Abstractive generation finished"
            );
            Ok(text.trim().to_string())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

#[cfg(feature = "onnx")]
pub use backend::OnnxBartModel;

/// Placeholder when the `onnx` feature is disabled.
#[cfg(not(feature = "onnx"))]
pub struct OnnxBartModel {
    _private: (),
}

#[cfg(not(feature = "onnx"))]
impl OnnxBartModel {
    pub fn load(
        dir: &Path,
        _max_input_tokens: usize,
        _no_repeat_ngram_size: usize,
    ) -> Result<Self, SummarizerError> {
        check_model_dir(dir)?;
        Err(SummarizerError::ModelLoad(
            "built without the `onnx` feature; abstractive summarization is unavailable"
                .to_string(),
        ))
    }
}

#[cfg(not(feature = "onnx"))]
impl SummarizationModel for OnnxBartModel {
    fn generate(
        &self,
        _text: &str,
        _params: &crate::model::GenerationParams,
    ) -> Result<String, SummarizerError> {
        Err(SummarizerError::ModelUnavailable(
            "onnx feature disabled".to_string(),
        ))
    }

    fn name(&self) -> &str {
        DEFAULT_MODEL_NAME
    }
}
