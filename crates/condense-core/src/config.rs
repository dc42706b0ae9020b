use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CondenseError, Result};
use crate::types::{SummarizeOptions, SummaryMethod};

/// Top-level configuration for the Condense service.
///
/// Loaded from `~/.condense/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CondenseConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub summarizer: SummarizerSettings,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl CondenseConfig {
    /// Read and parse a TOML file.
    ///
    /// Values are not validated here; command-line overrides are applied
    /// first and the caller runs [`CondenseConfig::validate`] once after.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(CondenseError::Config("server.port must not be 0".into()));
        }
        if self.storage.allowed_extensions.is_empty() {
            return Err(CondenseError::Config(
                "storage.allowed_extensions must not be empty".into(),
            ));
        }
        self.summarizer.options().validate()
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies, uploads included.
    pub max_upload_bytes: usize,
    /// Requests per second accepted on the summarization routes. 0 disables
    /// the limit.
    pub rate_limit_per_sec: u64,
    /// Directory holding the browser frontend (`index.html`).
    pub frontend_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
            rate_limit_per_sec: 50,
            frontend_dir: "../frontend".to_string(),
        }
    }
}

/// Summarizer defaults and model location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Default method when a request does not name one.
    pub method: SummaryMethod,
    /// Maximum generated length in tokens (abstractive only).
    pub max_length: usize,
    /// Minimum generated length in tokens (abstractive only).
    pub min_length: usize,
    /// Directory with the exported seq2seq model (`encoder_model.onnx`,
    /// `decoder_model.onnx`, `tokenizer.json`). Empty means
    /// `~/.condense/models/bart-large-cnn`.
    pub model_dir: String,
    /// Input is truncated to this many tokens before encoding.
    pub max_input_tokens: usize,
    /// Size of n-grams that may not repeat in generated text. 0 disables.
    pub no_repeat_ngram_size: usize,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            method: SummaryMethod::Extractive,
            max_length: 150,
            min_length: 40,
            model_dir: String::new(),
            max_input_tokens: 1024,
            no_repeat_ngram_size: 3,
        }
    }
}

impl SummarizerSettings {
    /// Per-call options derived from these defaults.
    pub fn options(&self) -> SummarizeOptions {
        SummarizeOptions::new(self.method, self.max_length, self.min_length)
    }
}

/// Where uploads and generated summaries are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub summary_dir: String,
    /// Lowercase file extensions accepted by the upload endpoint.
    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: "uploads".to_string(),
            summary_dir: "summaries".to_string(),
            allowed_extensions: ["txt", "pdf", "docx", "md"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl StorageConfig {
    /// Whether `filename` has an accepted extension (case-insensitive).
    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|a| *a == ext)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = CondenseConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.summarizer.method, SummaryMethod::Extractive);
        assert_eq!(config.summarizer.max_length, 150);
        assert_eq!(config.summarizer.min_length, 40);
        assert_eq!(config.storage.upload_dir, "uploads");
        assert_eq!(config.storage.summary_dir, "summaries");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[server]
host = "127.0.0.1"
port = 8080
rate_limit_per_sec = 5

[summarizer]
method = "abstractive"
max_length = 200
min_length = 20
model_dir = "/models/bart"

[storage]
upload_dir = "/var/condense/in"
summary_dir = "/var/condense/out"
allowed_extensions = ["txt"]
"#;
        let file = create_temp_config(content);
        let config = CondenseConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.rate_limit_per_sec, 5);
        assert_eq!(config.summarizer.method, SummaryMethod::Abstractive);
        assert_eq!(config.summarizer.max_length, 200);
        assert_eq!(config.summarizer.model_dir, "/models/bart");
        assert_eq!(config.storage.allowed_extensions, vec!["txt"]);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[summarizer]
max_length = 300
"#;
        let file = create_temp_config(content);
        let config = CondenseConfig::load(file.path()).unwrap();
        assert_eq!(config.summarizer.max_length, 300);
        assert_eq!(config.summarizer.min_length, 40);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.allowed_extensions.len(), 4);
    }

    #[test]
    fn test_validate_rejects_inverted_lengths() {
        let content = r#"
[summarizer]
max_length = 10
min_length = 50
"#;
        let file = create_temp_config(content);
        let config = CondenseConfig::load(file.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CondenseError::Config(_)));
    }

    #[test]
    fn test_load_rejects_unknown_method() {
        let content = r#"
[summarizer]
method = "lexrank"
"#;
        let file = create_temp_config(content);
        assert!(CondenseConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is [not valid toml");
        let err = CondenseConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CondenseError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CondenseConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, CondenseError::Io(_)));
    }

    #[test]
    fn test_load_does_not_validate() {
        // Port 0 is rejected only once overrides have been applied.
        let file = create_temp_config("[server]\nport = 0\n");
        let mut config = CondenseConfig::load(file.path()).unwrap();
        assert!(config.validate().is_err());
        config.server.port = 5001;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = CondenseConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let mut config = CondenseConfig::default();
        config.storage.allowed_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_summarizer_settings_options() {
        let settings = SummarizerSettings {
            method: SummaryMethod::Abstractive,
            max_length: 120,
            min_length: 30,
            ..Default::default()
        };
        let opts = settings.options();
        assert_eq!(opts.method, SummaryMethod::Abstractive);
        assert_eq!(opts.max_length, 120);
        assert_eq!(opts.min_length, 30);
    }

    #[test]
    fn test_storage_is_allowed() {
        let storage = StorageConfig::default();
        assert!(storage.is_allowed("report.txt"));
        assert!(storage.is_allowed("REPORT.MD"));
        assert!(storage.is_allowed("archive.tar.docx"));
        assert!(!storage.is_allowed("image.png"));
        assert!(!storage.is_allowed("noextension"));
        assert!(!storage.is_allowed(""));
    }
}
