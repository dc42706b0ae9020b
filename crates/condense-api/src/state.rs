//! Application state shared across all route handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use condense_core::config::CondenseConfig;
use condense_summarizer::Summarizer;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing here
/// is mutated after startup; per-request settings travel with the request.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<CondenseConfig>,
    /// Summarizer shared by every request.
    pub summarizer: Arc<Summarizer>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: CondenseConfig, summarizer: Summarizer) -> Self {
        Self {
            config: Arc::new(config),
            summarizer: Arc::new(summarizer),
            start_time: Instant::now(),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.upload_dir)
    }

    pub fn summary_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.summary_dir)
    }
}
