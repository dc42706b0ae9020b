//! Condense application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Create the upload and summary directories
//! 4. Build the summarizer (loading the abstractive model if it is the default)
//! 5. Start the REST API server

mod cli;

use clap::Parser;

use condense_api::routes;
use condense_api::state::AppState;
use condense_core::config::CondenseConfig;
use condense_summarizer::{onnx_loader, Summarizer};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can apply.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = if config_file.exists() {
        match CondenseConfig::load(&config_file) {
            Ok(c) => (c, None),
            Err(e) => (CondenseConfig::default(), Some(e)),
        }
    } else {
        (CondenseConfig::default(), None)
    };
    args.apply(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Condense v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config. Using defaults."
        ),
        None if config_file.exists() => {
            tracing::info!(path = %config_file.display(), "Configuration loaded")
        }
        None => tracing::info!(path = %config_file.display(), "No config file, using defaults"),
    }
    config.validate()?;

    // Storage directories.
    for dir in [&config.storage.upload_dir, &config.storage.summary_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!(path = %dir, error = %e, "Failed to create storage directory");
            return Err(e.into());
        }
    }

    // Summarizer. An abstractive default loads the model now; a failed load
    // leaves the server running in extractive mode.
    let summarizer = Summarizer::new(
        config.summarizer.options(),
        onnx_loader(&config.summarizer),
    );
    tracing::info!(
        method = %summarizer.default_options().method,
        model = %summarizer.model_state(),
        "Summarizer ready"
    );

    // === API server ===

    let state = AppState::new(config, summarizer);
    routes::start_server(state).await?;

    Ok(())
}
