//! CLI argument definitions for the Condense server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use condense_core::config::CondenseConfig;
use condense_core::SummaryMethod;

/// Condense - document summarization server (extractive and abstractive).
#[derive(Parser, Debug)]
#[command(name = "condense", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind the API server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Default summarization method (extractive, abstractive).
    #[arg(short = 'm', long = "method")]
    pub method: Option<SummaryMethod>,

    /// Directory containing the exported abstractive model.
    #[arg(long = "model-dir")]
    pub model_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CONDENSE_CONFIG env var > ~/.condense/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CONDENSE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > CONDENSE_PORT env var > config file value > 5000.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("CONDENSE_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        5000
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Apply command-line overrides to a loaded configuration.
    pub fn apply(&self, config: &mut CondenseConfig) {
        config.server.port = self.resolve_port(config.server.port);
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(method) = self.method {
            config.summarizer.method = method;
        }
        if let Some(ref dir) = self.model_dir {
            config.summarizer.model_dir = dir.to_string_lossy().into_owned();
        }
        config.general.log_level = self.resolve_log_level(&config.general.log_level);
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".condense").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".condense").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("condense").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = parse(&[
            "-c",
            "/etc/condense.toml",
            "-p",
            "8080",
            "--host",
            "127.0.0.1",
            "-m",
            "abstractive",
            "--model-dir",
            "/models/bart",
            "-l",
            "debug",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/condense.toml")));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.method, Some(SummaryMethod::Abstractive));
        assert_eq!(cli.model_dir, Some(PathBuf::from("/models/bart")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_method_rejected() {
        let result = CliArgs::try_parse_from(["condense", "--method", "poetic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_beats_config_port() {
        let cli = parse(&["--port", "9000"]);
        assert_eq!(cli.resolve_port(5000), 9000);
    }

    #[test]
    fn test_explicit_config_path() {
        let cli = parse(&["--config", "custom.toml"]);
        assert_eq!(cli.resolve_config_path(), PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_apply_overrides() {
        let cli = parse(&["-p", "7000", "-m", "abstractive", "--model-dir", "/m"]);
        let mut config = CondenseConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.summarizer.method, SummaryMethod::Abstractive);
        assert_eq!(config.summarizer.model_dir, "/m");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.general.log_level, "info");
    }
}
