//! CLI argument definitions for the pdfchat binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use pdfchat_core::config::expand_home;
use std::path::PathBuf;

/// Chat with an uploaded PDF through a hosted language model.
#[derive(Parser)]
#[command(name = "pdfchat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind the HTTP server to.
    #[arg(short = 'b', long = "bind")]
    pub bind: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Groq API key. Prefer GROQ_API_KEY so the key stays out of shell history.
    #[arg(long = "api-key")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for CliArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliArgs")
            .field("config", &self.config)
            .field("port", &self.port)
            .field("bind", &self.bind)
            .field("log_level", &self.log_level)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PDFCHAT_CONFIG env var > ~/.pdfchat/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PDFCHAT_CONFIG") {
            return PathBuf::from(p);
        }
        expand_home("~/.pdfchat/config.toml")
    }

    /// Resolve the HTTP server port.
    ///
    /// Priority: --port flag > PDFCHAT_PORT env var > config file value > 8501.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("PDFCHAT_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        8501
    }

    /// Resolve the bind address.
    ///
    /// Returns `None` if not overridden.
    pub fn resolve_bind(&self) -> Option<String> {
        self.bind.clone()
    }

    /// Resolve the log level.
    ///
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Resolve the model API key.
    ///
    /// Priority: --api-key flag > GROQ_API_KEY env var > config file value.
    /// Blank values count as absent.
    pub fn resolve_api_key(&self, config_key: Option<&str>) -> Option<String> {
        let env_key = std::env::var("GROQ_API_KEY").ok();
        let resolved = [self.api_key.as_deref(), env_key.as_deref(), config_key]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|k| !k.is_empty())
            .map(str::to_string);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("pdfchat").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_parse() {
        let args = parse(&[
            "--config",
            "/tmp/pdfchat.toml",
            "-p",
            "9000",
            "--bind",
            "0.0.0.0",
            "-l",
            "debug",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/pdfchat.toml"));
        assert_eq!(args.resolve_port(8501), 9000);
        assert_eq!(args.resolve_bind().as_deref(), Some("0.0.0.0"));
        assert_eq!(args.resolve_log_level().as_deref(), Some("debug"));
    }

    #[test]
    fn test_no_overrides() {
        let args = parse(&[]);
        assert!(args.resolve_bind().is_none());
        assert!(args.resolve_log_level().is_none());
    }

    #[test]
    fn test_api_key_flag_wins() {
        let args = parse(&["--api-key", " gsk_flag "]);
        assert_eq!(
            args.resolve_api_key(Some("gsk_config")).as_deref(),
            Some("gsk_flag")
        );
    }

    #[test]
    fn test_blank_api_key_flag_is_ignored() {
        let args = parse(&["--api-key", "   "]);
        let key = args.resolve_api_key(Some("gsk_config"));
        assert!(key.is_some());
        assert_ne!(key.as_deref(), Some(""));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let args = parse(&["--api-key", "gsk_secret"]);
        let debug = format!("{:?}", args);
        assert!(!debug.contains("gsk_secret"));
        assert!(debug.contains("<redacted>"));
    }
}
