//! pdfchat binary - composition root.
//!
//! 1. Load `.env`, parse the CLI and load configuration from TOML
//! 2. Pick the embedding backend (ONNX model, or hash vectors as fallback)
//! 3. Build the shared API state and apply a credential if one is configured
//! 4. Serve the chat page and JSON API until Ctrl+C

mod cli;

use std::sync::Arc;

use clap::Parser;
use pdfchat_api::{AppState, CREDENTIAL_WARNING};
use pdfchat_core::config::{expand_home, EmbeddingBackend, EmbeddingConfig, PdfChatConfig};
use pdfchat_vector::{DynEmbeddingService, HashEmbedding, OnnxEmbeddingService};

use crate::cli::CliArgs;

/// Load the configured embedding model, falling back to hash vectors.
fn build_embedder(config: &EmbeddingConfig) -> Arc<dyn DynEmbeddingService> {
    match config.backend {
        EmbeddingBackend::Hash => {
            tracing::info!(dimensions = config.dimensions, "Using hash embeddings");
            Arc::new(HashEmbedding::with_dimensions(config.dimensions))
        }
        EmbeddingBackend::Onnx => {
            let model_dir = expand_home(&config.model_dir);
            match OnnxEmbeddingService::from_directory(&model_dir) {
                Ok(service) => {
                    tracing::info!(path = %model_dir.display(), "ONNX embedding model loaded");
                    Arc::new(service)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %model_dir.display(),
                        error = %e,
                        "ONNX embedding model unavailable, falling back to hash embeddings"
                    );
                    Arc::new(HashEmbedding::with_dimensions(config.dimensions))
                }
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = PdfChatConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    if let Some(bind) = args.resolve_bind() {
        config.general.bind = bind;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting pdfchat v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");
    config.validate()?;

    let api_key = args.resolve_api_key(config.llm.api_key.as_deref());
    let embedder = build_embedder(&config.embedding);
    let state = AppState::new(config, embedder)?;

    match api_key {
        Some(key) => match state.set_credential(&key) {
            Ok(model) => tracing::info!(model = %model, "Language model configured"),
            Err(e) => tracing::warn!(error = ?e, "{}", CREDENTIAL_WARNING),
        },
        None => tracing::warn!("{}", CREDENTIAL_WARNING),
    }

    pdfchat_api::start_server(state, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}
