//! Application state shared across all route handlers.
//!
//! AppState owns the long-lived pieces (session store, document slot,
//! ingestor, index builder) and the credential-bound pipeline, which only
//! exists once an API key has been supplied.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use pdfchat_chat::{RagOrchestrator, SessionStore, TurnSettings};
use pdfchat_core::config::{LlmConfig, PdfChatConfig};
use pdfchat_core::error::PdfChatError;
use pdfchat_ingest::DocumentIngestor;
use pdfchat_llm::{GroqClient, LanguageModel, LlmError};
use pdfchat_vector::{DocumentSlot, DynEmbeddingService, IndexBuilder};
use tracing::info;

use crate::error::ApiError;

/// Builds a language model from the `[llm]` section and a credential.
pub type ModelFactory =
    Arc<dyn Fn(&LlmConfig, &str) -> Result<Arc<dyn LanguageModel>, LlmError> + Send + Sync>;

/// Shared application state.
///
/// All fields use `Arc` (or are themselves shared handles) for cheap cloning
/// across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<PdfChatConfig>,
    /// Session transcripts; survive credential changes.
    pub sessions: SessionStore,
    /// Currently loaded document; survives credential changes.
    pub documents: DocumentSlot,
    pub ingestor: Arc<DocumentIngestor>,
    pub index_builder: IndexBuilder,
    pipeline: Arc<RwLock<Option<Arc<RagOrchestrator>>>>,
    model_factory: ModelFactory,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create state with the Groq client as the language model.
    pub fn new(
        config: PdfChatConfig,
        embedder: Arc<dyn DynEmbeddingService>,
    ) -> Result<Self, PdfChatError> {
        let ingestor = DocumentIngestor::new(&config.ingest)?;
        Ok(Self {
            config: Arc::new(config),
            sessions: SessionStore::new(),
            documents: DocumentSlot::new(),
            ingestor: Arc::new(ingestor),
            index_builder: IndexBuilder::new(embedder),
            pipeline: Arc::new(RwLock::new(None)),
            model_factory: Arc::new(groq_model),
            start_time: Instant::now(),
        })
    }

    /// Replace how language models are built from a credential.
    pub fn with_model_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&LlmConfig, &str) -> Result<Arc<dyn LanguageModel>, LlmError>
            + Send
            + Sync
            + 'static,
    {
        self.model_factory = Arc::new(factory);
        self
    }

    /// Construct the pipeline for `api_key` and make it current.
    ///
    /// Returns the model name. Sessions and the loaded document carry over
    /// to the new pipeline.
    pub fn set_credential(&self, api_key: &str) -> Result<String, ApiError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ApiError::BadRequest("api_key cannot be empty".to_string()));
        }

        let model = (self.model_factory)(&self.config.llm, api_key)?;
        let orchestrator = RagOrchestrator::new(
            model,
            Arc::clone(&self.ingestor),
            self.index_builder.clone(),
            self.documents.clone(),
            self.sessions.clone(),
            TurnSettings::from_config(&self.config),
        );
        let model_name = orchestrator.model_name().to_string();

        let mut pipeline = self
            .pipeline
            .write()
            .map_err(|e| ApiError::Internal(format!("pipeline lock poisoned: {}", e)))?;
        *pipeline = Some(Arc::new(orchestrator));
        info!(model = %model_name, "Credential accepted, pipeline ready");
        Ok(model_name)
    }

    /// The current pipeline, or 503 with the credential warning.
    pub fn pipeline(&self) -> Result<Arc<RagOrchestrator>, ApiError> {
        let pipeline = self
            .pipeline
            .read()
            .map_err(|e| ApiError::Internal(format!("pipeline lock poisoned: {}", e)))?;
        pipeline.clone().ok_or_else(ApiError::missing_credential)
    }

    pub fn has_credential(&self) -> bool {
        self.pipeline.read().map(|p| p.is_some()).unwrap_or(false)
    }

    pub fn model_name(&self) -> Option<String> {
        self.pipeline
            .read()
            .ok()
            .and_then(|p| p.as_ref().map(|o| o.model_name().to_string()))
    }
}

fn groq_model(config: &LlmConfig, api_key: &str) -> Result<Arc<dyn LanguageModel>, LlmError> {
    Ok(Arc::new(GroqClient::new(config, api_key)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfchat_llm::ScriptedModel;
    use pdfchat_vector::HashEmbedding;

    fn state() -> AppState {
        AppState::new(PdfChatConfig::default(), Arc::new(HashEmbedding::new()))
            .unwrap()
            .with_model_factory(|_, _| Ok(Arc::new(ScriptedModel::replying("ok"))))
    }

    #[test]
    fn test_pipeline_requires_credential() {
        let state = state();
        assert!(!state.has_credential());
        assert!(matches!(
            state.pipeline(),
            Err(ApiError::ServiceUnavailable(_))
        ));

        assert_eq!(state.set_credential("gsk_test").unwrap(), "scripted");
        assert!(state.has_credential());
        assert!(state.pipeline().is_ok());
        assert_eq!(state.model_name().as_deref(), Some("scripted"));
    }

    #[test]
    fn test_blank_credential_rejected() {
        let state = state();
        assert!(matches!(
            state.set_credential("   "),
            Err(ApiError::BadRequest(_))
        ));
        assert!(!state.has_credential());
    }

    #[test]
    fn test_factory_error_is_surfaced() {
        let state = state().with_model_factory(|_, _| Err(LlmError::MissingCredential));
        assert!(matches!(
            state.set_credential("key"),
            Err(ApiError::ServiceUnavailable(_))
        ));
        assert!(!state.has_credential());
    }

    #[tokio::test]
    async fn test_sessions_survive_credential_change() {
        let state = state();
        state.set_credential("first").unwrap();
        state.sessions.append("s", "q", "a").await.unwrap();

        state.set_credential("second").unwrap();
        let pipeline = state.pipeline().unwrap();
        assert_eq!(
            pipeline.sessions().get_or_create("s").await.unwrap().len(),
            1
        );
    }

    #[test]
    fn test_default_factory_builds_groq_client() {
        let state =
            AppState::new(PdfChatConfig::default(), Arc::new(HashEmbedding::new())).unwrap();
        assert_eq!(state.set_credential("gsk_live").unwrap(), "gemma2-9b-it");
    }
}
