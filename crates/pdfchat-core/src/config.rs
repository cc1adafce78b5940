use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PdfChatError, Result};

/// Top-level configuration for pdfchat.
///
/// Loaded from `~/.pdfchat/config.toml` by default. Every section falls back
/// to its defaults when absent, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl PdfChatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PdfChatConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(PdfChatError::Config(
                "ingest.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(PdfChatError::Config(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(PdfChatError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(PdfChatError::Config("llm.model cannot be empty".to_string()));
        }
        if self.general.default_session_id.trim().is_empty() {
            return Err(PdfChatError::Config(
                "general.default_session_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// HTTP server port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Session identifier used when a request does not name one.
    pub default_session_id: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8501,
            log_level: "info".to_string(),
            default_session_id: "default_session".to_string(),
        }
    }
}

/// Document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5000,
            chunk_overlap: 200,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Which embedding implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Sentence-transformer ONNX model.
    Onnx,
    /// Deterministic hash vectors. No semantic meaning.
    Hash,
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub model_dir: String,
    /// Embedding dimension.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Onnx,
            model_dir: "~/.pdfchat/models/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the answer prompt.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Hosted language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Sampling temperature. Provider default when unset.
    pub temperature: Option<f32>,
    /// API key. Usually supplied at runtime instead of stored here.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "gemma2-9b-it".to_string(),
            temperature: None,
            api_key: None,
        }
    }
}

/// Chat request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Longest accepted question, in characters.
    pub max_question_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_question_chars: 4000,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
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
        let config = PdfChatConfig::default();
        assert_eq!(config.general.port, 8501);
        assert_eq!(config.general.default_session_id, "default_session");
        assert_eq!(config.ingest.chunk_size, 5000);
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.embedding.backend, EmbeddingBackend::Onnx);
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.llm.model, "gemma2-9b-it");
        assert!(config.llm.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let file = create_temp_config(
            r#"
[general]
port = 9000

[retrieval]
top_k = 6

[embedding]
backend = "hash"
"#,
        );
        let config = PdfChatConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 9000);
        assert_eq!(config.general.bind, "127.0.0.1");
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.embedding.backend, EmbeddingBackend::Hash);
        assert_eq!(config.ingest.chunk_size, 5000);
    }

    #[test]
    fn test_load_empty_file_is_default() {
        let file = create_temp_config("");
        let config = PdfChatConfig::load(file.path()).unwrap();
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[general\nport = ");
        let result = PdfChatConfig::load(file.path());
        assert!(matches!(result, Err(PdfChatError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PdfChatConfig::load(Path::new("/nonexistent/pdfchat.toml"));
        assert!(matches!(result, Err(PdfChatError::Io(_))));
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = PdfChatConfig::load_or_default(Path::new("/nonexistent/pdfchat.toml"));
        assert_eq!(config.retrieval.top_k, 4);
    }

    #[test]
    fn test_load_rejects_overlap_not_smaller_than_size() {
        let file = create_temp_config(
            r#"
[ingest]
chunk_size = 100
chunk_overlap = 100
"#,
        );
        let result = PdfChatConfig::load(file.path());
        assert!(matches!(result, Err(PdfChatError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = PdfChatConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_default_session() {
        let mut config = PdfChatConfig::default();
        config.general.default_session_id = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = PdfChatConfig::default();
        config.llm.temperature = Some(0.2);
        config.general.port = 8600;
        config.save(&path).unwrap();

        let reloaded = PdfChatConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.port, 8600);
        assert_eq!(reloaded.llm.temperature, Some(0.2));
    }

    #[test]
    fn test_expand_home_plain_path() {
        assert_eq!(expand_home("/opt/models"), PathBuf::from("/opt/models"));
    }

    #[test]
    fn test_expand_home_tilde() {
        let expanded = expand_home("~/models");
        assert!(expanded.ends_with("models"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
