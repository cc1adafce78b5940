//! RAG orchestrator: document loading and the per-turn pipeline.
//!
//! A turn walks reformulate -> retrieve -> synthesize -> record while holding
//! its session's exclusive region. The turn is recorded only after every
//! earlier stage succeeds, so a failed turn leaves the transcript untouched.

use std::sync::Arc;

use pdfchat_core::config::PdfChatConfig;
use pdfchat_core::types::{ChatMessage, DocumentInfo, Turn};
use pdfchat_ingest::DocumentIngestor;
use pdfchat_llm::LanguageModel;
use pdfchat_vector::{DocumentRetriever, DocumentSlot, IndexBuilder, IndexedDocument, ScoredChunk};
use serde::Serialize;
use tracing::{debug, info, warn, Level};

use crate::error::ChatError;
use crate::reformulator::QueryReformulator;
use crate::session::{normalize_session_id, SessionStore};
use crate::stage::{validate_transition, TurnStage};
use crate::synthesizer::AnswerSynthesizer;

/// Characters of chunk text included in a source preview.
const PREVIEW_CHARS: usize = 200;

/// Per-turn limits.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Chunks handed to the answer prompt.
    pub top_k: usize,
    pub max_question_chars: usize,
}

impl TurnSettings {
    pub fn from_config(config: &PdfChatConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_question_chars: config.chat.max_question_chars,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&PdfChatConfig::default())
    }
}

/// A retrieved chunk as reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub chunk_index: usize,
    pub page_index: usize,
    pub score: f64,
    pub preview: String,
}

impl From<&ScoredChunk> for SourceRef {
    fn from(hit: &ScoredChunk) -> Self {
        Self {
            chunk_index: hit.chunk.index,
            page_index: hit.chunk.page_index,
            score: hit.score,
            preview: hit.chunk.text.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

/// Result of a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub answer: String,
    /// Question actually used for retrieval and answering.
    pub standalone_question: String,
    pub sources: Vec<SourceRef>,
    /// The session's full message list after this turn.
    pub history: Vec<ChatMessage>,
}

/// Sequences ingestion, indexing, reformulation, retrieval and synthesis.
pub struct RagOrchestrator {
    ingestor: Arc<DocumentIngestor>,
    builder: IndexBuilder,
    documents: DocumentSlot,
    sessions: SessionStore,
    reformulator: QueryReformulator,
    synthesizer: AnswerSynthesizer,
    model_name: String,
    settings: TurnSettings,
}

impl RagOrchestrator {
    /// Compose the pipeline.
    ///
    /// `documents` and `sessions` are shared handles; the caller keeps its own
    /// clones so state outlives any one orchestrator.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        ingestor: Arc<DocumentIngestor>,
        builder: IndexBuilder,
        documents: DocumentSlot,
        sessions: SessionStore,
        settings: TurnSettings,
    ) -> Self {
        Self {
            model_name: model.model_name().to_string(),
            reformulator: QueryReformulator::new(Arc::clone(&model)),
            synthesizer: AnswerSynthesizer::new(model),
            ingestor,
            builder,
            documents,
            sessions,
            settings,
        }
    }

    /// Ingest and index an upload, then make it the current document.
    ///
    /// The previous document stays searchable until the new index is fully
    /// built. On failure the previous document remains current.
    pub async fn load_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentInfo, ChatError> {
        let ingested = self.ingestor.ingest(bytes).await?;
        let info = DocumentInfo {
            file_name: file_name.to_string(),
            page_count: ingested.page_count,
            chunk_count: ingested.chunks.len(),
        };

        let index = self.builder.build(ingested.chunks).await?;
        self.documents
            .replace(IndexedDocument::new(info.clone(), index))?;
        Ok(info)
    }

    /// Answer one question in one session.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        question: &str,
    ) -> Result<TurnOutcome, ChatError> {
        let session_id = normalize_session_id(session_id)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if question.chars().count() > self.settings.max_question_chars {
            return Err(ChatError::QuestionTooLong(self.settings.max_question_chars));
        }

        let document = self.documents.current()?.ok_or(ChatError::NotReady)?;

        let mut transcript = self.sessions.lock(session_id).await?;
        let mut stage = TurnStage::Idle;

        let result = async {
            advance(&mut stage, TurnStage::Reformulating, session_id)?;
            let standalone = self.reformulator.reformulate(&transcript, question).await?;

            advance(&mut stage, TurnStage::Retrieving, session_id)?;
            let retriever = DocumentRetriever::new(self.builder.embedder(), document);
            let hits = retriever.search(&standalone, self.settings.top_k).await?;

            advance(&mut stage, TurnStage::Synthesizing, session_id)?;
            let context: Vec<_> = hits.iter().map(|hit| hit.chunk.clone()).collect();
            let answer = self
                .synthesizer
                .synthesize(&standalone, &context, &transcript)
                .await?;

            Ok::<_, ChatError>((standalone, hits, answer))
        }
        .await;

        let (standalone, hits, answer) = match result {
            Ok(parts) => parts,
            Err(e) => {
                warn!(session = session_id, stage = %stage, error = %e, "Turn aborted");
                advance(&mut stage, TurnStage::Idle, session_id)?;
                return Err(e);
            }
        };

        advance(&mut stage, TurnStage::Recording, session_id)?;
        transcript.push(Turn::new(question, answer.clone()));
        let history = transcript.to_messages();
        let turns = transcript.len();
        drop(transcript);
        advance(&mut stage, TurnStage::Idle, session_id)?;

        info!(
            session = session_id,
            model = %self.model_name,
            turns,
            sources = hits.len(),
            "Turn completed"
        );
        self.log_sessions(session_id, &history);

        Ok(TurnOutcome {
            session_id: session_id.to_string(),
            answer,
            standalone_question: standalone,
            sources: hits.iter().map(SourceRef::from).collect(),
            history,
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn documents(&self) -> &DocumentSlot {
        &self.documents
    }

    pub fn current_document(&self) -> Result<Option<DocumentInfo>, ChatError> {
        Ok(self.documents.current()?.map(|doc| doc.info.clone()))
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    /// Diagnostic dump of every session and the current session's messages.
    fn log_sessions(&self, session_id: &str, history: &[ChatMessage]) {
        if !tracing::enabled!(Level::DEBUG) {
            return;
        }
        match self.sessions.try_snapshot() {
            Ok(all) => {
                let summary: Vec<String> = all
                    .iter()
                    .map(|(id, transcript)| match transcript {
                        Some(t) => format!("{}: {} turns", id, t.len()),
                        None => format!("{}: busy", id),
                    })
                    .collect();
                debug!(sessions = ?summary, "Session store");
            }
            Err(e) => debug!(error = %e, "Session store unavailable"),
        }
        debug!(session = session_id, messages = ?history, "Session messages");
    }
}

fn advance(stage: &mut TurnStage, next: TurnStage, session_id: &str) -> Result<(), ChatError> {
    validate_transition(*stage, next)?;
    debug!(session = session_id, from = %stage, to = %next, "Turn stage");
    *stage = next;
    Ok(())
}
