//! History-aware rewriting of follow-up questions.

use std::sync::Arc;

use pdfchat_core::types::Transcript;
use pdfchat_llm::{LanguageModel, LlmError};
use tracing::{debug, warn};

/// Instruction sent with the chat history when a question needs rewriting.
pub const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question which can be \
understood without the chat history. Do not answer the question, just reformulate it if needed \
and otherwise return it as is.";

/// Rewrites a question so it can be answered without the conversation.
#[derive(Clone)]
pub struct QueryReformulator {
    model: Arc<dyn LanguageModel>,
}

impl QueryReformulator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Produce a standalone form of `question`.
    ///
    /// With an empty transcript the question is returned unchanged and the
    /// model is not called. A blank model reply also falls back to the
    /// original question.
    pub async fn reformulate(
        &self,
        transcript: &Transcript,
        question: &str,
    ) -> Result<String, LlmError> {
        if transcript.is_empty() {
            return Ok(question.to_string());
        }

        let history = transcript.to_messages();
        let reply = self
            .model
            .complete(CONTEXTUALIZE_SYSTEM_PROMPT, &history, question)
            .await?;

        let standalone = reply.trim();
        if standalone.is_empty() {
            warn!(model = self.model.model_name(), "Reformulation was blank, using original question");
            return Ok(question.to_string());
        }

        debug!(original = question, standalone, "Question reformulated");
        Ok(standalone.to_string())
    }
}
