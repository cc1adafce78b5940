//! Grounded answer generation from retrieved chunks.

use std::sync::Arc;

use pdfchat_core::types::{DocumentChunk, Transcript};
use pdfchat_llm::{LanguageModel, LlmError};
use tracing::debug;

/// Answer instruction. `{context}` is replaced by the retrieved chunk texts.
pub const QA_SYSTEM_PROMPT: &str = "You are an assistant for question answering tasks. \
Use the following pieces of retrieved context to answer the question. If you don't know the \
answer, say that you don't know. Use three sentences maximum and keep the answer concise.\n\n\
{context}";

/// Join chunk texts with blank lines and substitute them into the prompt.
pub fn build_system_prompt(context: &[DocumentChunk]) -> String {
    let joined = context
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    QA_SYSTEM_PROMPT.replace("{context}", &joined)
}

/// Produces an answer from context, the conversation, and a standalone question.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Ask the model to answer `question` from `context`.
    ///
    /// Has no side effects. A blank reply is treated as a malformed response
    /// so that an empty answer is never recorded.
    pub async fn synthesize(
        &self,
        question: &str,
        context: &[DocumentChunk],
        transcript: &Transcript,
    ) -> Result<String, LlmError> {
        let system_prompt = build_system_prompt(context);
        let history = transcript.to_messages();

        let reply = self
            .model
            .complete(&system_prompt, &history, question)
            .await?;

        let answer = reply.trim();
        if answer.is_empty() {
            return Err(LlmError::MalformedResponse("model returned an empty answer".into()));
        }

        debug!(
            model = self.model.model_name(),
            context_chunks = context.len(),
            chars = answer.len(),
            "Answer synthesized"
        );
        Ok(answer.to_string())
    }
}
