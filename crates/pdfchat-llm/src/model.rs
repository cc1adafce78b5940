use async_trait::async_trait;
use pdfchat_core::types::ChatMessage;

use crate::error::LlmError;

/// A hosted chat model.
///
/// The request is the system prompt, then `history` in order, then
/// `user_message`. Implementations return the assistant's reply text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String, LlmError>;

    /// Identifier of the underlying model, for logs.
    fn model_name(&self) -> &str;
}

/// Assemble the full message list sent for one completion.
pub fn build_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(user_message));
    messages
}
