//! Deterministic [`LanguageModel`] for tests and offline demos.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdfchat_core::types::ChatMessage;

use crate::error::LlmError;
use crate::model::LanguageModel;

/// One recorded `complete` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub user_message: String,
}

type Responder = dyn Fn(&ModelCall) -> Result<String, LlmError> + Send + Sync;

/// Language model whose replies come from a closure.
///
/// Every call is recorded before the closure runs, so tests can inspect the
/// exact prompts even for calls that were made to fail.
#[derive(Clone)]
pub struct ScriptedModel {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<ModelCall>>>,
}

impl ScriptedModel {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ModelCall) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always reply with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fail with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String, LlmError> {
        let call = ModelCall {
            system_prompt: system_prompt.to_string(),
            history: history.to_vec(),
            user_message: user_message.to_string(),
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        (self.responder)(&call)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
