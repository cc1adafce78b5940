//! Language model access.
//!
//! [`LanguageModel`] is the single contract the chat pipeline needs:
//! `complete(system_prompt, history, user_message) -> text`. [`GroqClient`]
//! implements it against an OpenAI-compatible chat completions endpoint and
//! [`ScriptedModel`] implements it with a closure for tests.

pub mod error;
pub mod groq;
pub mod model;
pub mod scripted;

pub use error::LlmError;
pub use groq::GroqClient;
pub use model::LanguageModel;
pub use scripted::{ModelCall, ScriptedModel};
