//! Conversational question answering over the loaded PDF.
//!
//! [`RagOrchestrator::handle_turn`] is the request/response boundary: it
//! reformulates the question against the session transcript, retrieves the
//! nearest chunks, synthesizes an answer and records the turn.

pub mod error;
pub mod orchestrator;
pub mod reformulator;
pub mod session;
pub mod stage;
pub mod synthesizer;

pub use error::ChatError;
pub use orchestrator::{RagOrchestrator, SourceRef, TurnOutcome, TurnSettings};
pub use reformulator::{QueryReformulator, CONTEXTUALIZE_SYSTEM_PROMPT};
pub use session::{normalize_session_id, SessionStore};
pub use stage::{validate_transition, TurnStage};
pub use synthesizer::{AnswerSynthesizer, QA_SYSTEM_PROMPT};
