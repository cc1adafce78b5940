//! HTTP surface for the PDF chat pipeline.
//!
//! Serves the chat page, accepts the model credential and PDF uploads, and
//! exposes `handle_turn` plus the session store over JSON.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, CREDENTIAL_WARNING};
pub use routes::{create_router, start_server};
pub use state::{AppState, ModelFactory};
