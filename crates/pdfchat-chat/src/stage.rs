//! Per-turn state machine with validated transitions.
//!
//! Idle -> Reformulating -> Retrieving -> Synthesizing -> Recording -> Idle.
//! Any working stage may also abort straight back to Idle.

use std::fmt;

use serde::Serialize;

use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStage {
    Idle,
    Reformulating,
    Retrieving,
    Synthesizing,
    Recording,
}

impl TurnStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStage::Idle => "idle",
            TurnStage::Reformulating => "reformulating",
            TurnStage::Retrieving => "retrieving",
            TurnStage::Synthesizing => "synthesizing",
            TurnStage::Recording => "recording",
        }
    }
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate that a stage transition is allowed.
pub fn validate_transition(from: TurnStage, to: TurnStage) -> Result<(), ChatError> {
    let valid = matches!(
        (from, to),
        (TurnStage::Idle, TurnStage::Reformulating)
            | (TurnStage::Reformulating, TurnStage::Retrieving)
            | (TurnStage::Retrieving, TurnStage::Synthesizing)
            | (TurnStage::Synthesizing, TurnStage::Recording)
            | (TurnStage::Recording, TurnStage::Idle)
            | (TurnStage::Reformulating, TurnStage::Idle)
            | (TurnStage::Retrieving, TurnStage::Idle)
            | (TurnStage::Synthesizing, TurnStage::Idle)
    );

    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidTransition(from, to))
    }
}
