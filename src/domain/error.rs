//! Domain errors for the dialogue engine.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors for the dialogue engine.
///
/// Model misbehavior (malformed output, illegal transitions, thin evidence)
/// is recovered internally and never surfaces here; only failures the turn
/// genuinely cannot absorb become errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown stage id: {0}")]
    UnknownStage(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(Uuid),

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
