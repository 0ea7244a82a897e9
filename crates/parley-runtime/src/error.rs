//! Runtime error types.

use parley_core::ConversationId;
use thiserror::Error;

/// Errors that can occur while scheduling envelopes.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The runtime no longer accepts envelopes.
    #[error("Runtime is shutting down")]
    ShuttingDown,

    /// The lane for this conversation is gone.
    #[error("Lane closed for conversation {conversation}")]
    LaneClosed { conversation: ConversationId },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
