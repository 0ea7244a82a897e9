//! Core error types.
//!
//! Registration-time and dispatch-time errors live in the framework crate;
//! this module covers the failures a transport or the wire codec can
//! produce.

use thiserror::Error;

/// Errors produced by transport delivery operations.
///
/// A handler that awaits a context action sees this directly and may
/// recover; otherwise it surfaces at the dispatcher boundary where it is
/// logged and contained. The core never retries - retry policy belongs to
/// the adapter or the application.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The platform rejected the delivery.
    #[error("delivery refused: {reason}")]
    Refused {
        /// Reason reported by the transport.
        reason: String,
    },

    /// The target conversation no longer exists (user blocked the bot,
    /// chat deleted, ...).
    #[error("conversation '{conversation}' is gone")]
    ConversationGone {
        /// The missing conversation id.
        conversation: String,
    },

    /// The transport does not support the requested action.
    #[error("action '{action}' not supported by this transport")]
    Unsupported {
        /// The unsupported action name.
        action: &'static str,
    },

    /// A signal could not be encoded into or decoded from a callback token.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// I/O failure in the transport.
    #[error("transport I/O error: {0}")]
    Io(String),
}

impl DeliveryError {
    /// Creates a refusal error.
    pub fn refused(reason: impl Into<String>) -> Self {
        Self::Refused {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors produced by the signal wire codec.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The token names a different signal type than the decoder expected.
    #[error("signal name mismatch: expected '{expected}', got '{got}'")]
    NameMismatch {
        /// Expected signal name.
        expected: &'static str,
        /// Name found in the token.
        got: String,
    },

    /// The token is structurally invalid.
    #[error("malformed token: {reason}")]
    Malformed {
        /// What went wrong.
        reason: String,
    },

    /// A field value could not be converted to the declared type.
    #[error("field {index} of '{signal}': {reason}")]
    Field {
        /// The signal name being decoded.
        signal: &'static str,
        /// Zero-based field position.
        index: usize,
        /// Conversion failure description.
        reason: String,
    },
}

impl CodecError {
    /// Creates a malformed-token error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Result type for transport delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
