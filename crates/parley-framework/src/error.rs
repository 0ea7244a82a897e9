//! Error types for the Parley framework.

use thiserror::Error;

/// Errors raised while registering endpoints on the router.
///
/// Registration happens at setup time; both variants are fatal to startup
/// and leave the registry exactly as it was before the failed call.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A command endpoint with this name already exists.
    #[error("command '/{name}' is already registered")]
    DuplicateCommand {
        /// The colliding command name.
        name: String,
    },

    /// A message pattern failed to compile.
    #[error("invalid message pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as registered.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: Box<regex::Error>,
    },
}

/// A failure raised inside a handler or subscriber.
///
/// Caught at the dispatcher boundary: logged, contained to the current
/// dispatch, never allowed to crash the dispatch loop or leak into another
/// conversation's processing.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<parley_core::DeliveryError> for HandlerError {
    fn from(err: parley_core::DeliveryError) -> Self {
        Self(err.to_string())
    }
}

/// Errors raised by signal propagation.
#[derive(Debug, Clone, Error)]
pub enum SignalError {
    /// A propagation chain exceeded the configured depth bound.
    ///
    /// Aborts further propagation for that chain only; other conversations
    /// and other chains are unaffected.
    #[error("signal propagation exceeded depth {depth} (started from '{origin}')")]
    DepthExceeded {
        /// The configured bound.
        depth: usize,
        /// Name of the signal that started the chain.
        origin: &'static str,
    },
}

/// Result type for registration operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type returned by handlers and subscribers.
pub type HandlerResult = Result<crate::handler::Outcome, HandlerError>;
