//! Routing and propagation layer of the parley stack.
//!
//! This crate turns the transport-neutral primitives of `parley-core`
//! into a working conversational engine:
//!
//! - [`Router`] maps inbound envelopes to registered endpoint handlers
//! - [`SignalBus`] propagates typed signals breadth-first to subscribers
//! - [`Dispatcher`] drives one envelope through match, invoke, propagate
//! - [`Context`] is the per-invocation handle handlers act through
//!
//! Registration happens at setup time against `&mut` registries; once
//! wrapped in `Arc` and handed to a dispatcher, router and bus are
//! immutable and freely shared across conversations.

pub mod bus;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use bus::{DEFAULT_MAX_DEPTH, PublishReport, SignalBus};
pub use context::{Bindings, Context};
pub use dispatcher::{DispatchOutcome, Dispatcher, UnmatchedPolicy};
pub use error::{HandlerError, HandlerResult, RegistryError, RegistryResult, SignalError};
pub use handler::{BoxedHandler, BoxedSlot, Outcome, into_handler, into_slot};
pub use router::{RouteMatch, Router};
