//! # Parley Core
//!
//! Foundation types for the Parley conversational routing engine.
//!
//! This crate defines the data model shared by the routing/dispatch layer
//! and by messenger transport adapters:
//!
//! - [`Envelope`] - normalized representation of one inbound update
//! - [`Signal`] / [`BoxedSignal`] - typed occurrences published for
//!   decoupled subscribers
//! - [`Keyboard`] / [`Button`] - declarative inline keyboards that publish
//!   signals when pressed
//! - [`Reaction`] - transport-agnostic reaction types
//! - [`Transport`] - the capability interface adapters implement
//! - [`codec`] - the default wire format for signal callback tokens
//!
//! Nothing in this crate performs I/O; transports implement [`Transport`]
//! and produce [`Envelope`]s, the framework crate consumes both.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod keyboard;
pub mod reaction;
pub mod signal;
pub mod transport;

pub use codec::WireSignal;
pub use envelope::{ConversationId, Envelope, EnvelopeKind, Payload, SenderId};
pub use error::{CodecError, CodecResult, DeliveryError, DeliveryResult};
pub use keyboard::{Button, Keyboard};
pub use reaction::Reaction;
pub use signal::{BoxedSignal, Signal};
pub use transport::{BoxedTransport, Transport};
