//! # Parley
//!
//! A messenger-agnostic conversational routing framework for Rust.
//!
//! ## Overview
//!
//! Parley separates what a conversation does from which messenger carries
//! it. Handlers are written once against a transport-neutral capability
//! surface; plugging in a messenger means implementing one trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐    ┌────────────┐    ┌────────┐ match ┌─────────┐
//! │ Transport │───▶│  Runtime   │───▶│ Router │──────▶│ Handler │──▶ effects
//! │ (inbound) │    │ (one lane  │    └────────┘       └────┬────┘
//! └───────────┘    │  per conv) │    ┌────────────┐  emit  │
//!                  └────────────┘    │ Signal Bus │◀───────┘
//!                                    └─────┬──────┘
//!                                          └──▶ subscribers (breadth-first)
//! ```
//!
//! - **Envelope**: one normalized inbound happening (command, text,
//!   button press, reaction)
//! - **Router**: maps envelopes to endpoint handlers at most one of which
//!   runs per envelope
//! - **Signal Bus**: propagates typed signals to all subscribers,
//!   generation by generation
//! - **Runtime**: keeps each conversation strictly ordered while
//!   processing distinct conversations in parallel
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.command("start", "begin the session", into_handler(
//!         |ctx: Arc<Context>| async move {
//!             ctx.send_message("Welcome").await?;
//!             Ok(Outcome::Done)
//!         },
//!     ))?;
//!
//!     let dispatcher = Dispatcher::new(
//!         Arc::new(router),
//!         Arc::new(SignalBus::new()),
//!         my_transport,
//!     );
//!     ParleyRuntime::new(dispatcher).run().await;
//!     Ok(())
//! }
//! ```

pub use parley_core as core;
pub use parley_framework as framework;
pub use parley_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use parley::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use parley_runtime::{ConfigLoader, LoggingBuilder, ParleyConfig, ParleyRuntime};

    // Routing and propagation
    pub use parley_framework::{
        Bindings, Context, DispatchOutcome, Dispatcher, Outcome, Router, SignalBus,
        UnmatchedPolicy, into_handler, into_slot,
    };

    // Transport-neutral primitives
    pub use parley_core::{
        BoxedSignal, BoxedTransport, Button, ConversationId, Envelope, Keyboard, Payload,
        Reaction, SenderId, Signal, Transport, impl_signal,
    };

    // Wire codec for callback tokens
    pub use parley_core::codec::{self, WireSignal};

    pub use std::sync::Arc;
}
