//! Per-invocation execution context.
//!
//! One [`Context`] is created for every handler invocation (the endpoint
//! handler of a dispatched envelope, or each subscriber of a published
//! signal) and discarded when that invocation returns. It is the only
//! surface a handler has for producing outbound effects, and it hides
//! which messenger sits behind the transport while keeping the
//! capabilities (text, images, keyboards, reactions) available.
//!
//! Contexts are never shared across concurrent invocations: two slots
//! receiving the same signal each get their own.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use parley_core::{
    BoxedSignal, BoxedTransport, ConversationId, DeliveryResult, Keyboard, Reaction, Signal,
};

/// Bindings extracted by the matcher for one invocation.
///
/// For message endpoints these are the named capture groups of the
/// pattern; for commands the single raw `args` value. Subscriber contexts
/// carry no bindings.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: Vec<(String, String)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, keeping insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.push((name.into(), value.into()));
    }

    /// Looks up a binding by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Looks up and parses a binding.
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|value| value.parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// The handle a handler uses to act on the originating conversation.
pub struct Context {
    conversation: ConversationId,
    transport: BoxedTransport,
    bindings: Bindings,
    /// Signals queued via [`publish`](Self::publish), drained by the
    /// dispatcher after the invocation returns.
    outbox: Mutex<Vec<BoxedSignal>>,
}

impl Context {
    pub(crate) fn new(
        conversation: ConversationId,
        transport: BoxedTransport,
        bindings: Bindings,
    ) -> Self {
        Self {
            conversation,
            transport,
            bindings,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// The conversation this invocation belongs to.
    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    /// Bindings extracted by the matcher.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Shorthand for `bindings().get(name)`.
    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name)
    }

    /// The transport capability set bound to this dispatch.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    /// Sends a text message to the bound conversation.
    pub async fn send_message(&self, text: &str) -> DeliveryResult<()> {
        self.transport
            .deliver_text(&self.conversation, text, None)
            .await
    }

    /// Sends a text message with an inline keyboard attached.
    pub async fn send_message_with_keyboard(
        &self,
        text: &str,
        keyboard: &Keyboard,
    ) -> DeliveryResult<()> {
        self.transport
            .deliver_text(&self.conversation, text, Some(keyboard))
            .await
    }

    /// Sends an image with an optional caption.
    pub async fn send_image(&self, image: &[u8], caption: Option<&str>) -> DeliveryResult<()> {
        self.transport
            .deliver_image(&self.conversation, image, caption)
            .await
    }

    /// Attaches a reaction in the bound conversation.
    pub async fn react(&self, reaction: Reaction) -> DeliveryResult<()> {
        self.transport
            .deliver_reaction(&self.conversation, &reaction)
            .await
    }

    /// Queues a signal for propagation after this invocation returns.
    ///
    /// Equivalent to returning [`Outcome::Emit`](crate::handler::Outcome)
    /// but usable any number of times mid-execution. Queued signals are
    /// published in queue order.
    pub fn publish(&self, signal: impl Signal) {
        trace!(signal = signal.name(), "signal queued");
        self.outbox.lock().push(BoxedSignal::new(signal));
    }

    /// Drains the queued signals. Called once by the dispatcher/bus when
    /// the invocation returns.
    pub(crate) fn drain_published(&self) -> Vec<BoxedSignal> {
        std::mem::take(&mut *self.outbox.lock())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("conversation", &self.conversation)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}
