//! End-to-end orchestration of one inbound envelope.
//!
//! The [`Dispatcher`] owns the full event lifecycle:
//!
//! 1. Ask the [`Router`] to match the envelope
//! 2. Apply the unmatched policy when nothing matches
//! 3. Build a [`Context`] bound to the envelope's conversation
//! 4. Invoke the selected handler
//! 5. Forward every signal the handler produced to the [`SignalBus`]
//!
//! Button presses skip the router: their callback token is decoded through
//! the transport capability and the resulting signal goes straight onto
//! the bus.
//!
//! The dispatcher is stateless between envelopes; per-conversation
//! ordering and cancellation live in the runtime's lanes, not here. Any
//! error a handler raises is caught at this boundary, logged, and
//! contained - one conversation's failure never touches another's
//! processing or the registered state of router and bus.

use std::sync::Arc;

use tracing::{Level, debug, error, span, warn};

use parley_core::{BoxedSignal, BoxedTransport, ConversationId, Envelope, Payload};

use crate::bus::SignalBus;
use crate::context::Context;
use crate::handler::{BoxedHandler, Outcome};
use crate::router::Router;

/// What to do with a text/command/reaction envelope no endpoint matched.
#[derive(Default)]
pub enum UnmatchedPolicy {
    /// Drop it, logging at debug level.
    #[default]
    Ignore,
    /// Hand it to a default handler (with empty bindings).
    Fallback(BoxedHandler),
}

/// How one dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An endpoint (or fallback, or button-press chain) ran to completion.
    Handled,
    /// No endpoint matched and the policy was to ignore.
    Unmatched,
    /// The handler or the propagation chain failed; details were logged.
    Failed,
}

/// Stateless orchestrator for inbound envelopes.
///
/// Holds read-only shared handles to the router and bus built at setup
/// time, plus the transport the resulting contexts are bound to.
pub struct Dispatcher {
    router: Arc<Router>,
    bus: Arc<SignalBus>,
    transport: BoxedTransport,
    unmatched: UnmatchedPolicy,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, bus: Arc<SignalBus>, transport: BoxedTransport) -> Self {
        Self {
            router,
            bus,
            transport,
            unmatched: UnmatchedPolicy::Ignore,
        }
    }

    /// Sets the policy for unmatched envelopes.
    pub fn unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn bus(&self) -> &Arc<SignalBus> {
        &self.bus
    }

    /// Dispatches one envelope through its full lifecycle.
    ///
    /// Never panics and never returns an error: handler and delivery
    /// failures are logged here and reported through the outcome.
    pub async fn dispatch(&self, envelope: Envelope) -> DispatchOutcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            kind = %envelope.kind(),
            conversation = %envelope.conversation(),
        );
        let _enter = span.enter();

        if let Payload::ButtonPress { token } = envelope.payload() {
            return self.dispatch_button_press(envelope.conversation(), token).await;
        }

        let Some(matched) = self.router.matches(&envelope) else {
            return match &self.unmatched {
                UnmatchedPolicy::Ignore => {
                    debug!("no endpoint matched, ignoring");
                    DispatchOutcome::Unmatched
                }
                UnmatchedPolicy::Fallback(handler) => {
                    debug!("no endpoint matched, running fallback");
                    self.invoke(envelope.conversation(), handler, crate::context::Bindings::new())
                        .await
                }
            };
        };

        debug!(endpoint = %matched.endpoint, "endpoint matched");
        let handler = matched.handler;
        self.invoke(envelope.conversation(), handler, matched.bindings)
            .await
    }

    async fn invoke(
        &self,
        conversation: &ConversationId,
        handler: &BoxedHandler,
        bindings: crate::context::Bindings,
    ) -> DispatchOutcome {
        let ctx = Arc::new(Context::new(
            conversation.clone(),
            self.transport.clone(),
            bindings,
        ));

        let result = handler.call(Arc::clone(&ctx)).await;

        let mut signals = ctx.drain_published();
        match result {
            Ok(Outcome::Done) => {}
            Ok(Outcome::Emit(signal)) => signals.push(signal),
            Err(err) => {
                error!(error = %err, "handler failed");
                return DispatchOutcome::Failed;
            }
        }

        self.forward(conversation, signals).await
    }

    async fn dispatch_button_press(
        &self,
        conversation: &ConversationId,
        token: &str,
    ) -> DispatchOutcome {
        let signal = match self.transport.decode_signal(token) {
            Ok(signal) => signal,
            Err(err) => {
                warn!(error = %err, "failed to decode button token");
                return DispatchOutcome::Failed;
            }
        };

        debug!(signal = signal.name(), "button press decoded");
        self.forward(conversation, vec![signal]).await
    }

    /// Publishes the collected signals, containing propagation failures.
    async fn forward(
        &self,
        conversation: &ConversationId,
        signals: Vec<BoxedSignal>,
    ) -> DispatchOutcome {
        for signal in signals {
            match self.bus.publish(signal, conversation, &self.transport).await {
                Ok(report) if report.failures.is_empty() => {}
                Ok(report) => {
                    warn!(failures = report.failures.len(), "slots failed during propagation");
                }
                Err(err) => {
                    error!(error = %err, "signal propagation aborted");
                    return DispatchOutcome::Failed;
                }
            }
        }
        DispatchOutcome::Handled
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SignalBus;
    use crate::context::Bindings;
    use crate::error::HandlerError;
    use crate::handler::into_handler;
    use crate::router::Router;
    use crate::testing::{FailingTransport, RecordingTransport};
    use parley_core::{DeliveryError, codec, impl_signal};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct PillSelected {
        pill: String,
    }
    impl_signal!(PillSelected);

    impl codec::WireSignal for PillSelected {
        fn wire_name() -> &'static str {
            "PillSelected"
        }

        fn to_fields(&self) -> Vec<String> {
            vec![self.pill.clone()]
        }

        fn from_fields(fields: &[String]) -> parley_core::CodecResult<Self> {
            Ok(Self {
                pill: codec::parse_field("PillSelected", fields, 0)?,
            })
        }
    }

    #[tokio::test]
    async fn command_handler_then_subscriber_in_order() {
        // End-to-end: /start sends "Welcome" and emits
        // PillSelected("red"); the subscriber replies "So be it: red".
        let mut router = Router::new();
        router
            .command(
                "start",
                "",
                into_handler(|ctx: Arc<Context>| async move {
                    ctx.send_message("Welcome").await?;
                    Ok(Outcome::emit(PillSelected { pill: "red".into() }))
                }),
            )
            .unwrap();

        let mut bus = SignalBus::new();
        bus.subscribe::<PillSelected, _, _>(|ctx, signal| async move {
            ctx.send_message(&format!("So be it: {}", signal.pill)).await?;
            Ok(Outcome::Done)
        });

        let transport = RecordingTransport::shared();
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(bus),
            transport.clone() as BoxedTransport,
        );

        let outcome = dispatcher
            .dispatch(Envelope::command("c1", "u1", "start", ""))
            .await;

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(
            transport.log(),
            ["c1 <- text: Welcome", "c1 <- text: So be it: red"]
        );
    }

    #[tokio::test]
    async fn text_binding_reaches_the_handler() {
        let mut router = Router::new();
        router
            .message(
                "(?P<text>.*)",
                into_handler(|ctx: Arc<Context>| async move {
                    let text = ctx.binding("text").unwrap_or("").to_string();
                    ctx.send_message(&format!("echo: {text}")).await?;
                    Ok(Outcome::Done)
                }),
            )
            .unwrap();

        let transport = RecordingTransport::shared();
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(SignalBus::new()),
            transport.clone() as BoxedTransport,
        );

        let outcome = dispatcher.dispatch(Envelope::text("c1", "u1", "hello")).await;
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(transport.log(), ["c1 <- text: echo: hello"]);
    }

    #[tokio::test]
    async fn unmatched_text_is_ignored_by_default() {
        let transport = RecordingTransport::shared();
        let dispatcher = Dispatcher::new(
            Arc::new(Router::new()),
            Arc::new(SignalBus::new()),
            transport.clone() as BoxedTransport,
        );

        let outcome = dispatcher.dispatch(Envelope::text("c1", "u1", "anything")).await;
        assert_eq!(outcome, DispatchOutcome::Unmatched);
        assert!(transport.log().is_empty());
    }

    #[tokio::test]
    async fn unmatched_fallback_runs_with_empty_bindings() {
        let transport = RecordingTransport::shared();
        let dispatcher = Dispatcher::new(
            Arc::new(Router::new()),
            Arc::new(SignalBus::new()),
            transport.clone() as BoxedTransport,
        )
        .unmatched(UnmatchedPolicy::Fallback(into_handler(
            |ctx: Arc<Context>| async move {
                assert!(ctx.bindings().is_empty());
                ctx.send_message("I did not get that").await?;
                Ok(Outcome::Done)
            },
        )));

        let outcome = dispatcher.dispatch(Envelope::text("c1", "u1", "???")).await;
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(transport.log(), ["c1 <- text: I did not get that"]);
    }

    #[tokio::test]
    async fn handler_error_is_contained() {
        let mut router = Router::new();
        router
            .command(
                "boom",
                "",
                into_handler(|_ctx| async { Err(HandlerError::new("kaput")) }),
            )
            .unwrap();
        router
            .command(
                "fine",
                "",
                into_handler(|ctx: Arc<Context>| async move {
                    ctx.send_message("still alive").await?;
                    Ok(Outcome::Done)
                }),
            )
            .unwrap();

        let transport = RecordingTransport::shared();
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(SignalBus::new()),
            transport.clone() as BoxedTransport,
        );

        let outcome = dispatcher
            .dispatch(Envelope::command("c1", "u1", "boom", ""))
            .await;
        assert_eq!(outcome, DispatchOutcome::Failed);

        // The failure did not poison the dispatcher or registered state.
        let outcome = dispatcher
            .dispatch(Envelope::command("c2", "u2", "fine", ""))
            .await;
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(transport.log(), ["c2 <- text: still alive"]);
    }

    #[tokio::test]
    async fn delivery_error_surfaces_as_failure() {
        let mut router = Router::new();
        router
            .command(
                "start",
                "",
                into_handler(|ctx: Arc<Context>| async move {
                    ctx.send_message("Welcome").await?;
                    Ok(Outcome::Done)
                }),
            )
            .unwrap();

        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(SignalBus::new()),
            FailingTransport::shared() as BoxedTransport,
        );

        let outcome = dispatcher
            .dispatch(Envelope::command("c1", "u1", "start", ""))
            .await;
        assert_eq!(outcome, DispatchOutcome::Failed);
    }

    #[tokio::test]
    async fn button_press_decodes_and_publishes() {
        let mut bus = SignalBus::new();
        bus.subscribe::<PillSelected, _, _>(|ctx, signal| async move {
            ctx.send_message(&format!("So be it: {}", signal.pill)).await?;
            Ok(Outcome::Done)
        });

        let transport = RecordingTransport::with_decoder(|token| {
            codec::decode::<PillSelected>(token)
                .map(parley_core::BoxedSignal::new)
                .map_err(DeliveryError::from)
        });
        let dispatcher = Dispatcher::new(
            Arc::new(Router::new()),
            Arc::new(bus),
            transport.clone() as BoxedTransport,
        );

        let outcome = dispatcher
            .dispatch(Envelope::button_press("c1", "u1", "PillSelected:blue"))
            .await;
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(transport.log(), ["c1 <- text: So be it: blue"]);
    }

    #[tokio::test]
    async fn undecodable_button_token_fails_cleanly() {
        let transport = RecordingTransport::with_decoder(|token| {
            codec::decode::<PillSelected>(token)
                .map(parley_core::BoxedSignal::new)
                .map_err(DeliveryError::from)
        });
        let dispatcher = Dispatcher::new(
            Arc::new(Router::new()),
            Arc::new(SignalBus::new()),
            transport.clone() as BoxedTransport,
        );

        let outcome = dispatcher
            .dispatch(Envelope::button_press("c1", "u1", "Garbage:zzz"))
            .await;
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert!(transport.log().is_empty());
    }

    #[tokio::test]
    async fn reaction_envelope_routes_to_reaction_endpoint() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let mut router = Router::new();
        router.reaction(
            [parley_core::Reaction::Thinking],
            into_handler(move |_ctx| {
                let hits = Arc::clone(&hits_clone);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(Outcome::Done)
                }
            }),
        );

        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(SignalBus::new()),
            RecordingTransport::shared() as BoxedTransport,
        );

        dispatcher
            .dispatch(Envelope::reaction(
                "c1",
                "u1",
                parley_core::Reaction::Thinking,
            ))
            .await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn command_invokes_exactly_one_handler() {
        let command_hits = Arc::new(AtomicUsize::new(0));
        let message_hits = Arc::new(AtomicUsize::new(0));

        let mut router = Router::new();
        {
            let hits = Arc::clone(&command_hits);
            router
                .command(
                    "start",
                    "",
                    into_handler(move |_ctx| {
                        let hits = Arc::clone(&hits);
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            Ok(Outcome::Done)
                        }
                    }),
                )
                .unwrap();
        }
        {
            let hits = Arc::clone(&message_hits);
            router
                .message(
                    "(?P<text>.*)",
                    into_handler(move |_ctx| {
                        let hits = Arc::clone(&hits);
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            Ok(Outcome::Done)
                        }
                    }),
                )
                .unwrap();
        }

        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(SignalBus::new()),
            RecordingTransport::shared() as BoxedTransport,
        );

        dispatcher
            .dispatch(Envelope::command("c1", "u1", "start", ""))
            .await;

        assert_eq!(command_hits.load(Ordering::SeqCst), 1);
        assert_eq!(message_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mid_execution_publish_is_forwarded() {
        let mut router = Router::new();
        router
            .command(
                "start",
                "",
                into_handler(|ctx: Arc<Context>| async move {
                    ctx.publish(PillSelected { pill: "red".into() });
                    Ok(Outcome::Done)
                }),
            )
            .unwrap();

        let mut bus = SignalBus::new();
        bus.subscribe::<PillSelected, _, _>(|ctx, signal| async move {
            ctx.send_message(&format!("picked {}", signal.pill)).await?;
            Ok(Outcome::Done)
        });

        let transport = RecordingTransport::shared();
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Arc::new(bus),
            transport.clone() as BoxedTransport,
        );

        dispatcher
            .dispatch(Envelope::command("c1", "u1", "start", ""))
            .await;
        assert_eq!(transport.log(), ["c1 <- text: picked red"]);
    }
}
