//! The signal bus.
//!
//! Publish/subscribe fan-out that decouples the code emitting a signal from
//! the code reacting to it: a keyboard defined in one flow can trigger
//! logic registered by another, with neither knowing about the other.
//!
//! Subscriptions are keyed by the signal's concrete Rust type. Matching is
//! exact - a signal type never routes to subscribers of any other type, no
//! matter how the application relates the types to each other.
//!
//! # Propagation
//!
//! Slots may themselves emit signals. The bus propagates them breadth
//! first: every signal of generation N is delivered before any signal
//! produced while handling generation N. This keeps causal order readable
//! and bounds recursion; a chain deeper than the configured maximum fails
//! with [`SignalError::DepthExceeded`] instead of looping forever.
//!
//! The bus is populated at setup time (`&mut self`) and read-only during
//! dispatch, so it is shared as a plain `Arc` without locking.

use std::any::TypeId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, trace};

use parley_core::{BoxedSignal, BoxedTransport, ConversationId, Signal};

use crate::context::{Bindings, Context};
use crate::error::{HandlerError, HandlerResult, SignalError};
use crate::handler::{BoxedSlot, Outcome, into_slot};

/// Default bound on signal propagation depth.
pub const DEFAULT_MAX_DEPTH: usize = 20;

struct Subscription {
    /// Concrete signal type name, for logs.
    signal: &'static str,
    slot: BoxedSlot,
}

/// Summary of one publish pass.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Slots that ran to completion.
    pub delivered: usize,
    /// Failures raised by slots, contained per-slot.
    pub failures: Vec<HandlerError>,
    /// Number of propagation generations dispatched.
    pub generations: usize,
}

/// Decoupled publish/subscribe dispatch for signals.
pub struct SignalBus {
    subscriptions: HashMap<TypeId, Vec<Subscription>>,
    max_depth: usize,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Overrides the propagation depth bound.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Subscribes a slot to signal type `S`.
    ///
    /// Slots for one type run in registration order. There is no
    /// deduplication: subscribing the same closure twice runs it twice.
    pub fn subscribe<S, F, Fut>(&mut self, slot: F) -> &mut Self
    where
        S: Signal,
        F: Fn(Arc<Context>, Arc<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        debug!(signal = std::any::type_name::<S>(), "subscribing slot");
        self.subscriptions
            .entry(TypeId::of::<S>())
            .or_default()
            .push(Subscription {
                signal: std::any::type_name::<S>(),
                slot: into_slot(slot),
            });
        self
    }

    /// Number of slots subscribed to `S`.
    pub fn subscriber_count<S: Signal>(&self) -> usize {
        self.subscriptions
            .get(&TypeId::of::<S>())
            .map_or(0, Vec::len)
    }

    /// Publishes a signal, driving the whole propagation chain it starts.
    ///
    /// Each slot gets a fresh [`Context`] bound to the originating
    /// conversation. Slot failures are collected in the report and never
    /// abort sibling slots; only exceeding the depth bound aborts the
    /// chain.
    pub async fn publish(
        &self,
        signal: BoxedSignal,
        conversation: &ConversationId,
        transport: &BoxedTransport,
    ) -> Result<PublishReport, SignalError> {
        let origin = signal.name();
        let mut report = PublishReport::default();
        let mut generation = vec![signal];
        let mut depth = 0;

        while !generation.is_empty() {
            if depth >= self.max_depth {
                return Err(SignalError::DepthExceeded {
                    depth: self.max_depth,
                    origin,
                });
            }

            let mut next = Vec::new();
            for signal in generation {
                let Some(subscriptions) = self.subscriptions.get(&signal.signal_type()) else {
                    debug!(signal = signal.name(), "no subscribers");
                    continue;
                };

                for subscription in subscriptions {
                    trace!(signal = subscription.signal, depth, "invoking slot");
                    let ctx = Arc::new(Context::new(
                        conversation.clone(),
                        transport.clone(),
                        Bindings::new(),
                    ));

                    let result = subscription.slot.call(Arc::clone(&ctx), signal.clone()).await;
                    next.extend(ctx.drain_published());
                    match result {
                        Ok(Outcome::Done) => report.delivered += 1,
                        Ok(Outcome::Emit(emitted)) => {
                            report.delivered += 1;
                            next.push(emitted);
                        }
                        Err(err) => {
                            error!(signal = subscription.signal, error = %err, "slot failed");
                            report.failures.push(err);
                        }
                    }
                }
            }

            report.generations += 1;
            generation = next;
            depth += 1;
        }

        Ok(report)
    }
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("signal_types", &self.subscriptions.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use parley_core::impl_signal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct PillSelected {
        pill: String,
    }
    impl_signal!(PillSelected);

    #[derive(Debug, Clone)]
    struct PillSwallowed;
    impl_signal!(PillSwallowed);

    #[derive(Debug, Clone)]
    struct Unrelated;
    impl_signal!(Unrelated);

    fn scope() -> (ConversationId, BoxedTransport) {
        (ConversationId::from("c1"), RecordingTransport::shared() as BoxedTransport)
    }

    #[tokio::test]
    async fn all_subscribers_run_in_registration_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let mut bus = SignalBus::new();
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe::<PillSelected, _, _>(move |_ctx, _signal| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().push(tag);
                    Ok(Outcome::Done)
                }
            });
        }

        let (conversation, transport) = scope();
        let report = bus
            .publish(
                BoxedSignal::new(PillSelected { pill: "red".into() }),
                &conversation,
                &transport,
            )
            .await
            .unwrap();

        assert_eq!(report.delivered, 3);
        assert_eq!(*order.lock(), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn exact_type_match_only() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let mut bus = SignalBus::new();
        bus.subscribe::<Unrelated, _, _>(move |_ctx, _signal| {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(Outcome::Done)
            }
        });

        let (conversation, transport) = scope();
        let report = bus
            .publish(
                BoxedSignal::new(PillSelected { pill: "red".into() }),
                &conversation,
                &transport,
            )
            .await
            .unwrap();

        assert_eq!(report.delivered, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_subscription_runs_twice() {
        let hits = Arc::new(AtomicUsize::new(0));

        let mut bus = SignalBus::new();
        for _ in 0..2 {
            let hits = Arc::clone(&hits);
            bus.subscribe::<PillSwallowed, _, _>(move |_ctx, _signal| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(Outcome::Done)
                }
            });
        }
        assert_eq!(bus.subscriber_count::<PillSwallowed>(), 2);

        let (conversation, transport) = scope();
        bus.publish(BoxedSignal::new(PillSwallowed), &conversation, &transport)
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn propagation_is_breadth_first() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let mut bus = SignalBus::new();
        {
            let order = Arc::clone(&order);
            bus.subscribe::<PillSelected, _, _>(move |ctx, _signal| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().push("selected-a");
                    ctx.publish(PillSwallowed);
                    Ok(Outcome::Done)
                }
            });
        }
        {
            let order = Arc::clone(&order);
            bus.subscribe::<PillSelected, _, _>(move |_ctx, _signal| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().push("selected-b");
                    Ok(Outcome::Done)
                }
            });
        }
        {
            let order = Arc::clone(&order);
            bus.subscribe::<PillSwallowed, _, _>(move |_ctx, _signal| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().push("swallowed");
                    Ok(Outcome::Done)
                }
            });
        }

        let (conversation, transport) = scope();
        let report = bus
            .publish(
                BoxedSignal::new(PillSelected { pill: "red".into() }),
                &conversation,
                &transport,
            )
            .await
            .unwrap();

        // Generation 1 completes before the signal it produced is handled.
        assert_eq!(*order.lock(), ["selected-a", "selected-b", "swallowed"]);
        assert_eq!(report.generations, 2);
    }

    #[tokio::test]
    async fn self_republishing_slot_hits_the_depth_bound() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let mut bus = SignalBus::new().with_max_depth(5);
        bus.subscribe::<PillSwallowed, _, _>(move |ctx, _signal| {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                ctx.publish(PillSwallowed);
                Ok(Outcome::Done)
            }
        });

        let (conversation, transport) = scope();
        let err = bus
            .publish(BoxedSignal::new(PillSwallowed), &conversation, &transport)
            .await
            .unwrap_err();

        assert!(matches!(err, SignalError::DepthExceeded { depth: 5, .. }));
        // One invocation per generation up to the bound, nothing unbounded.
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn slot_failure_does_not_stop_siblings() {
        let hits = Arc::new(AtomicUsize::new(0));

        let mut bus = SignalBus::new();
        bus.subscribe::<PillSwallowed, _, _>(|_ctx, _signal| async {
            Err(HandlerError::new("boom"))
        });
        {
            let hits = Arc::clone(&hits);
            bus.subscribe::<PillSwallowed, _, _>(move |_ctx, _signal| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(Outcome::Done)
                }
            });
        }

        let (conversation, transport) = scope();
        let report = bus
            .publish(BoxedSignal::new(PillSwallowed), &conversation, &transport)
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn each_slot_gets_its_own_context() {
        let contexts = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let mut bus = SignalBus::new();
        for _ in 0..2 {
            let contexts = Arc::clone(&contexts);
            bus.subscribe::<PillSwallowed, _, _>(move |ctx, _signal| {
                let contexts = Arc::clone(&contexts);
                async move {
                    contexts.lock().push(Arc::clone(&ctx));
                    Ok(Outcome::Done)
                }
            });
        }

        let (conversation, transport) = scope();
        bus.publish(BoxedSignal::new(PillSwallowed), &conversation, &transport)
            .await
            .unwrap();

        let seen = contexts.lock();
        assert_eq!(seen.len(), 2);
        assert!(
            !Arc::ptr_eq(&seen[0], &seen[1]),
            "contexts must not be shared"
        );
        assert!(seen.iter().all(|ctx| ctx.conversation() == &conversation));
    }
}
