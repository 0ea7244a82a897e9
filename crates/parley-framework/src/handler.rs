//! Handler and slot type-erasure.
//!
//! Endpoints and subscriptions store their callables type-erased so the
//! router and bus can hold them in plain collections. Application code
//! registers ordinary async closures; [`into_handler`] and [`into_slot`]
//! do the boxing.
//!
//! A handler receives the per-invocation [`Context`] and returns an
//! [`Outcome`]: either it is done, or it hands back a signal for the
//! dispatcher to publish. Signals can also be queued mid-execution with
//! [`Context::publish`](crate::context::Context::publish); both paths feed
//! the same propagation.
//!
//! ```rust,ignore
//! let handler = into_handler(|ctx: Arc<Context>| async move {
//!     ctx.send_message("Welcome").await?;
//!     Ok(Outcome::emit(PillOffered))
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use parley_core::{BoxedSignal, Signal};

use crate::context::Context;
use crate::error::HandlerResult;

/// What a handler produced, beyond its side effects.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing further to propagate.
    Done,
    /// A signal to hand to the bus after the handler returns.
    Emit(BoxedSignal),
}

impl Outcome {
    /// Shorthand for `Outcome::Emit(BoxedSignal::new(signal))`.
    pub fn emit(signal: impl Signal) -> Self {
        Self::Emit(BoxedSignal::new(signal))
    }
}

/// Type-erased endpoint handler.
pub trait ErasedHandler: Send + Sync {
    /// Invokes the handler with the given context.
    fn call(&self, ctx: Arc<Context>) -> BoxFuture<'static, HandlerResult>;
}

/// A shared, type-erased handler as stored by the router.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> ErasedHandler for HandlerFn<F>
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Arc<Context>) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.f)(ctx))
    }
}

/// Boxes an async closure as an endpoint handler.
pub fn into_handler<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}

/// Type-erased signal subscriber.
///
/// The bus guarantees the wrapped slot only ever sees signals of the type
/// it subscribed for, so the downcast inside [`into_slot`] cannot miss.
pub trait ErasedSlot: Send + Sync {
    /// Invokes the slot with a fresh context and the published signal.
    fn call(&self, ctx: Arc<Context>, signal: BoxedSignal) -> BoxFuture<'static, HandlerResult>;
}

/// A shared, type-erased slot as stored by the bus.
pub type BoxedSlot = Arc<dyn ErasedSlot>;

struct SlotFn<S, F> {
    f: F,
    _marker: std::marker::PhantomData<fn() -> S>,
}

impl<S, F, Fut> ErasedSlot for SlotFn<S, F>
where
    S: Signal,
    F: Fn(Arc<Context>, Arc<S>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Arc<Context>, signal: BoxedSignal) -> BoxFuture<'static, HandlerResult> {
        match signal.downcast_arc::<S>() {
            Some(typed) => Box::pin((self.f)(ctx, typed)),
            // Unreachable through the bus; fail loudly rather than run the
            // slot with the wrong payload.
            None => Box::pin(async move {
                Err(crate::error::HandlerError::new(format!(
                    "slot for {} received signal '{}'",
                    std::any::type_name::<S>(),
                    signal.name(),
                )))
            }),
        }
    }
}

/// Boxes an async closure as a subscriber for signal type `S`.
pub fn into_slot<S, F, Fut>(f: F) -> BoxedSlot
where
    S: Signal,
    F: Fn(Arc<Context>, Arc<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(SlotFn {
        f,
        _marker: std::marker::PhantomData,
    })
}
