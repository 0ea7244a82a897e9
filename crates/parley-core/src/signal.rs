//! Signals: typed, application-defined occurrences.
//!
//! A signal is a plain value describing that something happened
//! (`PillSelected { pill: "red" }`). Handlers create signals and hand them
//! to the dispatcher; the signal bus fans them out to whichever slots
//! subscribed to that exact signal type. Signals have no identity beyond
//! type plus payload and are never mutated after creation.
//!
//! # Defining a signal
//!
//! ```rust,ignore
//! use parley_core::{Signal, impl_signal};
//!
//! #[derive(Debug, Clone)]
//! struct PillSelected {
//!     pill: String,
//! }
//!
//! impl_signal!(PillSelected);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// The base trait for all signals.
///
/// Implementations are usually generated with [`impl_signal!`]. The bus
/// routes on the concrete Rust type (via [`TypeId`]), never on the name;
/// `name()` exists for logging and for the wire codec.
pub trait Signal: Any + Send + Sync + fmt::Debug {
    /// Human-readable signal name, used in logs and callback tokens.
    fn name(&self) -> &'static str;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any_ref(&self) -> &dyn Any;

    /// Returns self as an `Arc<dyn Any>` for shared downcasting.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Generates the [`Signal`] boilerplate for a concrete type.
///
/// The signal name is the bare type identifier, which is also what the
/// wire codec puts in front of encoded callback tokens.
#[macro_export]
macro_rules! impl_signal {
    ($ty:ident) => {
        impl $crate::Signal for $ty {
            fn name(&self) -> &'static str {
                stringify!($ty)
            }

            fn as_any_ref(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_arc(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + Send + Sync> {
                self
            }
        }
    };
}

/// A type-erased, cheaply cloneable signal.
///
/// `BoxedSignal` wraps any [`Signal`] in an `Arc`, letting it travel
/// through the dispatcher and bus without the concrete type. Subscribers
/// get it back with [`downcast_ref`](Self::downcast_ref) or
/// [`downcast_arc`](Self::downcast_arc).
#[derive(Clone)]
pub struct BoxedSignal {
    inner: Arc<dyn Signal>,
}

impl BoxedSignal {
    /// Wraps a concrete signal.
    pub fn new<S: Signal>(signal: S) -> Self {
        Self {
            inner: Arc::new(signal),
        }
    }

    /// The signal's human-readable name.
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// The `TypeId` of the wrapped concrete type.
    ///
    /// This is the bus routing key: subscribers for type `T` receive only
    /// signals whose `signal_type()` equals `TypeId::of::<T>()`.
    pub fn signal_type(&self) -> TypeId {
        self.inner.as_any_ref().type_id()
    }

    /// Returns `true` if the wrapped signal is of type `S`.
    pub fn is<S: Signal>(&self) -> bool {
        self.signal_type() == TypeId::of::<S>()
    }

    /// Attempts to downcast to a reference of the concrete type.
    pub fn downcast_ref<S: Signal>(&self) -> Option<&S> {
        self.inner.as_any_ref().downcast_ref()
    }

    /// Attempts to downcast to a shared handle of the concrete type.
    pub fn downcast_arc<S: Signal>(&self) -> Option<Arc<S>> {
        Arc::clone(&self.inner).as_any_arc().downcast::<S>().ok()
    }
}

impl<S: Signal> From<S> for BoxedSignal {
    fn from(signal: S) -> Self {
        Self::new(signal)
    }
}

impl fmt::Debug for BoxedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedSignal")
            .field("name", &self.name())
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct PillSelected {
        pill: String,
    }

    impl_signal!(PillSelected);

    #[derive(Debug, Clone)]
    struct DeckFinished;

    impl_signal!(DeckFinished);

    #[test]
    fn name_is_type_identifier() {
        let signal = BoxedSignal::new(PillSelected { pill: "red".into() });
        assert_eq!(signal.name(), "PillSelected");
    }

    #[test]
    fn downcast_is_exact_type_only() {
        let signal = BoxedSignal::new(PillSelected { pill: "red".into() });
        assert!(signal.is::<PillSelected>());
        assert!(!signal.is::<DeckFinished>());
        assert!(signal.downcast_ref::<DeckFinished>().is_none());

        let pill = signal.downcast_ref::<PillSelected>();
        assert_eq!(pill.map(|p| p.pill.as_str()), Some("red"));
    }

    #[test]
    fn downcast_arc_shares_the_value() {
        let signal = BoxedSignal::new(PillSelected { pill: "blue".into() });
        let copy = signal.clone();

        let a = signal.downcast_arc::<PillSelected>();
        let b = copy.downcast_arc::<PillSelected>();
        assert!(a.is_some());
        assert_eq!(a.as_deref(), b.as_deref());
    }
}
