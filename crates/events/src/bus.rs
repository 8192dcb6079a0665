//! In-process publish/subscribe.
//!
//! Dispatch is synchronous and in subscription order; a panicking handler is
//! isolated so the remaining handlers still run. There is no replay and no
//! persistence: an event reaches exactly the handlers subscribed at dispatch
//! time. Buses are plain values handed to collaborators, so tests can
//! instantiate isolated ones.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// An event that can travel on an [`EventBus`]. `kind` is the stable string
/// consumed by UI collaborators.
pub trait BusEvent: Clone + Send + 'static {
    fn kind(&self) -> &'static str;
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct BusInner<E> {
    next_id: u64,
    // kind -> handlers in subscription order
    handlers: HashMap<&'static str, Vec<(u64, Handler<E>)>>,
}

/// A typed event bus. Cloning yields another handle to the same bus.
pub struct EventBus<E: BusEvent> {
    inner: Arc<Mutex<BusInner<E>>>,
}

impl<E: BusEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                next_id: 0,
                handlers: HashMap::new(),
            })),
        }
    }

    /// Subscribe to one event kind. The handler fires until the returned
    /// [`Subscription`] is explicitly unsubscribed.
    pub fn subscribe<F>(&self, kind: &'static str, handler: F) -> Subscription<E>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().expect("bus lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription {
            bus: Arc::clone(&self.inner),
            kind,
            id,
        }
    }

    /// Dispatch to all currently subscribed handlers for the event's kind.
    ///
    /// Handlers are cloned out of the lock before running, so a handler may
    /// itself subscribe or dispatch without deadlocking.
    pub fn dispatch(&self, event: E) {
        let handlers: Vec<Handler<E>> = {
            let inner = self.inner.lock().expect("bus lock poisoned");
            inner
                .handlers
                .get(event.kind())
                .map(|hs| hs.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                warn!(kind = event.kind(), "event handler panicked");
            }
        }
    }
}

/// Handle to one subscription on an [`EventBus`].
pub struct Subscription<E: BusEvent> {
    bus: Arc<Mutex<BusInner<E>>>,
    kind: &'static str,
    id: u64,
}

impl<E: BusEvent> Subscription<E> {
    pub fn unsubscribe(self) {
        let mut inner = self.bus.lock().expect("bus lock poisoned");
        if let Some(handlers) = inner.handlers.get_mut(self.kind) {
            handlers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Ping(u32),
        Pong,
    }

    impl BusEvent for TestEvent {
        fn kind(&self) -> &'static str {
            match self {
                TestEvent::Ping(_) => "PING",
                TestEvent::Pong => "PONG",
            }
        }
    }

    #[test]
    fn dispatch_reaches_subscribers_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = {
            let seen = Arc::clone(&seen);
            bus.subscribe("PING", move |_| seen.lock().unwrap().push(1))
        };
        let s2 = {
            let seen = Arc::clone(&seen);
            bus.subscribe("PING", move |_| seen.lock().unwrap().push(2))
        };

        bus.dispatch(TestEvent::Ping(7));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);

        s1.unsubscribe();
        bus.dispatch(TestEvent::Ping(8));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2]);
        s2.unsubscribe();
    }

    #[test]
    fn dispatch_only_matches_kind() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _sub = {
            let count = Arc::clone(&count);
            bus.subscribe("PONG", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        bus.dispatch(TestEvent::Ping(1));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        bus.dispatch(TestEvent::Pong);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_handler_does_not_starve_the_rest() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _bad = bus.subscribe("PING", |_| panic!("boom"));
        let _good = {
            let count = Arc::clone(&count);
            bus.subscribe("PING", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        bus.dispatch(TestEvent::Ping(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_dispatch_reentrantly() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _pong = {
            let count = Arc::clone(&count);
            bus.subscribe("PONG", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let _ping = {
            let bus2 = bus.clone();
            bus.subscribe("PING", move |_| bus2.dispatch(TestEvent::Pong))
        };

        bus.dispatch(TestEvent::Ping(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
