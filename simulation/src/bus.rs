//! Publish/subscribe fan-out of simulation events to outer collaborators.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    fmt,
    rc::{Rc, Weak},
};

use rooftop_runner_core::Event;

type Listener = Box<dyn FnMut(&Event)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
    dispatching: bool,
    in_flight: usize,
    removed: BTreeSet<u64>,
}

impl Registry {
    fn remove(&mut self, id: u64) {
        if self.listeners.remove(&id).is_none() && self.dispatching {
            let _ = self.removed.insert(id);
        }
    }
}

/// Single-threaded event bus delivering events in publication order.
#[derive(Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    /// Creates a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener that stays subscribed until the returned handle is dropped.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&Event) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let _ = registry.listeners.insert(id, Box::new(listener));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Delivers the events to every listener, in order.
    ///
    /// Listeners may drop subscriptions, including their own, while events are delivered.
    pub fn publish(&self, events: &[Event]) {
        if events.is_empty() {
            return;
        }

        let mut listeners = {
            let mut registry = self.registry.borrow_mut();
            registry.dispatching = true;
            registry.in_flight = registry.listeners.len();
            std::mem::take(&mut registry.listeners)
        };

        for event in events {
            for (id, listener) in &mut listeners {
                if self.registry.borrow().removed.contains(id) {
                    continue;
                }
                listener(event);
            }
        }

        let mut registry = self.registry.borrow_mut();
        let removed = std::mem::take(&mut registry.removed);
        registry.dispatching = false;
        registry.in_flight = 0;
        registry
            .listeners
            .extend(listeners.into_iter().filter(|(id, _)| !removed.contains(id)));
    }

    /// Number of live subscriptions, including listeners taken out for an ongoing publish.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let registry = self.registry.borrow();
        registry.listeners.len() + registry.in_flight - registry.removed.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle tying a listener to its owner's lifetime.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(self.id);
        }
    }
}
