// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::sync::{read, write};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// A handler invoked for every event emitted on its topic.
///
/// Returning `Err` reports the failure; it is logged by the bus and never
/// reaches the emitter or sibling handlers.
pub type EventHandler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// An event as seen by a handler.
pub struct Event {
    topic: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Event {
    /// The topic the event was emitted on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The payload, if it is a `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("topic", &self.topic).finish()
    }
}

#[derive(Clone)]
struct Listener {
    id: u64,
    handler: EventHandler,
    once: bool,
}

#[derive(Default)]
struct BusShared {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl BusShared {
    fn remove(&self, topic: &str, id: u64) -> bool {
        let mut listeners = write(&self.listeners);
        let Some(list) = listeners.get_mut(topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|listener| listener.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(topic);
        }
        removed
    }
}

/// Handle returned by [`EventBus::on`] and [`EventBus::once`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`] or
/// [`EventBus::off`].
#[derive(Debug, Clone)]
pub struct Subscription {
    topic: String,
    id: u64,
    bus: Weak<BusShared>,
}

impl Subscription {
    /// The topic this subscription listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Removes the handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.remove(&self.topic, self.id))
    }
}

impl fmt::Debug for BusShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusShared").finish_non_exhaustive()
    }
}

/// A synchronous, topic-keyed event bus.
///
/// Cloning yields another handle to the same bus. Handlers run on the
/// emitting thread, in subscription order, against a snapshot of the
/// topic's listeners taken when `emit` starts. No lock is held while a
/// handler runs, so handlers may subscribe, unsubscribe and emit freely;
/// nested emits complete before the outer emit moves to its next handler.
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<BusShared>,
}

impl EventBus {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to `topic`.
    ///
    /// Subscribing the same closure twice registers it twice.
    pub fn on<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(topic, Arc::new(handler), false)
    }

    /// Subscribes `handler` for the next event on `topic` only.
    pub fn once<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(topic, Arc::new(handler), true)
    }

    /// Subscribes an already shared handler.
    pub fn subscribe(&self, topic: &str, handler: EventHandler, once: bool) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        write(&self.shared.listeners)
            .entry(topic.to_string())
            .or_default()
            .push(Listener { id, handler, once });
        Subscription {
            topic: topic.to_string(),
            id,
            bus: Arc::downgrade(&self.shared),
        }
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn off(&self, subscription: &Subscription) -> bool {
        self.shared.remove(&subscription.topic, subscription.id)
    }

    /// Delivers `payload` to every handler of `topic`.
    pub fn emit<T: Any + Send + Sync>(&self, topic: &str, payload: T) {
        self.emit_shared(topic, Arc::new(payload));
    }

    /// Delivers an already shared payload to every handler of `topic`.
    pub fn emit_shared(&self, topic: &str, payload: Arc<dyn Any + Send + Sync>) {
        let snapshot: Vec<Listener> = match read(&self.shared.listeners).get(topic) {
            Some(list) => list.clone(),
            None => {
                log::trace!("No listeners for '{topic}'");
                return;
            }
        };

        let event = Event {
            topic: topic.to_string(),
            payload,
        };
        for listener in snapshot {
            // A once-listener is claimed before it runs so a re-entrant emit
            // cannot fire it a second time.
            if listener.once && !self.shared.remove(topic, listener.id) {
                continue;
            }
            if let Err(e) = (listener.handler)(&event) {
                log::error!("Event handler for '{topic}' failed: {e:#}");
            }
        }
    }

    /// Removes all listeners of `topic`, or of every topic when `None`.
    pub fn clear(&self, topic: Option<&str>) {
        let mut listeners = write(&self.shared.listeners);
        match topic {
            Some(topic) => {
                listeners.remove(topic);
            }
            None => listeners.clear(),
        }
    }

    /// Number of handlers currently subscribed to `topic`.
    pub fn listener_count(&self, topic: &str) -> usize {
        read(&self.shared.listeners)
            .get(topic)
            .map_or(0, |list| list.len())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = read(&self.shared.listeners).len();
        f.debug_struct("EventBus").field("topics", &topics).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |label: &str| {
            let sink = Arc::clone(&sink);
            let label = label.to_string();
            Box::new(move |_: &Event| {
                sink.lock().unwrap().push(label.clone());
                Ok(())
            }) as Box<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>
        };
        (log, make)
    }

    #[test]
    fn handlers_run_in_subscription_order_with_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            bus.on("t", move |event| {
                let value = event.payload::<u32>().copied().unwrap_or_default();
                seen.lock().unwrap().push(format!("{label}{value}"));
                Ok(())
            });
        }

        bus.emit("t", 7u32);
        assert_eq!(*seen.lock().unwrap(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn failing_handler_does_not_stop_siblings() {
        let bus = EventBus::new();
        let (log, make) = recorder();

        bus.on("t", make("first"));
        bus.on("t", |_| anyhow::bail!("boom"));
        bus.on("t", make("third"));

        bus.emit("t", ());
        assert_eq!(*log.lock().unwrap(), vec!["first", "third"]);
    }

    #[test]
    fn once_handler_fires_exactly_once() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.once("t", make("once"));

        bus.emit("t", ());
        bus.emit("t", ());
        assert_eq!(*log.lock().unwrap(), vec!["once"]);
        assert_eq!(bus.listener_count("t"), 0);
    }

    #[test]
    fn once_handler_is_not_refired_by_reentrant_emit() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU64::new(0));

        let inner_bus = bus.clone();
        let counter = Arc::clone(&count);
        bus.once("t", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            inner_bus.emit("t", ());
            Ok(())
        });

        bus.emit("t", ());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let sub = bus.on("t", make("x"));

        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert!(!bus.off(&sub));

        bus.emit("t", ());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn handler_unsubscribing_itself_still_sees_current_emit() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let own = Arc::clone(&slot);
        let sub = bus.on("t", move |_| {
            if let Some(sub) = own.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(sub);
        bus.on("t", make("sibling"));

        bus.emit("t", ());
        bus.emit("t", ());
        assert_eq!(*log.lock().unwrap(), vec!["sibling", "sibling"]);
        assert_eq!(bus.listener_count("t"), 1);
    }

    #[test]
    fn handler_added_during_emit_waits_for_next_emit() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let make = Arc::new(make);

        let inner_bus = bus.clone();
        let added = Arc::new(AtomicU64::new(0));
        let flag = Arc::clone(&added);
        let factory = Arc::clone(&make);
        bus.on("t", move |_| {
            if flag.fetch_add(1, Ordering::SeqCst) == 0 {
                inner_bus.on("t", factory("late"));
            }
            Ok(())
        });

        bus.emit("t", ());
        assert!(log.lock().unwrap().is_empty());
        bus.emit("t", ());
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
    }

    #[test]
    fn nested_emits_are_depth_first() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = bus.clone();
        let o = Arc::clone(&order);
        bus.on("outer", move |_| {
            o.lock().unwrap().push("outer:1");
            inner_bus.emit("inner", ());
            Ok(())
        });
        let o = Arc::clone(&order);
        bus.on("outer", move |_| {
            o.lock().unwrap().push("outer:2");
            Ok(())
        });
        let o = Arc::clone(&order);
        bus.on("inner", move |_| {
            o.lock().unwrap().push("inner");
            Ok(())
        });

        bus.emit("outer", ());
        assert_eq!(*order.lock().unwrap(), vec!["outer:1", "inner", "outer:2"]);
    }

    #[test]
    fn duplicate_registrations_are_independent() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU64::new(0));
        let handler: EventHandler = {
            let count = Arc::clone(&count);
            Arc::new(move |_: &Event| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };

        let first = bus.subscribe("t", Arc::clone(&handler), false);
        bus.subscribe("t", handler, false);
        bus.emit("t", ());
        assert_eq!(count.load(Ordering::SeqCst), 2);

        first.unsubscribe();
        bus.emit("t", ());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn clear_by_topic_or_everything() {
        let bus = EventBus::new();
        bus.on("a", |_| Ok(()));
        bus.on("a", |_| Ok(()));
        bus.on("b", |_| Ok(()));

        bus.clear(Some("a"));
        assert_eq!(bus.listener_count("a"), 0);
        assert_eq!(bus.listener_count("b"), 1);

        bus.clear(None);
        assert_eq!(bus.listener_count("b"), 0);
    }

    #[test]
    fn emit_without_listeners_is_a_no_op() {
        let bus = EventBus::new();
        bus.emit("nobody", 1u8);
        assert_eq!(bus.listener_count("nobody"), 0);
    }
}
