// Copyright 2025 Hookforge (https://github.com/hookforge)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Event registry: per-event ordered subscriber lists.

use crate::event::{EventName, InvalidEventName};
use crate::handlers::{EventHandler, EventSubscriber, SharedHandler};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Priority level for subscriber execution.
/// Lower values execute first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Default for Priority {
    fn default() -> Self {
        Priority(100)
    }
}

impl Priority {
    /// Highest priority (executes first).
    pub const HIGHEST: Priority = Priority(0);
    /// High priority.
    pub const HIGH: Priority = Priority(25);
    /// Normal priority.
    pub const NORMAL: Priority = Priority(50);
    /// Low priority.
    pub const LOW: Priority = Priority(75);
    /// Lowest priority (executes last).
    pub const LOWEST: Priority = Priority(100);
}

/// A registered subscriber entry.
///
/// Entries for one event are kept sorted by `(priority, seq)`, so equal
/// priorities fire in registration order.
#[derive(Clone)]
pub struct SubscriberEntry {
    /// Registration sequence number, unique across the registry.
    pub seq: u64,
    /// Execution order key.
    pub priority: Priority,
    /// The handler to invoke.
    pub handler: SharedHandler,
}

impl SubscriberEntry {
    /// The subscriber identity used in dispatch reports.
    pub fn subscriber_name(&self) -> &str {
        self.handler.name()
    }
}

/// Handle identifying one registration, returned by [`EventRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    event: EventName,
    seq: u64,
}

impl SubscriptionHandle {
    /// Event the subscription is bound to.
    pub fn event(&self) -> &EventName {
        &self.event
    }

    /// Registration sequence number of the subscription.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidEventName(#[from] InvalidEventName),

    #[error("no subscription {seq} for event {event}")]
    SubscriptionNotFound { event: String, seq: u64 },

    #[error("handler already exists: {0}")]
    HandlerAlreadyExists(String),

    #[error("handler not found: {0}")]
    HandlerNotFound(String),
}

/// Registry of subscribers keyed by event name.
///
/// Storage is a sharded concurrent map; reads take a cloned snapshot, so
/// dispatch never holds a lock while handlers run. Registration order across
/// unrelated events is irrelevant; only intra-event order matters.
pub struct EventRegistry {
    /// Subscribers indexed by event name, each list sorted by `(priority, seq)`.
    subscribers: DashMap<String, Vec<SubscriberEntry>>,
    /// Named handlers, resolvable from declarative configuration.
    named_handlers: DashMap<String, SharedHandler>,
    /// Next registration sequence number.
    next_seq: AtomicU64,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            named_handlers: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Register a handler for an event.
    ///
    /// Fails only on a malformed (empty) event name. The entry list for the
    /// event is re-sorted so it is fully ordered after every insertion.
    pub fn register(
        &self,
        event: &str,
        handler: SharedHandler,
        priority: Priority,
    ) -> Result<SubscriptionHandle, RegistryError> {
        let event = EventName::new(event)?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let mut entries = self
            .subscribers
            .entry(event.as_str().to_string())
            .or_default();
        entries.push(SubscriberEntry {
            seq,
            priority,
            handler,
        });
        entries.sort_by_key(|e| (e.priority, e.seq));

        Ok(SubscriptionHandle { event, seq })
    }

    /// Register every subscription a component exposes.
    pub fn register_subscriber(
        &self,
        subscriber: &dyn EventSubscriber,
    ) -> Result<Vec<SubscriptionHandle>, RegistryError> {
        subscriber
            .subscriptions()
            .into_iter()
            .map(|s| self.register(s.event.as_str(), s.handler, s.priority))
            .collect()
    }

    /// Remove a subscription by handle.
    ///
    /// Removing an already-removed handle signals `SubscriptionNotFound` but
    /// causes no corruption.
    pub fn unregister(&self, handle: &SubscriptionHandle) -> Result<(), RegistryError> {
        let removed = self
            .subscribers
            .get_mut(handle.event.as_str())
            .map(|mut entries| {
                let before = entries.len();
                entries.retain(|e| e.seq != handle.seq);
                entries.len() != before
            })
            .unwrap_or(false);

        if removed {
            Ok(())
        } else {
            Err(RegistryError::SubscriptionNotFound {
                event: handle.event.as_str().to_string(),
                seq: handle.seq,
            })
        }
    }

    /// Get all subscribers for an event, in firing order.
    ///
    /// Returns a snapshot; an event with no subscribers yields an empty list,
    /// never an error.
    pub fn subscribers_for(&self, event: &str) -> Vec<SubscriberEntry> {
        self.subscribers
            .get(event)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Register a named handler.
    ///
    /// Named handlers are referenced by declarative subscription
    /// configuration (see [`crate::config::EngineConfig`]).
    pub fn register_handler(
        &self,
        name: impl Into<String>,
        handler: impl EventHandler + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.named_handlers.contains_key(&name) {
            return Err(RegistryError::HandlerAlreadyExists(name));
        }
        self.named_handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    /// Resolve a named handler.
    pub fn get_handler(&self, name: &str) -> Option<SharedHandler> {
        self.named_handlers.get(name).map(|h| h.clone())
    }

    /// List all registered handler names.
    pub fn handler_names(&self) -> Vec<String> {
        self.named_handlers.iter().map(|r| r.key().clone()).collect()
    }

    /// Total number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscribers.iter().map(|r| r.value().len()).sum()
    }

    /// Clear all subscriptions and named handlers.
    pub fn clear(&self) {
        self.subscribers.clear();
        self.named_handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::NoOpHandler;

    fn handler(name: &str) -> SharedHandler {
        Arc::new(NoOpHandler::new(name))
    }

    #[test]
    fn test_register_rejects_empty_event() {
        let registry = EventRegistry::new();
        assert!(registry
            .register("", handler("h"), Priority::default())
            .is_err());
    }

    #[test]
    fn test_subscribers_sorted_by_priority() {
        let registry = EventRegistry::new();
        registry
            .register("ui.header", handler("low"), Priority(75))
            .unwrap();
        registry
            .register("ui.header", handler("high"), Priority(10))
            .unwrap();
        registry
            .register("ui.header", handler("normal"), Priority(50))
            .unwrap();

        let order: Vec<_> = registry
            .subscribers_for("ui.header")
            .iter()
            .map(|e| e.subscriber_name().to_string())
            .collect();
        assert_eq!(order, ["high", "normal", "low"]);
    }

    #[test]
    fn test_equal_priority_preserves_registration_order() {
        let registry = EventRegistry::new();
        for name in ["first", "second", "third"] {
            registry
                .register("ui.header", handler(name), Priority(50))
                .unwrap();
        }

        let order: Vec<_> = registry
            .subscribers_for("ui.header")
            .iter()
            .map(|e| e.subscriber_name().to_string())
            .collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[test]
    fn test_unknown_event_yields_empty_list() {
        let registry = EventRegistry::new();
        assert!(registry.subscribers_for("nothing.here").is_empty());
    }

    #[test]
    fn test_unregister_is_idempotent_with_not_found() {
        let registry = EventRegistry::new();
        let keep = registry
            .register("ui.header", handler("keep"), Priority(50))
            .unwrap();
        let drop = registry
            .register("ui.header", handler("drop"), Priority(50))
            .unwrap();

        registry.unregister(&drop).unwrap();
        assert!(matches!(
            registry.unregister(&drop),
            Err(RegistryError::SubscriptionNotFound { .. })
        ));

        let remaining = registry.subscribers_for("ui.header");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].seq, keep.seq());
    }

    #[test]
    fn test_named_handler_duplicate_rejected() {
        let registry = EventRegistry::new();
        registry.register_handler("log", NoOpHandler::new("1")).unwrap();
        assert!(registry
            .register_handler("log", NoOpHandler::new("2"))
            .is_err());
        assert!(registry.get_handler("log").is_some());
    }

    #[test]
    fn test_register_subscriber_bulk() {
        use crate::event::EventName;
        use crate::handlers::{EventSubscriber, Subscription};

        struct Widget;
        impl EventSubscriber for Widget {
            fn subscriptions(&self) -> Vec<Subscription> {
                vec![
                    Subscription::new(
                        EventName::new("ui.header").unwrap(),
                        Priority(10),
                        Arc::new(NoOpHandler::new("header")),
                    ),
                    Subscription::new(
                        EventName::new("ui.footer").unwrap(),
                        Priority(20),
                        Arc::new(NoOpHandler::new("footer")),
                    ),
                ]
            }
        }

        let registry = EventRegistry::new();
        let handles = registry.register_subscriber(&Widget).unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(registry.subscription_count(), 2);
        assert_eq!(registry.subscribers_for("ui.footer").len(), 1);
    }
}
