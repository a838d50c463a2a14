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

//! Event dispatcher: sequential subscriber invocation with failure isolation.

use crate::event::EventPayload;
use crate::handlers::{Fragment, HandlerError, HookResponse};
use crate::registry::{EventRegistry, Priority};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of invoking a single subscriber.
#[derive(Debug)]
pub struct SubscriberOutcome {
    /// Subscriber identity (handler name).
    pub subscriber: String,
    /// Registration sequence of the subscription.
    pub seq: u64,
    /// Priority the subscription fired at.
    pub priority: Priority,
    /// The handler's result.
    pub result: Result<HookResponse, HandlerError>,
    /// Execution time in microseconds.
    pub execution_time_us: u64,
}

/// Outcome summary of one dispatch call.
///
/// Outcomes appear in dispatch order, which is `(priority, seq)` order.
#[derive(Debug)]
pub struct DispatchReport {
    /// Event that was dispatched.
    pub event: String,
    /// Number of subscribers invoked.
    pub invoked: usize,
    /// Number of subscribers that succeeded.
    pub success_count: usize,
    /// Number of subscribers that failed.
    pub failure_count: usize,
    /// Per-subscriber outcomes in dispatch order.
    pub outcomes: Vec<SubscriberOutcome>,
    /// Total dispatch time in microseconds.
    pub total_time_us: u64,
}

impl DispatchReport {
    fn empty(event: String, total_time_us: u64) -> Self {
        Self {
            event,
            invoked: 0,
            success_count: 0,
            failure_count: 0,
            outcomes: Vec::new(),
            total_time_us,
        }
    }

    /// Check if every invoked subscriber succeeded.
    ///
    /// A dispatch with zero subscribers is a no-op success.
    pub fn all_successful(&self) -> bool {
        self.failure_count == 0
    }

    /// Iterate over per-subscriber failures.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &HandlerError)> {
        self.outcomes.iter().filter_map(|o| {
            o.result
                .as_ref()
                .err()
                .map(|e| (o.subscriber.as_str(), e))
        })
    }

    /// Iterate over successful responses in dispatch order.
    pub fn responses(&self) -> impl Iterator<Item = &HookResponse> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Collect the fragments successful subscribers contributed, in
    /// dispatch order. Failed subscribers contribute nothing.
    pub fn fragments(&self) -> Vec<Fragment> {
        self.responses()
            .filter_map(|r| r.fragment.clone())
            .collect()
    }
}

/// Dispatcher for firing named events at registered subscribers.
///
/// Subscribers of one event are invoked strictly sequentially, never
/// concurrently, so two subscribers of the same event never race on state
/// reachable through the payload. Separate dispatch calls may run
/// concurrently; the registry hands out snapshots, so no lock is held while
/// handlers execute.
///
/// A handler failure is caught, recorded, and dispatch continues: one
/// failing contributor never blocks its siblings. The dispatcher imposes no
/// timeout of its own; a caller needing bounded latency wraps handler
/// futures at the call site and treats a timeout as a handler failure.
pub struct EventDispatcher {
    registry: Arc<EventRegistry>,
}

impl EventDispatcher {
    /// Create a dispatcher over a registry.
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self { registry }
    }

    /// Get the registry.
    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    /// Dispatch an event payload to all subscribers of its event.
    ///
    /// Never fails: a dispatch with zero subscribers returns an empty
    /// report, and handler errors are collected rather than propagated.
    pub async fn dispatch(&self, payload: &EventPayload) -> DispatchReport {
        let start = Instant::now();
        let event = payload.event.as_str().to_string();

        let subscribers = self.registry.subscribers_for(&event);
        if subscribers.is_empty() {
            return DispatchReport::empty(event, start.elapsed().as_micros() as u64);
        }

        tracing::debug!(
            event = %event,
            subscriber_count = subscribers.len(),
            "dispatching event"
        );

        let mut outcomes = Vec::with_capacity(subscribers.len());
        let mut success_count = 0;
        let mut failure_count = 0;

        for entry in &subscribers {
            let handler_start = Instant::now();
            let result = entry.handler.handle(payload).await;
            let execution_time_us = handler_start.elapsed().as_micros() as u64;

            match &result {
                Ok(_) => success_count += 1,
                Err(error) => {
                    failure_count += 1;
                    tracing::warn!(
                        event = %event,
                        subscriber = %entry.subscriber_name(),
                        error = %error,
                        "subscriber failed, continuing dispatch"
                    );
                }
            }

            outcomes.push(SubscriberOutcome {
                subscriber: entry.subscriber_name().to_string(),
                seq: entry.seq,
                priority: entry.priority,
                result,
                execution_time_us,
            });
        }

        let total_time_us = start.elapsed().as_micros() as u64;

        tracing::debug!(
            event = %event,
            total_time_us,
            success_count,
            failure_count,
            "event dispatch completed"
        );

        DispatchReport {
            event,
            invoked: subscribers.len(),
            success_count,
            failure_count,
            outcomes,
            total_time_us,
        }
    }
}
