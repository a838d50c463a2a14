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

//! Handler traits, responses, fragments, and the subscriber surface.

use crate::event::{EventName, EventPayload};
use crate::registry::Priority;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// An opaque renderable unit contributed by one hook subscriber.
///
/// The engine never inspects fragment contents; it only orders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Fragment {
    /// Textual markup or plain text.
    Text(String),
    /// Raw bytes (e.g. pre-encoded output).
    Bytes(Vec<u8>),
    /// A structured node for hosts that compose trees.
    Node(serde_json::Value),
}

impl Fragment {
    /// Get the text content if this is a text fragment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fragment::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Result returned by a handler on success.
///
/// There is deliberately no chain-stop flag: dispatch has no
/// propagation-stopping primitive. A handler that needs to veto later
/// processing records that in the payload data for later handlers to inspect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookResponse {
    /// Optional data returned to the dispatch caller, opaque to the engine.
    pub data: Option<serde_json::Value>,
    /// Optional response fragment collected by the hook aggregator.
    pub fragment: Option<Fragment>,
    /// Optional message describing the result.
    pub message: Option<String>,
}

impl HookResponse {
    /// A response carrying nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A response carrying data for the dispatch caller.
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// A response contributing a renderable fragment.
    pub fn fragment(fragment: Fragment) -> Self {
        Self {
            fragment: Some(fragment),
            ..Self::default()
        }
    }

    /// Attach a descriptive message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Errors a handler can raise during dispatch.
///
/// Always caught by the dispatcher and recorded in the report, never
/// propagated as a failure of the dispatch call itself.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler execution failed: {0}")]
    ExecutionFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::Serialization(e.to_string())
    }
}

/// Trait implemented by every subscriber callback.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one event payload.
    async fn handle(&self, payload: &EventPayload) -> Result<HookResponse, HandlerError>;

    /// Get the handler name, used as subscriber identity in reports.
    fn name(&self) -> &str;
}

/// Type alias for a shared handler reference.
///
/// The registry owns handlers once registered; the registering plugin holds
/// no further reference.
pub type SharedHandler = Arc<dyn EventHandler>;

/// One entry of a subscriber's registration list.
pub struct Subscription {
    /// Event the handler is bound to.
    pub event: EventName,
    /// Execution order key (lower fires earlier).
    pub priority: Priority,
    /// The handler itself.
    pub handler: SharedHandler,
}

impl Subscription {
    /// Create a subscription entry.
    pub fn new(event: EventName, priority: Priority, handler: SharedHandler) -> Self {
        Self {
            event,
            priority,
            handler,
        }
    }
}

/// A component that exposes its event subscriptions as data.
///
/// This is the only contract a plugin author must fulfill to participate:
/// return the event-name/priority/handler tuples and let the registry do the
/// rest. Handlers receive only the payload and whatever collaborators they
/// were constructed with; there is no ambient container lookup.
pub trait EventSubscriber: Send + Sync {
    /// The subscriptions this component wants registered.
    fn subscriptions(&self) -> Vec<Subscription>;
}

/// A no-op handler for testing.
pub struct NoOpHandler {
    name: String,
}

impl NoOpHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl EventHandler for NoOpHandler {
    async fn handle(&self, _payload: &EventPayload) -> Result<HookResponse, HandlerError> {
        Ok(HookResponse::empty())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler that logs events (for debugging).
pub struct LoggingHandler {
    name: String,
}

impl LoggingHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, payload: &EventPayload) -> Result<HookResponse, HandlerError> {
        tracing::info!(
            handler = %self.name,
            event = %payload.event,
            "event received"
        );
        Ok(HookResponse::empty())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler that invokes a callback function.
pub struct CallbackHandler<F>
where
    F: Fn(&EventPayload) -> Result<HookResponse, HandlerError> + Send + Sync,
{
    name: String,
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(&EventPayload) -> Result<HookResponse, HandlerError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

#[async_trait]
impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(&EventPayload) -> Result<HookResponse, HandlerError> + Send + Sync + 'static,
{
    async fn handle(&self, payload: &EventPayload) -> Result<HookResponse, HandlerError> {
        (self.callback)(payload)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler that always contributes a fixed fragment.
pub struct StaticFragmentHandler {
    name: String,
    fragment: Fragment,
}

impl StaticFragmentHandler {
    pub fn new(name: impl Into<String>, fragment: Fragment) -> Self {
        Self {
            name: name.into(),
            fragment,
        }
    }
}

#[async_trait]
impl EventHandler for StaticFragmentHandler {
    async fn handle(&self, _payload: &EventPayload) -> Result<HookResponse, HandlerError> {
        Ok(HookResponse::fragment(self.fragment.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
