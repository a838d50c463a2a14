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

//! Hookforge Plugin Kernel
//!
//! A plugin lifecycle and hook-aggregation engine: a named-event dispatcher
//! that drives plugin install/update/remove transitions and lets
//! independently developed extensions contribute response fragments at
//! declared hook points inside a host rendering pipeline.
//!
//! # Architecture
//!
//! - **Registry**: per named event, an ordered subscriber list kept sorted
//!   by `(priority, registration sequence)` - lower priority fires earlier,
//!   equal priorities fire in registration order.
//! - **Dispatcher**: invokes subscribers strictly sequentially with failure
//!   isolation; one broken contributor never blocks its siblings.
//! - **Lifecycle manager**: computes install/update/remove transitions
//!   against an external version store and drives the canonical
//!   `install_<id>` / `update_<id>` / `remove_<id>` events.
//! - **Hook aggregator**: collects renderable fragments from hook-point
//!   subscribers into one ordered composite.
//!
//! Rendering and persistence are external collaborators: fragments are
//! opaque to the engine, and plugin state is reached only through the
//! [`VersionStore`] key/value contract.
//!
//! # Example
//!
//! ```rust,ignore
//! use hookforge_core::{HookEngine, InMemoryVersionStore, LoggingHandler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = HookEngine::new(Arc::new(InMemoryVersionStore::new()));
//!     engine.register_handler("log", LoggingHandler::new("log")).unwrap();
//!
//!     // Drive a lifecycle transition.
//!     let result = engine.lifecycle()
//!         .request_install("vendor/example-plugin", "1.0")
//!         .await
//!         .unwrap();
//!     assert_eq!(result.identifier, "example_plugin");
//!
//!     // Render a hook point.
//!     let render = engine.aggregator()
//!         .render_hook_point("ui.dashboard.widgets", serde_json::json!({}))
//!         .await
//!         .unwrap();
//!     println!("{}", render.concat_text());
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod handlers;
pub mod lifecycle;
pub mod registry;
pub mod store;

// Re-exports
pub use aggregator::{HookAggregator, HookRender};
pub use config::{ConfigError, EngineConfig, SubscriptionSpec};
pub use dispatcher::{DispatchReport, EventDispatcher, SubscriberOutcome};
pub use engine::HookEngine;
pub use error::{PluginError, PluginResult};
pub use event::{
    plugin_identifier, EventName, EventPayload, InvalidEventName, InvalidPluginName,
    LifecycleEvents, INSTALL_EVENT_PREFIX, REMOVE_EVENT_PREFIX, UPDATE_EVENT_PREFIX,
};
pub use handlers::{
    CallbackHandler, EventHandler, EventSubscriber, Fragment, HandlerError, HookResponse,
    LoggingHandler, NoOpHandler, SharedHandler, StaticFragmentHandler, Subscription,
};
pub use lifecycle::{
    LifecycleManager, LifecycleTransition, PluginRecord, TransitionReport, UpdateOutcome,
};
pub use registry::{
    EventRegistry, Priority, RegistryError, SubscriberEntry, SubscriptionHandle,
};
pub use store::{InMemoryVersionStore, JsonVersionStore, StoreError, VersionStore};
