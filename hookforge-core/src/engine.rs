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

//! Engine facade - main entry point wiring registry, dispatcher,
//! lifecycle manager, and hook aggregator.

use crate::aggregator::HookAggregator;
use crate::config::{ConfigError, EngineConfig};
use crate::dispatcher::EventDispatcher;
use crate::handlers::{EventHandler, EventSubscriber};
use crate::lifecycle::LifecycleManager;
use crate::registry::{EventRegistry, RegistryError, SubscriptionHandle};
use crate::store::VersionStore;
use std::sync::Arc;

/// The assembled engine.
///
/// Construction wires one registry into one dispatcher, shared by the
/// lifecycle manager and the hook aggregator. Hosts typically build this
/// once at startup, register plugin subscriptions, and then serve lifecycle
/// requests and hook-point renders for the lifetime of the process.
pub struct HookEngine {
    registry: Arc<EventRegistry>,
    dispatcher: Arc<EventDispatcher>,
    lifecycle: LifecycleManager,
    aggregator: HookAggregator,
}

impl HookEngine {
    /// Create an engine over a version store.
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        let registry = Arc::new(EventRegistry::new());
        let dispatcher = Arc::new(EventDispatcher::new(registry.clone()));
        let lifecycle = LifecycleManager::new(dispatcher.clone(), store);
        let aggregator = HookAggregator::new(dispatcher.clone());

        Self {
            registry,
            dispatcher,
            lifecycle,
            aggregator,
        }
    }

    /// Get the registry.
    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    /// Get the dispatcher.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Get the lifecycle manager.
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Get the hook aggregator.
    pub fn aggregator(&self) -> &HookAggregator {
        &self.aggregator
    }

    /// Register a named handler for declarative subscriptions.
    pub fn register_handler(
        &self,
        name: impl Into<String>,
        handler: impl EventHandler + 'static,
    ) -> Result<(), RegistryError> {
        self.registry.register_handler(name, handler)
    }

    /// Register every subscription a component exposes.
    pub fn register_subscriber(
        &self,
        subscriber: &dyn EventSubscriber,
    ) -> Result<Vec<SubscriptionHandle>, RegistryError> {
        self.registry.register_subscriber(subscriber)
    }

    /// Apply a declarative subscription configuration.
    pub fn apply_config(
        &self,
        config: &EngineConfig,
    ) -> Result<Vec<SubscriptionHandle>, ConfigError> {
        config.apply(&self.registry)
    }
}
