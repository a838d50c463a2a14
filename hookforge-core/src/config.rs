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

//! Declarative subscription configuration.

use crate::registry::{EventRegistry, Priority, RegistryError, SubscriptionHandle};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for wiring named handlers to events without code.
///
/// # Example JSON Configuration
///
/// ```json
/// {
///     "subscriptions": [
///         {"event": "install_example_plugin", "handler": "log", "priority": 10},
///         {"event": "ui.dashboard.widgets", "handler": "dashboard_widget"}
///     ]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// List of subscription specs.
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionSpec>,
}

/// One declarative subscription: a named handler bound to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSpec {
    /// Event name to subscribe to.
    pub event: String,

    /// Name of a handler registered via
    /// [`EventRegistry::register_handler`].
    pub handler: String,

    /// Priority for execution order (lower values execute first).
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Whether this subscription is applied.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_priority() -> i32 {
    100
}

fn default_enabled() -> bool {
    true
}

impl SubscriptionSpec {
    /// Create a spec with default priority.
    pub fn new(event: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            handler: handler.into(),
            priority: default_priority(),
            enabled: default_enabled(),
        }
    }

    /// Set the priority for this spec.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Errors that can occur while parsing or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid subscription at index {index}: {reason}")]
    InvalidSpec { index: usize, reason: String },

    #[error("handler not found: {0}")]
    HandlerNotFound(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EngineConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, spec) in self.subscriptions.iter().enumerate() {
            if spec.event.is_empty() {
                return Err(ConfigError::InvalidSpec {
                    index,
                    reason: "event name cannot be empty".to_string(),
                });
            }
            if spec.handler.is_empty() {
                return Err(ConfigError::InvalidSpec {
                    index,
                    reason: "handler name cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Apply every enabled subscription to the registry.
    ///
    /// Handler names are resolved before anything is registered, so an
    /// unknown name fails the whole apply without registering a partial set.
    pub fn apply(&self, registry: &EventRegistry) -> Result<Vec<SubscriptionHandle>, ConfigError> {
        self.validate()?;

        let enabled: Vec<_> = self.subscriptions.iter().filter(|s| s.enabled).collect();
        let mut resolved = Vec::with_capacity(enabled.len());
        for spec in &enabled {
            let handler = registry
                .get_handler(&spec.handler)
                .ok_or_else(|| ConfigError::HandlerNotFound(spec.handler.clone()))?;
            resolved.push((*spec, handler));
        }

        let mut handles = Vec::with_capacity(resolved.len());
        for (spec, handler) in resolved {
            handles.push(registry.register(&spec.event, handler, Priority(spec.priority))?);
        }

        tracing::debug!(
            subscription_count = handles.len(),
            "applied declarative subscriptions"
        );
        Ok(handles)
    }
}
