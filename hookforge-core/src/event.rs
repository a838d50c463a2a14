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

//! Event names, payloads, and canonical lifecycle event derivation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Prefix of the canonical install event for a plugin identifier.
pub const INSTALL_EVENT_PREFIX: &str = "install_";
/// Prefix of the canonical update event for a plugin identifier.
pub const UPDATE_EVENT_PREFIX: &str = "update_";
/// Prefix of the canonical remove event for a plugin identifier.
pub const REMOVE_EVENT_PREFIX: &str = "remove_";

/// An opaque, case-sensitive event identifier.
///
/// Two event names are equal iff they are byte-identical. Hook points use a
/// dotted-namespace convention (`ui.dashboard.widgets`); lifecycle events are
/// `install_<id>` / `update_<id>` / `remove_<id>`. Invariant: non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventName(String);

impl EventName {
    /// Create an event name, rejecting the empty string.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidEventName> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidEventName);
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EventName {
    type Error = InvalidEventName;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        name.0
    }
}

/// Error raised for an empty event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event name cannot be empty")]
pub struct InvalidEventName;

/// Error raised for a plugin distributing name that derives to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid plugin name: {0:?}")]
pub struct InvalidPluginName(pub String);

/// Derive the canonical plugin identifier from a distributing name.
///
/// The vendor prefix (everything up to the last `/`) is dropped, remaining
/// `/` and `-` characters become `_`, and the result is lowercased:
/// `vendor/example-plugin` derives to `example_plugin`.
pub fn plugin_identifier(distributing_name: &str) -> Result<String, InvalidPluginName> {
    let tail = match distributing_name.rfind('/') {
        Some(idx) => &distributing_name[idx + 1..],
        None => distributing_name,
    };
    let identifier: String = tail
        .chars()
        .map(|c| match c {
            '/' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    if identifier.is_empty() {
        return Err(InvalidPluginName(distributing_name.to_string()));
    }
    Ok(identifier)
}

/// The three canonical lifecycle events for one plugin identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvents {
    pub install: EventName,
    pub update: EventName,
    pub remove: EventName,
}

impl LifecycleEvents {
    /// Build the event triple for a derived identifier.
    ///
    /// The identifier must be non-empty (guaranteed by [`plugin_identifier`]).
    pub fn for_identifier(identifier: &str) -> Self {
        Self {
            install: EventName(format!("{INSTALL_EVENT_PREFIX}{identifier}")),
            update: EventName(format!("{UPDATE_EVENT_PREFIX}{identifier}")),
            remove: EventName(format!("{REMOVE_EVENT_PREFIX}{identifier}")),
        }
    }
}

/// Payload delivered to every subscriber of one dispatch call.
///
/// Subscribers receive a shared reference; the caller-supplied `data` is
/// never mutated between siblings, so no subscriber can perturb another's
/// view of the event.
#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    /// The event being dispatched.
    pub event: EventName,
    /// Caller-supplied data, opaque to the dispatcher.
    pub data: serde_json::Value,
    /// Additional metadata key-value pairs.
    pub metadata: HashMap<String, String>,
    /// Timestamp when the payload was created (microseconds since epoch).
    pub timestamp_us: u64,
}

impl EventPayload {
    /// Create a payload for an event with caller-supplied data.
    pub fn new(event: EventName, data: serde_json::Value) -> Self {
        Self {
            event,
            data,
            metadata: HashMap::new(),
            timestamp_us: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_micros() as u64,
        }
    }

    /// Add metadata to the payload.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up a top-level field of the data object.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_rejects_empty() {
        assert!(EventName::new("").is_err());
        assert!(EventName::new("install_example").is_ok());
    }

    #[test]
    fn test_event_name_equality_is_byte_identity() {
        let a = EventName::new("ui.dashboard").unwrap();
        let b = EventName::new("ui.dashboard").unwrap();
        let c = EventName::new("ui.Dashboard").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_plugin_identifier_drops_vendor_prefix() {
        assert_eq!(
            plugin_identifier("vendor/example-plugin").unwrap(),
            "example_plugin"
        );
    }

    #[test]
    fn test_plugin_identifier_without_vendor() {
        assert_eq!(plugin_identifier("My-Plugin").unwrap(), "my_plugin");
    }

    #[test]
    fn test_plugin_identifier_rejects_empty_tail() {
        assert!(plugin_identifier("").is_err());
        assert!(plugin_identifier("vendor/").is_err());
    }

    #[test]
    fn test_lifecycle_events_triple() {
        let events = LifecycleEvents::for_identifier("example_plugin");
        assert_eq!(events.install.as_str(), "install_example_plugin");
        assert_eq!(events.update.as_str(), "update_example_plugin");
        assert_eq!(events.remove.as_str(), "remove_example_plugin");
    }

    #[test]
    fn test_payload_field_lookup() {
        let event = EventName::new("install_example_plugin").unwrap();
        let payload = EventPayload::new(event, serde_json::json!({"version": "1.0"}))
            .with_metadata("source", "test");
        assert_eq!(
            payload.field("version"),
            Some(&serde_json::json!("1.0"))
        );
        assert_eq!(payload.metadata.get("source").map(String::as_str), Some("test"));
    }
}
