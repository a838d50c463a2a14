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

//! Plugin lifecycle manager: install/update/remove transitions driven
//! through the event dispatcher.
//!
//! State machine per plugin identifier:
//! `Unknown -> Installed(v) -> Installed(v') -> Removed`, where the record
//! lives in the external version store. For every transition the dispatch
//! completes (all subscribers attempted) before the persisted record is
//! mutated, so a crash in the gap is observable as handlers-ran/record-stale.
//! Subscriber side effects are therefore at-least-once: a store
//! reconciliation that replays a transition re-delivers its event.

use crate::dispatcher::{DispatchReport, EventDispatcher};
use crate::error::{PluginError, PluginResult};
use crate::event::{plugin_identifier, EventPayload, LifecycleEvents};
use crate::store::VersionStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// A lifecycle state change for one plugin identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleTransition {
    Install,
    Update,
    Remove,
}

/// The persisted identity and version of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Derived identifier (see [`plugin_identifier`]).
    pub identifier: String,
    /// Installed version, absent when the plugin is unknown or removed.
    pub installed_version: Option<String>,
}

/// Result of a completed lifecycle transition.
#[derive(Debug)]
pub struct TransitionReport {
    /// Derived plugin identifier.
    pub identifier: String,
    /// The transition that was performed.
    pub transition: LifecycleTransition,
    /// Version persisted after the transition (absent for remove).
    pub version: Option<String>,
    /// Report of the lifecycle event dispatch.
    pub report: DispatchReport,
}

/// Outcome of an update request.
///
/// An update to the already-installed version is a distinguishable no-op,
/// not an error: no event is dispatched and nothing is written.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The update transition ran.
    Updated(TransitionReport),
    /// The requested version was already installed.
    Unchanged {
        identifier: String,
        version: String,
    },
}

/// Drives plugin lifecycle transitions through the dispatcher and records
/// the resulting state in the version store.
pub struct LifecycleManager {
    dispatcher: Arc<EventDispatcher>,
    store: Arc<dyn VersionStore>,
}

impl LifecycleManager {
    /// Create a manager over a dispatcher and a version store.
    pub fn new(dispatcher: Arc<EventDispatcher>, store: Arc<dyn VersionStore>) -> Self {
        Self { dispatcher, store }
    }

    /// Get the current record for a distributing name.
    pub fn record(&self, name: &str) -> PluginResult<PluginRecord> {
        let identifier = plugin_identifier(name)?;
        let installed_version = self.store.get(&identifier)?;
        Ok(PluginRecord {
            identifier,
            installed_version,
        })
    }

    /// Install a plugin.
    ///
    /// Valid only when the identifier is unknown to the store. Dispatches
    /// `install_<id>` with the plugin metadata, then persists the version.
    /// Individual handler failures do not prevent the transition; they are
    /// visible in the returned dispatch report.
    pub async fn request_install(
        &self,
        name: &str,
        version: &str,
    ) -> PluginResult<TransitionReport> {
        let identifier = plugin_identifier(name)?;
        if self.store.get(&identifier)?.is_some() {
            return Err(PluginError::AlreadyInstalled(identifier));
        }

        let events = LifecycleEvents::for_identifier(&identifier);
        let payload = EventPayload::new(
            events.install,
            json!({
                "plugin": name,
                "identifier": identifier,
                "version": version,
            }),
        )
        .with_metadata("requested_at", Utc::now().to_rfc3339());

        let report = self.dispatcher.dispatch(&payload).await;

        // All subscribers have been attempted before the record is written.
        self.store.put(&identifier, version)?;
        tracing::info!(plugin = %identifier, version = %version, "installed plugin");

        Ok(TransitionReport {
            identifier,
            transition: LifecycleTransition::Install,
            version: Some(version.to_string()),
            report,
        })
    }

    /// Update an installed plugin to a new version.
    ///
    /// Signals `NotInstalled` for an unknown identifier. An unchanged
    /// version returns [`UpdateOutcome::Unchanged`] without dispatching or
    /// writing. Otherwise dispatches `update_<id>` with both versions in
    /// the payload, then persists the new version.
    pub async fn request_update(&self, name: &str, version: &str) -> PluginResult<UpdateOutcome> {
        let identifier = plugin_identifier(name)?;
        let old_version = self
            .store
            .get(&identifier)?
            .ok_or_else(|| PluginError::NotInstalled(identifier.clone()))?;

        if old_version == version {
            tracing::debug!(plugin = %identifier, version = %version, "update is a no-op");
            return Ok(UpdateOutcome::Unchanged {
                identifier,
                version: old_version,
            });
        }

        let events = LifecycleEvents::for_identifier(&identifier);
        let payload = EventPayload::new(
            events.update,
            json!({
                "plugin": name,
                "identifier": identifier,
                "old_version": old_version,
                "version": version,
            }),
        )
        .with_metadata("requested_at", Utc::now().to_rfc3339());

        let report = self.dispatcher.dispatch(&payload).await;

        self.store.put(&identifier, version)?;
        tracing::info!(
            plugin = %identifier,
            old_version = %old_version,
            version = %version,
            "updated plugin"
        );

        Ok(UpdateOutcome::Updated(TransitionReport {
            identifier,
            transition: LifecycleTransition::Update,
            version: Some(version.to_string()),
            report,
        }))
    }

    /// Remove an installed plugin.
    ///
    /// Valid from any installed version; signals `NotInstalled` otherwise.
    /// Dispatches `remove_<id>`, then deletes the persisted record.
    pub async fn request_remove(&self, name: &str) -> PluginResult<TransitionReport> {
        let identifier = plugin_identifier(name)?;
        let installed_version = self
            .store
            .get(&identifier)?
            .ok_or_else(|| PluginError::NotInstalled(identifier.clone()))?;

        let events = LifecycleEvents::for_identifier(&identifier);
        let payload = EventPayload::new(
            events.remove,
            json!({
                "plugin": name,
                "identifier": identifier,
                "version": installed_version,
            }),
        )
        .with_metadata("requested_at", Utc::now().to_rfc3339());

        let report = self.dispatcher.dispatch(&payload).await;

        self.store.delete(&identifier)?;
        tracing::info!(plugin = %identifier, "removed plugin");

        Ok(TransitionReport {
            identifier,
            transition: LifecycleTransition::Remove,
            version: None,
            report,
        })
    }
}
