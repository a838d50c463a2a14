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

//! Integration tests for the assembled engine: lifecycle transitions,
//! hook-point aggregation, and the file-backed version store together.

use hookforge_core::{
    CallbackHandler, EventName, EventSubscriber, Fragment, HandlerError, HookEngine,
    HookResponse, JsonVersionStore, PluginError, Priority, StaticFragmentHandler, Subscription,
    UpdateOutcome,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn engine_with_json_store(dir: &tempfile::TempDir) -> HookEngine {
    let store = JsonVersionStore::open(dir.path().join("versions.json")).unwrap();
    HookEngine::new(Arc::new(store))
}

/// The documented end-to-end contract: installing `vendor/example-plugin`
/// derives identifier `example_plugin`, invokes the install subscriber once
/// with the version in the payload, and ends with the version persisted.
#[tokio::test]
async fn test_install_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_with_json_store(&dir);

    let invocations = Arc::new(Mutex::new(Vec::new()));
    let seen = invocations.clone();
    engine
        .registry()
        .register(
            "install_example_plugin",
            Arc::new(CallbackHandler::new("h1", move |payload| {
                seen.lock().push((
                    payload.event.as_str().to_string(),
                    payload.field("version").cloned(),
                ));
                Ok(HookResponse::empty())
            })),
            Priority::default(),
        )
        .unwrap();

    let result = engine
        .lifecycle()
        .request_install("vendor/example-plugin", "1.0")
        .await
        .unwrap();

    assert_eq!(result.identifier, "example_plugin");
    assert_eq!(result.version.as_deref(), Some("1.0"));

    let invocations = invocations.lock();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].0, "install_example_plugin");
    assert_eq!(invocations[0].1, Some(serde_json::json!("1.0")));

    let record = engine.lifecycle().record("vendor/example-plugin").unwrap();
    assert_eq!(record.installed_version.as_deref(), Some("1.0"));
}

#[tokio::test]
async fn test_full_lifecycle_against_reopened_store() {
    let dir = tempfile::TempDir::new().unwrap();

    {
        let engine = engine_with_json_store(&dir);
        engine
            .lifecycle()
            .request_install("vendor/example-plugin", "1.0")
            .await
            .unwrap();
    }

    // A fresh engine over the same file sees the installed state.
    {
        let engine = engine_with_json_store(&dir);
        let outcome = engine
            .lifecycle()
            .request_update("vendor/example-plugin", "2.0")
            .await
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated(_)));

        // Unchanged update is a distinguishable no-op.
        let outcome = engine
            .lifecycle()
            .request_update("vendor/example-plugin", "2.0")
            .await
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Unchanged { version, .. } if version == "2.0"));
    }

    {
        let engine = engine_with_json_store(&dir);
        engine
            .lifecycle()
            .request_remove("vendor/example-plugin")
            .await
            .unwrap();
        let result = engine.lifecycle().request_remove("vendor/example-plugin").await;
        assert!(matches!(result, Err(PluginError::NotInstalled(_))));
    }
}

/// A plugin registering through the subscriber surface contributes to both
/// lifecycle events and hook points.
#[tokio::test]
async fn test_subscriber_surface_drives_hooks() {
    struct DashboardPlugin;

    impl EventSubscriber for DashboardPlugin {
        fn subscriptions(&self) -> Vec<Subscription> {
            vec![
                Subscription::new(
                    EventName::new("ui.dashboard.widgets").unwrap(),
                    Priority(10),
                    Arc::new(StaticFragmentHandler::new(
                        "status_widget",
                        Fragment::Text("<section>status</section>".into()),
                    )),
                ),
                Subscription::new(
                    EventName::new("ui.dashboard.widgets").unwrap(),
                    Priority(20),
                    Arc::new(StaticFragmentHandler::new(
                        "news_widget",
                        Fragment::Text("<section>news</section>".into()),
                    )),
                ),
            ]
        }
    }

    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_with_json_store(&dir);
    let handles = engine.register_subscriber(&DashboardPlugin).unwrap();
    assert_eq!(handles.len(), 2);

    let render = engine
        .aggregator()
        .render_hook_point("ui.dashboard.widgets", serde_json::json!({"page": "home"}))
        .await
        .unwrap();
    assert_eq!(
        render.concat_text(),
        "<section>status</section><section>news</section>"
    );

    // Unregistering one subscription removes exactly that contributor.
    engine.registry().unregister(&handles[0]).unwrap();
    let render = engine
        .aggregator()
        .render_hook_point("ui.dashboard.widgets", serde_json::json!({"page": "home"}))
        .await
        .unwrap();
    assert_eq!(render.concat_text(), "<section>news</section>");
}

/// A broken plugin degrades gracefully everywhere: its lifecycle handler
/// failure does not block the transition, and its hook failure does not
/// break the composite render.
#[tokio::test]
async fn test_broken_plugin_is_contained() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = engine_with_json_store(&dir);

    engine
        .registry()
        .register(
            "install_example_plugin",
            Arc::new(CallbackHandler::new("broken_install", |_| {
                Err(HandlerError::ExecutionFailed("db unreachable".into()))
            })),
            Priority(10),
        )
        .unwrap();

    let healthy_ran = Arc::new(Mutex::new(false));
    let flag = healthy_ran.clone();
    engine
        .registry()
        .register(
            "install_example_plugin",
            Arc::new(CallbackHandler::new("healthy_install", move |_| {
                *flag.lock() = true;
                Ok(HookResponse::empty())
            })),
            Priority(20),
        )
        .unwrap();

    let result = engine
        .lifecycle()
        .request_install("vendor/example-plugin", "1.0")
        .await
        .unwrap();

    assert_eq!(result.report.invoked, 2);
    assert_eq!(result.report.failure_count, 1);
    assert!(*healthy_ran.lock());
    assert_eq!(
        engine
            .lifecycle()
            .record("vendor/example-plugin")
            .unwrap()
            .installed_version
            .as_deref(),
        Some("1.0")
    );
}
