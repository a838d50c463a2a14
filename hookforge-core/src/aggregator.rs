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

//! Hook aggregator: collecting renderable fragments at hook points.

use crate::dispatcher::{DispatchReport, EventDispatcher};
use crate::event::{EventName, EventPayload, InvalidEventName};
use crate::handlers::Fragment;
use std::sync::Arc;

/// The composite result of rendering one hook point.
#[derive(Debug)]
pub struct HookRender {
    /// Hook point that was rendered.
    pub hook: String,
    /// Fragments contributed by successful subscribers, in dispatch order.
    pub fragments: Vec<Fragment>,
    /// Full dispatch report, including any subscriber failures.
    pub report: DispatchReport,
}

impl HookRender {
    /// Check if no subscriber contributed a fragment.
    ///
    /// The host renders an empty hook point as nothing.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Concatenate the fragments in sequence order.
    ///
    /// Default policy for text-oriented hosts: text fragments are appended
    /// verbatim, structured nodes as compact JSON, bytes lossily as UTF-8.
    /// Hosts with richer composition walk `fragments` themselves.
    pub fn concat_text(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(text) => out.push_str(text),
                Fragment::Node(node) => out.push_str(&node.to_string()),
                Fragment::Bytes(bytes) => out.push_str(&String::from_utf8_lossy(bytes)),
            }
        }
        out
    }
}

/// Collects response fragments from every subscriber of a hook point.
///
/// A specialization of event dispatch for UI composition: subscribers are
/// mutually independent, no fragment may observe another fragment's output,
/// and ordering is a presentation concern resolved purely by
/// priority/registration order. A broken contributor degrades gracefully:
/// its failure is recorded in the report and its slot in the output simply
/// does not exist.
pub struct HookAggregator {
    dispatcher: Arc<EventDispatcher>,
}

impl HookAggregator {
    /// Create an aggregator over a dispatcher.
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Render a hook point with a caller-supplied context.
    ///
    /// The context is passed unmodified, behind a shared reference, to every
    /// subscriber. Fails only on a malformed (empty) hook name; a hook point
    /// with zero subscribers yields an empty render.
    pub async fn render_hook_point(
        &self,
        hook: &str,
        context: serde_json::Value,
    ) -> Result<HookRender, InvalidEventName> {
        let hook = EventName::new(hook)?;
        let payload = EventPayload::new(hook.clone(), context);
        let report = self.dispatcher.dispatch(&payload).await;
        let fragments = report.fragments();

        tracing::debug!(
            hook = %hook,
            fragment_count = fragments.len(),
            failure_count = report.failure_count,
            "hook point rendered"
        );

        Ok(HookRender {
            hook: hook.as_str().to_string(),
            fragments,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{CallbackHandler, HandlerError, StaticFragmentHandler};
    use crate::registry::{EventRegistry, Priority};

    fn aggregator_with(registry: Arc<EventRegistry>) -> HookAggregator {
        HookAggregator::new(Arc::new(EventDispatcher::new(registry)))
    }

    #[tokio::test]
    async fn test_zero_subscribers_renders_empty() {
        let registry = Arc::new(EventRegistry::new());
        let aggregator = aggregator_with(registry);

        let render = aggregator
            .render_hook_point("ui.sidebar", serde_json::json!({}))
            .await
            .unwrap();
        assert!(render.is_empty());
        assert_eq!(render.concat_text(), "");
    }

    #[tokio::test]
    async fn test_empty_hook_name_is_invalid() {
        let registry = Arc::new(EventRegistry::new());
        let aggregator = aggregator_with(registry);

        assert!(aggregator
            .render_hook_point("", serde_json::json!({}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_fragments_ordered_by_priority_then_registration() {
        let registry = Arc::new(EventRegistry::new());
        // A at priority 1, B at priority 5, C at priority 1 registered after A.
        registry
            .register(
                "ui.widgets",
                Arc::new(StaticFragmentHandler::new("a", Fragment::Text("A".into()))),
                Priority(1),
            )
            .unwrap();
        registry
            .register(
                "ui.widgets",
                Arc::new(StaticFragmentHandler::new("b", Fragment::Text("B".into()))),
                Priority(5),
            )
            .unwrap();
        registry
            .register(
                "ui.widgets",
                Arc::new(StaticFragmentHandler::new("c", Fragment::Text("C".into()))),
                Priority(1),
            )
            .unwrap();

        let aggregator = aggregator_with(registry);
        let render = aggregator
            .render_hook_point("ui.widgets", serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(render.concat_text(), "ACB");
    }

    #[tokio::test]
    async fn test_broken_contributor_degrades_gracefully() {
        let registry = Arc::new(EventRegistry::new());
        registry
            .register(
                "ui.widgets",
                Arc::new(StaticFragmentHandler::new(
                    "first",
                    Fragment::Text("<ol>".into()),
                )),
                Priority(10),
            )
            .unwrap();
        registry
            .register(
                "ui.widgets",
                Arc::new(CallbackHandler::new("broken", |_| {
                    Err(HandlerError::ExecutionFailed("render failed".into()))
                })),
                Priority(20),
            )
            .unwrap();
        registry
            .register(
                "ui.widgets",
                Arc::new(StaticFragmentHandler::new(
                    "last",
                    Fragment::Text("</ol>".into()),
                )),
                Priority(30),
            )
            .unwrap();

        let aggregator = aggregator_with(registry);
        let render = aggregator
            .render_hook_point("ui.widgets", serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(render.fragments.len(), 2);
        assert_eq!(render.concat_text(), "<ol></ol>");
        assert_eq!(render.report.failure_count, 1);
        assert_eq!(render.report.invoked, 3);
    }

    #[tokio::test]
    async fn test_context_visible_to_subscribers() {
        let registry = Arc::new(EventRegistry::new());
        registry
            .register(
                "ui.greeting",
                Arc::new(CallbackHandler::new("greeter", |payload| {
                    let user = payload
                        .field("user")
                        .and_then(|v| v.as_str())
                        .unwrap_or("anonymous");
                    Ok(crate::handlers::HookResponse::fragment(Fragment::Text(
                        format!("hello {user}"),
                    )))
                })),
                Priority::default(),
            )
            .unwrap();

        let aggregator = aggregator_with(registry);
        let render = aggregator
            .render_hook_point("ui.greeting", serde_json::json!({"user": "ada"}))
            .await
            .unwrap();

        assert_eq!(render.concat_text(), "hello ada");
    }

    #[tokio::test]
    async fn test_mixed_fragment_kinds_concatenate() {
        let registry = Arc::new(EventRegistry::new());
        registry
            .register(
                "ui.mixed",
                Arc::new(StaticFragmentHandler::new(
                    "text",
                    Fragment::Text("x=".into()),
                )),
                Priority(1),
            )
            .unwrap();
        registry
            .register(
                "ui.mixed",
                Arc::new(StaticFragmentHandler::new(
                    "node",
                    Fragment::Node(serde_json::json!({"v": 1})),
                )),
                Priority(2),
            )
            .unwrap();

        let aggregator = aggregator_with(registry);
        let render = aggregator
            .render_hook_point("ui.mixed", serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(render.concat_text(), "x={\"v\":1}");
    }
}
