//! Async builder widget.
//!
//! Renders a child against the current snapshot of an async controller's
//! memoized fetch: a waiting snapshot while the fetch is in flight, then
//! data or error once it resolves. Completion notifies the controller's
//! listeners so the host schedules a re-render; a generation guard discards
//! completions from a superseded fetch so a slow stale request never
//! overwrites a newer result.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::json;
use trellis_runtime::{Controller, DefaultScopeContext, ScopeContext};

use crate::{
    BuiltChildren, RenderPayload, ViewError, ViewNode, VirtualWidget, WidgetBase, WidgetRegistry,
    render_widget,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncBuilderProps {
    /// Scope variable naming the async controller driving this widget.
    pub controller: String,
}

/// Single-child widget bound to an [`trellis_runtime::AsyncController`].
///
/// The child renders with `snapshot` in scope:
/// `{ connectionState: "waiting" | "done", data, error }`.
pub struct AsyncBuilderWidget {
    base: WidgetBase,
    props: AsyncBuilderProps,
    child: Option<Arc<dyn VirtualWidget>>,
    /// Generation of the fetch a completion notifier was last spawned for.
    watched_generation: Mutex<Option<u64>>,
}

impl AsyncBuilderWidget {
    pub fn new(
        base: WidgetBase,
        props: AsyncBuilderProps,
        child: Option<Arc<dyn VirtualWidget>>,
    ) -> Self {
        Self { base, props, child, watched_generation: Mutex::new(None) }
    }

    /// Spawn one completion notifier per generation. The notifier awaits
    /// the shared fetch and, only if that generation is still current,
    /// notifies the controller's listeners (isolated per listener).
    fn watch_completion(
        &self,
        controller: &Arc<trellis_runtime::AsyncController>,
        handle: &trellis_runtime::FetchHandle,
    ) {
        let mut watched = self.watched_generation.lock().expect("watched generation poisoned");
        if *watched == Some(handle.generation) {
            return;
        }
        // Outside a runtime (plain sync render) the snapshot just stays
        // waiting until the host re-renders on its own schedule.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        *watched = Some(handle.generation);

        let controller = Arc::clone(controller);
        let future = handle.future.clone();
        let generation = handle.generation;
        runtime.spawn(async move {
            let _ = future.await;
            if controller.is_current(generation) {
                controller.listeners.notify_isolated();
            } else {
                tracing::debug!(generation, "discarding stale async completion");
            }
        });
    }
}

impl VirtualWidget for AsyncBuilderWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let controller = match payload
            .ctx
            .scope
            .resolve(&self.props.controller)
            .and_then(|value| value.as_controller().cloned())
        {
            Some(Controller::Async(controller)) => controller,
            _ => {
                return Err(ViewError::MissingController {
                    name: self.props.controller.clone(),
                });
            }
        };

        let handle = controller.get_future();
        let snapshot = match handle.future.peek() {
            None => {
                self.watch_completion(&controller, &handle);
                json!({ "connectionState": "waiting", "data": null, "error": null })
            }
            Some(Ok(data)) => {
                json!({ "connectionState": "done", "data": data, "error": null })
            }
            Some(Err(message)) => {
                json!({ "connectionState": "done", "data": null, "error": message })
            }
        };

        let Some(child) = &self.child else {
            return Ok(ViewNode::Empty);
        };
        let snapshot_scope: Arc<dyn ScopeContext> = Arc::new(DefaultScopeContext::from_json([(
            "snapshot".to_string(),
            snapshot,
        )]));
        render_widget(child.as_ref(), &payload.copy_with_chained_context(snapshot_scope))
    }
}

fn single_child(mut children: BuiltChildren) -> Option<Arc<dyn VirtualWidget>> {
    children
        .shift_remove("child")
        .or_else(|| children.shift_remove("children"))
        .and_then(|mut group| if group.is_empty() { None } else { Some(group.remove(0)) })
}

pub(super) fn register(registry: &mut WidgetRegistry) {
    registry.register("t/asyncBuilder", |props: AsyncBuilderProps, def, children| {
        let widget: Arc<dyn VirtualWidget> = Arc::new(AsyncBuilderWidget::new(
            WidgetBase::new(def.ref_name.clone(), def.common_props.clone()),
            props,
            single_child(children),
        ));
        Ok(widget)
    });
}
