//! Integration tests for the full rendering pipeline: JSON definitions in,
//! view trees out, with state, components, repetition, and tap-triggered
//! action flows exercised together.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use serde_json::{Value, json};
use trellis_api::{ComponentDef, WidgetDef};
use trellis_runtime::actions::ActionExecutor;
use tracing_subscriber::EnvFilter;
use trellis_runtime::{DefaultScopeContext, ExecutionContext, Services};
use trellis_view::widgets::register_builtins;
use trellis_view::{
    ComponentRegistry, MountedPage, RenderMode, RenderPayload, ViewError, ViewNode, ViewNode as V,
    WidgetRegistry, render_widget,
};

/// Harness bundling a registry with builtins and a bare service set.
struct RenderTest {
    registry: Arc<WidgetRegistry>,
    services: Arc<Services>,
}

impl RenderTest {
    fn new() -> Self {
        Self::with_components(ComponentRegistry::new())
    }

    fn with_components(components: ComponentRegistry) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
        let mut registry = WidgetRegistry::new(Arc::new(components));
        register_builtins(&mut registry);
        Self { registry: Arc::new(registry), services: Arc::new(Services::bare()) }
    }

    fn payload(&self, vars: Value) -> RenderPayload {
        let vars = vars
            .as_object()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect::<Vec<(String, Value)>>();
        let scope = Arc::new(DefaultScopeContext::from_json(vars));
        RenderPayload::new(
            ExecutionContext::new(scope, Arc::clone(&self.services), "page"),
            RenderMode::Production,
        )
    }

    fn render(&self, widget_json: Value, vars: Value) -> Result<ViewNode, ViewError> {
        let def: WidgetDef = serde_json::from_value(widget_json).expect("valid widget JSON");
        let widget = self.registry.create_widget(&def)?;
        render_widget(widget.as_ref(), &self.payload(vars))
    }
}

fn texts(node: &ViewNode) -> Vec<String> {
    fn walk(node: &ViewNode, out: &mut Vec<String>) {
        match node {
            ViewNode::Text { text, .. } => out.push(text.clone()),
            ViewNode::Row { children, .. }
            | ViewNode::Column { children, .. }
            | ViewNode::Stack { children }
            | ViewNode::Pager { children, .. } => {
                children.iter().for_each(|child| walk(child, out));
            }
            ViewNode::Box { child, .. } | ViewNode::Tappable { child, .. } => walk(child, out),
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(node, &mut out);
    out
}

#[test]
fn repeated_child_rendering_binds_item_and_index() -> Result<()> {
    let test = RenderTest::new();
    let node = test.render(
        json!({
            "type": "t/column",
            "props": { "dataSource": { "expr": "items" } },
            "childGroups": {
                "children": [{
                    "type": "t/text",
                    "props": { "text": "${index}=${currentItem}" }
                }]
            }
        }),
        json!({ "items": ["a", "b", "c"] }),
    )?;

    assert_eq!(texts(&node), ["0=a", "1=b", "2=c"]);
    Ok(())
}

#[test]
fn visibility_gating_renders_an_empty_placeholder() -> Result<()> {
    let test = RenderTest::new();
    let node = test.render(
        json!({
            "type": "t/text",
            "props": { "text": "hidden" },
            "commonProps": { "visibility": { "expr": "show" } }
        }),
        json!({ "show": false }),
    )?;
    assert_eq!(node, V::Empty);

    let node = test.render(
        json!({
            "type": "t/text",
            "props": { "text": "shown" },
            "commonProps": { "visibility": { "expr": "show" } }
        }),
        json!({ "show": true }),
    )?;
    assert_eq!(texts(&node), ["shown"]);
    Ok(())
}

#[test]
fn unknown_widget_type_lists_known_keys() {
    let test = RenderTest::new();
    let error = test
        .render(json!({ "type": "t/bogus", "props": {} }), json!({}))
        .unwrap_err();

    match error {
        ViewError::UnknownWidgetType { widget_type, known } => {
            assert_eq!(widget_type, "t/bogus");
            assert!(known.contains(&"t/text".to_string()));
            assert!(known.contains(&"t/column".to_string()));
            let mut sorted = known.clone();
            sorted.sort();
            assert_eq!(known, sorted, "keys reported in sorted order");
        }
        other => panic!("expected UnknownWidgetType, got {other:?}"),
    }
}

#[test]
fn registering_an_existing_key_overrides_the_builder() -> Result<()> {
    let mut registry = WidgetRegistry::new(Arc::new(ComponentRegistry::new()));
    register_builtins(&mut registry);

    let overridden = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&overridden);
    registry.register_json("t/text", move |def, _children| {
        counter.fetch_add(1, Ordering::SeqCst);
        // Replacement renders a fixed marker regardless of props.
        let base = trellis_view::WidgetBase::new(def.ref_name.clone(), None);
        let widget: Arc<dyn trellis_view::VirtualWidget> =
            Arc::new(trellis_view::BuilderWidget::new(base, |_payload| {
                Ok(ViewNode::Text { text: "override".into(), style: Default::default() })
            }));
        Ok(widget)
    });

    let registry = Arc::new(registry);
    let def: WidgetDef =
        serde_json::from_value(json!({ "type": "t/text", "props": { "text": "original" } }))?;
    let widget = registry.create_widget(&def).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let services = Arc::new(Services::bare());
    let payload = RenderPayload::new(
        ExecutionContext::new(DefaultScopeContext::root(), services, "page"),
        RenderMode::Production,
    );
    let node = render_widget(widget.as_ref(), &payload).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(texts(&node), ["override"]);
    assert_eq!(overridden.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn component_arguments_evaluate_in_the_callers_scope() -> Result<()> {
    let card: ComponentDef = serde_json::from_value(json!({
        "id": "greeting_card",
        "argDefs": {
            "who": { "name": "who", "type": "string" }
        },
        "layout": {
            "root": { "type": "t/text", "props": { "text": "Hello ${who}" } }
        }
    }))?;
    let test = RenderTest::with_components(ComponentRegistry::new().with_component(card));

    let node = test.render(
        json!({
            "id": "greeting_card",
            "args": { "who": { "expr": "userName" } },
            "refName": "card"
        }),
        json!({ "userName": "Ada" }),
    )?;

    assert_eq!(texts(&node), ["Hello Ada"]);
    Ok(())
}

#[test]
fn missing_component_is_fatal() {
    let test = RenderTest::new();
    let error = test
        .render(json!({ "id": "nope", "args": {} }), json!({}))
        .unwrap_err();
    assert!(matches!(error, ViewError::ComponentNotFound { .. }));
}

#[test]
fn state_wrapper_supplies_initial_values_to_its_subtree() -> Result<()> {
    let test = RenderTest::new();
    let node = test.render(
        json!({
            "initStateDefs": {
                "label": { "name": "label", "type": "string", "default": "from-state" }
            },
            "childGroups": {
                "child": [{ "type": "t/text", "props": { "text": "${label}" } }]
            }
        }),
        json!({}),
    )?;
    assert_eq!(texts(&node), ["from-state"]);
    Ok(())
}

#[tokio::test]
async fn tap_binding_executes_a_flow_that_rerenders_the_page() -> Result<()> {
    let mut registry = WidgetRegistry::new(Arc::new(ComponentRegistry::new()));
    register_builtins(&mut registry);
    let registry = Arc::new(registry);

    let page = MountedPage::mount(
        serde_json::from_value(json!({
            "uid": "counter_page",
            "initStateDefs": {
                "count": { "name": "count", "type": "number", "default": 0 }
            },
            "layout": {
                "root": {
                    "type": "t/text",
                    "props": { "text": "count=${count}" },
                    "commonProps": {
                        "onClick": {
                            "inkwell": true,
                            "actions": [{
                                "type": "setState",
                                "data": { "updates": { "count": "${count + 1}" } }
                            }]
                        }
                    }
                }
            }
        }))?,
        &registry,
        Arc::new(Services::bare()),
        None,
        RenderMode::Production,
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (node, bindings) = page.render().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(texts(&node), ["count=0"]);

    let ViewNode::Tappable { binding, inkwell, .. } = node else {
        panic!("expected tappable root");
    };
    assert!(inkwell);

    // The host's tap handling: look up the binding, run its flow in the
    // captured context.
    let tap = bindings.get(binding).expect("binding registered during the pass");
    let executor = ActionExecutor::new();
    executor.execute_flow(&tap.flow, &tap.ctx, "onClick").await?;

    assert!(page.is_dirty(), "setState marked the page for re-render");
    // The bare path evaluator cannot do arithmetic; the expression gap
    // resolves to null, which coerces to empty — what matters here is the
    // pipeline: tap -> flow -> state write -> dirty -> fresh render.
    let (node, _) = page.render().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(texts(&node).len(), 1);
    Ok(())
}

#[test]
fn dev_mode_shows_diagnostics_production_propagates() {
    let components = ComponentRegistry::new();
    let mut registry = WidgetRegistry::new(Arc::new(components));
    register_builtins(&mut registry);
    // A widget that always fails to render.
    registry.register_json("t/broken", |def, _children| {
        let base = trellis_view::WidgetBase::new(def.ref_name.clone(), None);
        let widget: Arc<dyn trellis_view::VirtualWidget> =
            Arc::new(trellis_view::BuilderWidget::new(base, |_payload| {
                Err(ViewError::Render {
                    ref_name: "always".into(),
                    message: "broken on purpose".into(),
                })
            }));
        Ok(widget)
    });
    let registry = Arc::new(registry);
    let services = Arc::new(Services::bare());

    let def: WidgetDef = serde_json::from_value(
        json!({ "type": "t/broken", "props": {}, "refName": "oops" }),
    )
    .unwrap();
    let widget = registry.create_widget(&def).unwrap();

    let dev_payload = RenderPayload::new(
        ExecutionContext::new(DefaultScopeContext::root(), Arc::clone(&services), "page"),
        RenderMode::Development,
    );
    let node = render_widget(widget.as_ref(), &dev_payload).unwrap();
    match node {
        ViewNode::RenderError { ref_name, message } => {
            assert_eq!(ref_name, "oops");
            assert!(message.contains("broken on purpose"));
        }
        other => panic!("expected diagnostic, got {other:?}"),
    }

    let prod_payload = RenderPayload::new(
        ExecutionContext::new(DefaultScopeContext::root(), services, "page"),
        RenderMode::Production,
    );
    assert!(render_widget(widget.as_ref(), &prod_payload).is_err());
}
