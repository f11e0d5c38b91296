//! Virtual widgets.
//!
//! A virtual widget is an in-memory node that knows how to render itself
//! given a payload — distinct from the raw descriptor it was built from.
//! The tree is held by `Arc`; parent back-references are `Weak` and never
//! extend a parent's lifetime: upgrading after the owning subtree is gone
//! yields `None`, and callers must treat that as absent.

use std::sync::{Arc, Mutex, OnceLock, Weak};

use indexmap::IndexMap;
use trellis_api::{CommonProps, VariableDef};
use trellis_runtime::{StateContext, StateScopeContext, resolve_variables};

use crate::{RenderMode, RenderPayload, ViewError, ViewNode, apply_common_props};

/// Non-owning handle to a widget's parent.
#[derive(Default)]
pub struct ParentLink {
    parent: Mutex<Option<Weak<dyn VirtualWidget>>>,
}

impl ParentLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, parent: Weak<dyn VirtualWidget>) {
        *self.parent.lock().expect("parent link poisoned") = Some(parent);
    }

    /// Upgrade the link; absent when never attached or already torn down.
    pub fn get(&self) -> Option<Arc<dyn VirtualWidget>> {
        self.parent
            .lock()
            .expect("parent link poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

/// State shared by every widget variant: identity, common props, and the
/// weak parent link.
#[derive(Default)]
pub struct WidgetBase {
    pub ref_name: Option<String>,
    pub common_props: Option<CommonProps>,
    pub parent: ParentLink,
}

impl WidgetBase {
    pub fn new(ref_name: Option<String>, common_props: Option<CommonProps>) -> Self {
        Self { ref_name, common_props, parent: ParentLink::new() }
    }
}

/// A node of the virtual widget tree.
///
/// Implementations provide `base()` for the shared fields and `render()`
/// for variant-specific output; everything else has defaults. Widgets must
/// render deterministically for an equivalent payload, except where they
/// intentionally memoize per-instance state (state containers).
pub trait VirtualWidget: Send + Sync {
    fn base(&self) -> &WidgetBase;

    /// Variant-specific render. Called through [`render_widget`], which
    /// owns the shared pipeline (trace, visibility, decoration, error
    /// policy) — do not call this directly from widget code.
    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError>;

    fn ref_name(&self) -> Option<&str> {
        self.base().ref_name.as_deref()
    }

    fn common_props(&self) -> Option<&CommonProps> {
        self.base().common_props.as_ref()
    }

    fn parent(&self) -> Option<Arc<dyn VirtualWidget>> {
        self.base().parent.get()
    }

    fn set_parent(&self, parent: Weak<dyn VirtualWidget>) {
        self.base().parent.set(parent);
    }
}

/// Render one widget through the shared pipeline:
///
/// 1. Extend the hierarchy trace with the widget's ref name.
/// 2. Gate on `commonProps.visibility`: an expression evaluating to an
///    explicit `false` short-circuits to an empty placeholder — the
///    variant render (and any expression-driven child construction inside
///    it) never runs.
/// 3. Run the variant render, then apply shared decoration (style box,
///    tap wiring).
/// 4. On a render error: development mode emits an inline diagnostic node
///    carrying the ref name; production propagates.
pub fn render_widget(
    widget: &dyn VirtualWidget,
    payload: &RenderPayload,
) -> Result<ViewNode, ViewError> {
    let payload = match widget.ref_name() {
        Some(name) => payload.with_extended_hierarchy(name),
        None => payload.clone(),
    };

    if let Some(props) = widget.common_props() {
        if let Some(visibility) = &props.visibility {
            if trellis_runtime::bool_of(&payload.eval(visibility)) == Some(false) {
                return Ok(ViewNode::Empty);
            }
        }
    }

    let rendered = match widget.render(&payload) {
        Ok(node) => node,
        Err(error) => {
            let ref_name = widget.ref_name().unwrap_or("<unnamed>").to_string();
            match payload.mode {
                RenderMode::Development => {
                    tracing::error!(
                        widget = %ref_name,
                        hierarchy = %payload.hierarchy_path(),
                        %error,
                        "render failed, showing inline diagnostic"
                    );
                    return Ok(ViewNode::RenderError { ref_name, message: error.to_string() });
                }
                RenderMode::Production => return Err(error),
            }
        }
    };

    Ok(apply_common_props(rendered, widget.common_props(), &payload))
}

/// A widget holding a closure instead of static structure — bridges
/// externally constructed content (components) into the tree.
pub struct BuilderWidget {
    base: WidgetBase,
    build: Box<dyn Fn(&RenderPayload) -> Result<ViewNode, ViewError> + Send + Sync>,
}

impl BuilderWidget {
    pub fn new(
        base: WidgetBase,
        build: impl Fn(&RenderPayload) -> Result<ViewNode, ViewError> + Send + Sync + 'static,
    ) -> Self {
        Self { base, build: Box::new(build) }
    }
}

impl VirtualWidget for BuilderWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        (self.build)(payload)
    }
}

/// A state-container widget: owns initial-state declarations and exactly
/// one child. The container is created on first render and memoized for
/// the instance's lifetime, so re-renders of the same subtree observe the
/// same state.
pub struct StateWidget {
    base: WidgetBase,
    init_state_defs: IndexMap<String, VariableDef>,
    child: Arc<dyn VirtualWidget>,
    state: OnceLock<Arc<StateContext>>,
}

impl StateWidget {
    pub fn new(init_state_defs: IndexMap<String, VariableDef>, child: Arc<dyn VirtualWidget>) -> Self {
        Self {
            base: WidgetBase::default(),
            init_state_defs,
            child,
            state: OnceLock::new(),
        }
    }

    pub fn child(&self) -> &Arc<dyn VirtualWidget> {
        &self.child
    }

    /// The memoized container, if this instance has rendered at least once.
    pub fn state(&self) -> Option<&Arc<StateContext>> {
        self.state.get()
    }
}

impl VirtualWidget for StateWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn render(&self, payload: &RenderPayload) -> Result<ViewNode, ViewError> {
        let state = self.state.get_or_init(|| {
            let initial = resolve_variables(
                &self.init_state_defs,
                None,
                payload.ctx.services.evaluator.as_ref(),
                payload.ctx.scope.as_ref(),
            );
            let namespace = payload.ctx.current_entity_id.clone();
            match &payload.ctx.state {
                Some(parent) => StateContext::child_of(Arc::clone(parent), namespace, initial),
                None => StateContext::root(namespace, initial),
            }
        });

        let scope = Arc::new(StateScopeContext::new([], Arc::clone(state), None));
        let chained = payload.copy_with_chained_context(scope);
        let child_payload = chained.copy_with_ctx(chained.ctx.with_state(Arc::clone(state)));
        render_widget(self.child.as_ref(), &child_payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextStyle;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trellis_api::ExprValue;
    use trellis_runtime::{DefaultScopeContext, ExecutionContext, ScopeValue, Services};

    fn payload(mode: RenderMode) -> RenderPayload {
        let scope = Arc::new(DefaultScopeContext::from_json([
            ("show".to_string(), json!(false)),
        ]));
        let ctx = ExecutionContext::new(scope, Arc::new(Services::bare()), "page");
        RenderPayload::new(ctx, mode)
    }

    /// Counts variant renders; used to assert gating short-circuits.
    struct CountingWidget {
        base: WidgetBase,
        renders: Arc<AtomicUsize>,
        fail: bool,
    }

    impl VirtualWidget for CountingWidget {
        fn base(&self) -> &WidgetBase {
            &self.base
        }

        fn render(&self, _payload: &RenderPayload) -> Result<ViewNode, ViewError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ViewError::Render {
                    ref_name: "broken".to_string(),
                    message: "boom".to_string(),
                });
            }
            Ok(ViewNode::Text { text: "ok".into(), style: TextStyle::default() })
        }
    }

    #[test]
    fn visibility_false_skips_the_variant_render() {
        let renders = Arc::new(AtomicUsize::new(0));
        let widget = CountingWidget {
            base: WidgetBase::new(
                Some("gated".to_string()),
                Some(CommonProps {
                    visibility: Some(ExprValue::Expr("show".into())),
                    ..CommonProps::default()
                }),
            ),
            renders: Arc::clone(&renders),
            fail: false,
        };

        let node = render_widget(&widget, &payload(RenderMode::Production)).unwrap();
        assert_eq!(node, ViewNode::Empty);
        assert_eq!(renders.load(Ordering::SeqCst), 0, "render logic never invoked");
    }

    #[test]
    fn dev_mode_renders_an_inline_diagnostic() {
        let widget = CountingWidget {
            base: WidgetBase::new(Some("broken".to_string()), None),
            renders: Arc::new(AtomicUsize::new(0)),
            fail: true,
        };

        let node = render_widget(&widget, &payload(RenderMode::Development)).unwrap();
        match node {
            ViewNode::RenderError { ref_name, message } => {
                assert_eq!(ref_name, "broken");
                assert!(message.contains("boom"));
            }
            other => panic!("expected diagnostic node, got {other:?}"),
        }
    }

    #[test]
    fn production_mode_propagates_render_errors() {
        let widget = CountingWidget {
            base: WidgetBase::new(Some("broken".to_string()), None),
            renders: Arc::new(AtomicUsize::new(0)),
            fail: true,
        };

        let result = render_widget(&widget, &payload(RenderMode::Production));
        assert!(matches!(result, Err(ViewError::Render { .. })));
    }

    #[test]
    fn parent_link_does_not_keep_the_parent_alive() {
        let child: Arc<dyn VirtualWidget> = Arc::new(CountingWidget {
            base: WidgetBase::default(),
            renders: Arc::new(AtomicUsize::new(0)),
            fail: false,
        });

        {
            let parent: Arc<dyn VirtualWidget> = Arc::new(CountingWidget {
                base: WidgetBase::default(),
                renders: Arc::new(AtomicUsize::new(0)),
                fail: false,
            });
            child.set_parent(Arc::downgrade(&parent));
            assert!(child.parent().is_some());
        }

        // Parent subtree discarded: dereferencing yields absent.
        assert!(child.parent().is_none());
    }

    #[test]
    fn state_widget_memoizes_its_container_across_renders() {
        let text: Arc<dyn VirtualWidget> = Arc::new(CountingWidget {
            base: WidgetBase::default(),
            renders: Arc::new(AtomicUsize::new(0)),
            fail: false,
        });

        let mut defs = IndexMap::new();
        defs.insert(
            "count".to_string(),
            VariableDef {
                name: "count".to_string(),
                var_type: trellis_api::VariableType::Number,
                default_value: Some(ExprValue::Literal(json!(1))),
            },
        );
        let widget = StateWidget::new(defs, text);

        let payload = payload(RenderMode::Production);
        render_widget(&widget, &payload).unwrap();
        let first = Arc::clone(widget.state().expect("state created on first render"));
        assert_eq!(first.get_value("count").unwrap().to_json(), json!(1));

        // Mutate, re-render: same container instance, value preserved.
        first.set_value("count", ScopeValue::Json(json!(5)), false);
        render_widget(&widget, &payload).unwrap();
        let second = widget.state().unwrap();
        assert_eq!(second.state_id(), first.state_id());
        assert_eq!(second.get_value("count").unwrap().to_json(), json!(5));
    }
}
