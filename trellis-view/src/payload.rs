//! The per-render-pass payload.
//!
//! One payload is threaded down the widget tree per pass, carrying the
//! execution context (scope, state, services), the ref-name hierarchy trace,
//! the render mode, and the pass's tap-binding table. Payloads are
//! conceptually immutable: every "mutation" is a copy-with-override, so a
//! widget can derive a payload for its children without affecting siblings.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use trellis_api::{ActionFlowDef, ExprValue};
use trellis_runtime::{ExecutionContext, ScopeContext};

/// Fail-soft vs fail-loud policy for render-time exceptions.
///
/// Development renders an inline diagnostic so broken UI stays visible
/// while iterating; production propagates so broken UI is never silently
/// blanked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    Development,
    #[default]
    Production,
}

/// A tap flow captured during a render pass, with the context it must run
/// against.
#[derive(Clone)]
pub struct TapBinding {
    pub flow: ActionFlowDef,
    pub ctx: ExecutionContext,
}

/// The tap targets collected during one render pass, indexed by the
/// `binding` field of `ViewNode::Tappable`.
#[derive(Default)]
pub struct TapBindings {
    entries: Mutex<Vec<TapBinding>>,
}

impl TapBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, binding: TapBinding) -> usize {
        let mut entries = self.entries.lock().expect("tap bindings poisoned");
        entries.push(binding);
        entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<TapBinding> {
        self.entries.lock().expect("tap bindings poisoned").get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("tap bindings poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The bundle threaded through one render pass.
#[derive(Clone)]
pub struct RenderPayload {
    pub ctx: ExecutionContext,
    /// Ref names from root to the current widget; pure trace.
    pub widget_hierarchy: Vec<String>,
    pub mode: RenderMode,
    pub bindings: Arc<TapBindings>,
}

impl RenderPayload {
    pub fn new(ctx: ExecutionContext, mode: RenderMode) -> Self {
        Self {
            ctx,
            widget_hierarchy: Vec::new(),
            mode,
            bindings: Arc::new(TapBindings::new()),
        }
    }

    /// Derive a payload with a replaced execution context.
    pub fn copy_with_ctx(&self, ctx: ExecutionContext) -> Self {
        Self { ctx, ..self.clone() }
    }

    /// Derive a payload whose scope is `scope` with the current scope
    /// spliced in as the enclosing tail — how item- and component-scoped
    /// variables become visible to descendants while outer variables stay
    /// resolvable.
    pub fn copy_with_chained_context(&self, scope: Arc<dyn ScopeContext>) -> Self {
        self.copy_with_ctx(self.ctx.with_chained_scope(scope))
    }

    /// Derive a payload with the trace extended by one ref name. The
    /// original payload is untouched.
    pub fn with_extended_hierarchy(&self, name: &str) -> Self {
        let mut derived = self.clone();
        derived.widget_hierarchy.push(name.to_string());
        derived
    }

    /// The trace as a `/`-joined path for diagnostics.
    pub fn hierarchy_path(&self) -> String {
        self.widget_hierarchy.join("/")
    }

    // Evaluation helpers: every expression routes through the *current*
    // chained scope, never a captured one.

    pub fn eval(&self, expr: &ExprValue) -> Value {
        self.ctx.eval(expr)
    }

    pub fn eval_raw(&self, value: &Value) -> Value {
        self.ctx.eval_raw(value)
    }

    pub fn eval_bool(&self, expr: &ExprValue, default: bool) -> bool {
        self.ctx.eval_bool(expr, default)
    }

    pub fn eval_string(&self, expr: &ExprValue) -> String {
        self.ctx.eval_string(expr)
    }

    pub fn eval_color(&self, expr: &ExprValue) -> Option<String> {
        self.ctx.eval_color(expr)
    }

    /// Evaluate to a finite number, if the expression yields one.
    pub fn eval_number(&self, expr: &ExprValue) -> Option<f64> {
        self.eval(expr).as_f64().filter(|value| value.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_runtime::{DefaultScopeContext, Services};

    fn payload() -> RenderPayload {
        let scope = Arc::new(DefaultScopeContext::from_json([(
            "title".to_string(),
            json!("Home"),
        )]));
        let ctx = ExecutionContext::new(scope, Arc::new(Services::bare()), "page");
        RenderPayload::new(ctx, RenderMode::Development)
    }

    #[test]
    fn hierarchy_extension_copies_instead_of_mutating() {
        let root = payload();
        let extended = root.with_extended_hierarchy("header").with_extended_hierarchy("title");

        assert!(root.widget_hierarchy.is_empty());
        assert_eq!(extended.hierarchy_path(), "header/title");
    }

    #[test]
    fn chained_context_shadows_without_losing_outer_scope() {
        let root = payload();
        let item_scope: Arc<dyn ScopeContext> = Arc::new(DefaultScopeContext::from_json([
            ("currentItem".to_string(), json!("x")),
        ]));
        let chained = root.copy_with_chained_context(item_scope);

        assert_eq!(chained.eval_raw(&json!({ "expr": "currentItem" })), json!("x"));
        assert_eq!(chained.eval_raw(&json!({ "expr": "title" })), json!("Home"));
        // Derivations share one binding table for the pass.
        assert!(Arc::ptr_eq(&root.bindings, &chained.bindings));
    }

    #[test]
    fn eval_number_rejects_non_numbers() {
        let payload = payload();
        assert_eq!(payload.eval_number(&ExprValue::Literal(json!(12.5))), Some(12.5));
        assert_eq!(payload.eval_number(&ExprValue::Literal(json!("x"))), None);
    }
}
