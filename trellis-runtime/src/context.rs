//! The shared execution context.
//!
//! One context is threaded explicitly through rendering and action
//! execution: the current scope chain, the nearest state container, the
//! collaborator services, and the id of the page/component being rendered.
//! Contexts are cheap to clone and derived copy-on-extend; nothing here is
//! a process-wide singleton.

use std::sync::Arc;

use serde_json::Value;
use trellis_api::ExprValue;

use crate::{
    ScopeContext, Services, StateContext, add_context_at_tail, bool_of, deep_evaluate,
    evaluate_expr_value, string_of,
};

/// Scope + services + state for one evaluation site.
#[derive(Clone)]
pub struct ExecutionContext {
    pub scope: Arc<dyn ScopeContext>,
    pub state: Option<Arc<StateContext>>,
    pub services: Arc<Services>,
    /// The page or component id currently being rendered/executed.
    pub current_entity_id: String,
}

impl ExecutionContext {
    pub fn new(
        scope: Arc<dyn ScopeContext>,
        services: Arc<Services>,
        current_entity_id: impl Into<String>,
    ) -> Self {
        Self { scope, state: None, services, current_entity_id: current_entity_id.into() }
    }

    /// Derive a context with a different scope.
    pub fn with_scope(&self, scope: Arc<dyn ScopeContext>) -> Self {
        Self { scope, ..self.clone() }
    }

    /// Derive a context whose scope is `scope` with the current scope
    /// spliced in as its terminal enclosing link: local variables shadow,
    /// outer variables stay resolvable.
    pub fn with_chained_scope(&self, scope: Arc<dyn ScopeContext>) -> Self {
        self.with_scope(add_context_at_tail(scope, Arc::clone(&self.scope)))
    }

    /// Derive a context with a different nearest state container.
    pub fn with_state(&self, state: Arc<StateContext>) -> Self {
        Self { state: Some(state), ..self.clone() }
    }

    /// Derive a context for a different entity (page/component) id.
    pub fn with_entity_id(&self, entity_id: impl Into<String>) -> Self {
        Self { current_entity_id: entity_id.into(), ..self.clone() }
    }

    /// Evaluate an expression-or-literal against the current scope.
    pub fn eval(&self, expr: &ExprValue) -> Value {
        evaluate_expr_value(expr, self.services.evaluator.as_ref(), self.scope.as_ref())
    }

    /// Evaluate a raw JSON value that may be an expression form.
    pub fn eval_raw(&self, value: &Value) -> Value {
        self.eval(&ExprValue::from(value.clone()))
    }

    /// Deep-evaluate nested expressions anywhere inside a JSON structure.
    pub fn deep_eval(&self, value: &Value) -> Value {
        deep_evaluate(value, self.services.evaluator.as_ref(), self.scope.as_ref())
    }

    /// Evaluate to a boolean; indeterminate values fall back to `default`.
    pub fn eval_bool(&self, expr: &ExprValue, default: bool) -> bool {
        bool_of(&self.eval(expr)).unwrap_or(default)
    }

    /// Evaluate to display text; null renders empty.
    pub fn eval_string(&self, expr: &ExprValue) -> String {
        string_of(&self.eval(expr))
    }

    /// Evaluate a color expression and resolve design tokens through the
    /// resource catalog: a value matching a token key maps to the token's
    /// color, anything else passes through as a direct color value.
    pub fn eval_color(&self, expr: &ExprValue) -> Option<String> {
        match self.eval(expr) {
            Value::String(key) => {
                Some(self.services.resources.get_color(&key).unwrap_or(key))
            }
            _ => None,
        }
    }
}
