//! Expression evaluation seam.
//!
//! The expression language itself is a collaborator: given a scope and an
//! expression source string, it returns a value. This module owns the seam
//! around that black box — form dispatch (literal vs `{expr:}` vs legacy
//! `${...}` template), deep evaluation of nested argument structures, and
//! the boolean/string coercions the rendering layer needs. Evaluation gaps
//! are never errors; they resolve to null.

use std::sync::Arc;

use serde_json::Value;
use trellis_api::{ExprValue, TemplatePart, split_legacy_template};

use crate::{ScopeContext, resolve_json};

/// The expression-language collaborator.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate one expression source against a scope. Must not fail:
    /// unresolvable expressions yield null.
    fn evaluate(&self, source: &str, scope: &dyn ScopeContext) -> Value;
}

/// Evaluate an expression-or-literal field.
pub fn evaluate_expr_value(
    expr: &ExprValue,
    evaluator: &dyn ExpressionEvaluator,
    scope: &dyn ScopeContext,
) -> Value {
    match expr {
        ExprValue::Literal(value) => value.clone(),
        ExprValue::Expr(source) => evaluator.evaluate(source, scope),
        ExprValue::LegacyTemplate(template) => {
            render_legacy_template(template, evaluator, scope)
        }
    }
}

/// Render a legacy `${...}` template.
///
/// A template that is exactly one interpolation segment yields the
/// segment's raw value (no stringification); anything else concatenates.
pub fn render_legacy_template(
    template: &str,
    evaluator: &dyn ExpressionEvaluator,
    scope: &dyn ScopeContext,
) -> Value {
    let parts = split_legacy_template(template);
    if let [TemplatePart::Expr(source)] = parts.as_slice() {
        return evaluator.evaluate(source, scope);
    }

    let mut rendered = String::new();
    for part in parts {
        match part {
            TemplatePart::Text(text) => rendered.push_str(text),
            TemplatePart::Expr(source) => {
                match evaluator.evaluate(source, scope) {
                    Value::Null => {}
                    Value::String(text) => rendered.push_str(&text),
                    other => rendered.push_str(&other.to_string()),
                }
            }
        }
    }
    Value::String(rendered)
}

/// Evaluate every expression nested anywhere inside a JSON structure.
///
/// Objects and arrays are walked recursively; each node is first checked
/// for an expression form, so fully nested argument maps evaluate deeply
/// rather than only at the top level.
pub fn deep_evaluate(
    value: &Value,
    evaluator: &dyn ExpressionEvaluator,
    scope: &dyn ScopeContext,
) -> Value {
    match ExprValue::from(value.clone()) {
        ExprValue::Expr(source) => evaluator.evaluate(&source, scope),
        ExprValue::LegacyTemplate(template) => {
            render_legacy_template(&template, evaluator, scope)
        }
        ExprValue::Literal(Value::Object(map)) => Value::Object(
            map.iter()
                .map(|(key, nested)| (key.clone(), deep_evaluate(nested, evaluator, scope)))
                .collect(),
        ),
        ExprValue::Literal(Value::Array(items)) => Value::Array(
            items.iter().map(|nested| deep_evaluate(nested, evaluator, scope)).collect(),
        ),
        ExprValue::Literal(other) => other,
    }
}

/// Interpret a value as a boolean where one is expected.
///
/// Only `true`/`false` and their string spellings coerce; everything else
/// is indeterminate and left to the call site's default.
pub fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Interpret a value as display text: strings pass through, null is empty,
/// other values use their JSON rendering.
pub fn string_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// A minimal evaluator for hosts and tests that do not plug in a full
/// expression language: quoted strings and JSON scalars evaluate as
/// literals, anything else is a dotted path resolved against the scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathEvaluator;

impl PathEvaluator {
    pub fn shared() -> Arc<dyn ExpressionEvaluator> {
        Arc::new(PathEvaluator)
    }
}

impl ExpressionEvaluator for PathEvaluator {
    fn evaluate(&self, source: &str, scope: &dyn ScopeContext) -> Value {
        let source = source.trim();
        if source.is_empty() {
            return Value::Null;
        }

        if source.len() >= 2
            && (source.starts_with('\'') && source.ends_with('\'')
                || source.starts_with('"') && source.ends_with('"'))
        {
            return Value::String(source[1..source.len() - 1].to_string());
        }

        if let Ok(literal) = serde_json::from_str::<Value>(source) {
            if !matches!(literal, Value::String(_)) {
                return literal;
            }
        }

        let mut segments = source.split('.');
        let root = segments.next().unwrap_or(source);
        let mut current = resolve_json(scope, root);
        for segment in segments {
            current = match current {
                Value::Object(ref map) => map.get(segment).cloned().unwrap_or(Value::Null),
                Value::Array(ref items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultScopeContext, ScopeValue};
    use serde_json::json;

    fn scope() -> DefaultScopeContext {
        DefaultScopeContext::from_json([
            ("user".to_string(), json!({ "name": "Ada", "tags": ["x", "y"] })),
            ("count".to_string(), json!(2)),
        ])
    }

    #[test]
    fn path_evaluator_walks_objects_and_arrays() {
        let scope = scope();
        let evaluator = PathEvaluator;
        assert_eq!(evaluator.evaluate("user.name", &scope), json!("Ada"));
        assert_eq!(evaluator.evaluate("user.tags.1", &scope), json!("y"));
        assert_eq!(evaluator.evaluate("user.missing.deeper", &scope), Value::Null);
        assert_eq!(evaluator.evaluate("42", &scope), json!(42));
        assert_eq!(evaluator.evaluate("'literal'", &scope), json!("literal"));
    }

    #[test]
    fn single_segment_template_keeps_raw_value() {
        let scope = scope();
        let value = render_legacy_template("${count}", &PathEvaluator, &scope);
        assert_eq!(value, json!(2));
    }

    #[test]
    fn mixed_template_concatenates() {
        let scope = scope();
        let value = render_legacy_template("${user.name} has ${count}", &PathEvaluator, &scope);
        assert_eq!(value, json!("Ada has 2"));
    }

    #[test]
    fn missing_template_segment_renders_empty() {
        let scope = scope();
        let value = render_legacy_template("x=${missing}!", &PathEvaluator, &scope);
        assert_eq!(value, json!("x=!"));
    }

    #[test]
    fn deep_evaluate_reaches_nested_expressions() {
        let scope = scope();
        let args = json!({
            "top": { "expr": "count" },
            "nested": { "inner": "${user.name}", "fixed": 1 },
            "list": [{ "expr": "user.tags.0" }, "plain"]
        });
        let evaluated = deep_evaluate(&args, &PathEvaluator, &scope);
        assert_eq!(
            evaluated,
            json!({
                "top": 2,
                "nested": { "inner": "Ada", "fixed": 1 },
                "list": ["x", "plain"]
            })
        );
    }

    #[test]
    fn bool_coercion_is_conservative() {
        assert_eq!(bool_of(&json!(true)), Some(true));
        assert_eq!(bool_of(&json!("false")), Some(false));
        assert_eq!(bool_of(&json!(1)), None);
        assert_eq!(bool_of(&Value::Null), None);
    }

    #[test]
    fn controllers_project_to_null_in_expressions() {
        let controller = crate::Controller::CancelToken(crate::ApiCancelToken::new());
        let scope = DefaultScopeContext::new(
            [("token".to_string(), ScopeValue::Controller(controller))],
            None,
        );
        assert_eq!(PathEvaluator.evaluate("token", &scope), Value::Null);
    }
}
