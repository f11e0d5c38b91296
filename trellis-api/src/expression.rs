//! Expression-valued fields in the DSL.
//!
//! A value position in a definition document can hold a plain JSON literal,
//! a new-format expression object `{ "expr": "<source>" }`, or a legacy
//! interpolation string containing `${...}` segments. Both expression forms
//! are supported indefinitely for backward compatibility.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Matches one `${...}` interpolation segment in a legacy template string.
static LEGACY_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]+\}").expect("legacy segment pattern is valid"));

/// A DSL field that may be a literal or an expression.
///
/// Detection order is fixed: the new `{ "expr": ... }` object shape is
/// checked first, then legacy `${...}` pattern scanning, then plain
/// literal. A JSON object that happens to carry a string-valued `expr` key
/// is therefore always treated as an expression; this mirrors the behavior
/// of existing documents and is deliberately not "fixed" here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ExprValue {
    /// New format: `{ "expr": "<expression-source>" }`.
    Expr(String),
    /// Legacy format: a string with one or more `${...}` segments.
    LegacyTemplate(String),
    /// A plain JSON literal, passed through untouched.
    Literal(Value),
}

impl ExprValue {
    /// Whether this value requires evaluation against a scope.
    pub fn is_expression(&self) -> bool {
        !matches!(self, ExprValue::Literal(_))
    }

    /// The literal value, if this is not an expression.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            ExprValue::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// The raw source handed to the expression evaluator.
    ///
    /// For the legacy form this is the whole template string; the evaluator
    /// owns segment substitution.
    pub fn source(&self) -> Option<&str> {
        match self {
            ExprValue::Expr(source) => Some(source),
            ExprValue::LegacyTemplate(template) => Some(template),
            ExprValue::Literal(_) => None,
        }
    }

    /// A literal boolean convenience constructor.
    pub fn literal_bool(value: bool) -> Self {
        ExprValue::Literal(Value::Bool(value))
    }

    /// A literal string convenience constructor.
    pub fn literal_str(value: impl Into<String>) -> Self {
        ExprValue::Literal(Value::String(value.into()))
    }

    /// Whether a raw string uses the legacy interpolation pattern.
    pub fn is_legacy_template(raw: &str) -> bool {
        LEGACY_SEGMENT.is_match(raw)
    }
}

/// One piece of a legacy template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart<'a> {
    /// Literal text between interpolation segments.
    Text(&'a str),
    /// The source inside one `${...}` segment.
    Expr(&'a str),
}

/// Split a legacy template into literal and expression parts, in order.
pub fn split_legacy_template(template: &str) -> Vec<TemplatePart<'_>> {
    let mut parts = Vec::new();
    let mut cursor = 0;
    for segment in LEGACY_SEGMENT.find_iter(template) {
        if segment.start() > cursor {
            parts.push(TemplatePart::Text(&template[cursor..segment.start()]));
        }
        let inner = &template[segment.start() + 2..segment.end() - 1];
        parts.push(TemplatePart::Expr(inner));
        cursor = segment.end();
    }
    if cursor < template.len() {
        parts.push(TemplatePart::Text(&template[cursor..]));
    }
    parts
}

impl From<Value> for ExprValue {
    fn from(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if let Some(Value::String(source)) = map.get("expr") {
                return ExprValue::Expr(source.clone());
            }
        }
        if let Value::String(raw) = &value {
            if ExprValue::is_legacy_template(raw) {
                return ExprValue::LegacyTemplate(raw.clone());
            }
        }
        ExprValue::Literal(value)
    }
}

impl From<ExprValue> for Value {
    fn from(expr: ExprValue) -> Self {
        match expr {
            ExprValue::Expr(source) => serde_json::json!({ "expr": source }),
            ExprValue::LegacyTemplate(template) => Value::String(template),
            ExprValue::Literal(value) => value,
        }
    }
}
