//! Runtime scope values.
//!
//! Scope resolution yields either a plain JSON value or a controller
//! adapter. Expressions only ever observe the JSON projection; controllers
//! project to null there and are consumed directly by widgets.

use serde_json::Value;

use crate::Controller;

/// A value resolvable from a scope chain or stored in a state container.
#[derive(Debug, Clone)]
pub enum ScopeValue {
    Json(Value),
    Controller(Controller),
}

impl ScopeValue {
    /// Null JSON value.
    pub fn null() -> Self {
        ScopeValue::Json(Value::Null)
    }

    /// The JSON projection: controllers are opaque to expressions.
    pub fn to_json(&self) -> Value {
        match self {
            ScopeValue::Json(value) => value.clone(),
            ScopeValue::Controller(_) => Value::Null,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ScopeValue::Json(value) => Some(value),
            ScopeValue::Controller(_) => None,
        }
    }

    pub fn as_controller(&self) -> Option<&Controller> {
        match self {
            ScopeValue::Json(_) => None,
            ScopeValue::Controller(controller) => Some(controller),
        }
    }
}

impl From<Value> for ScopeValue {
    fn from(value: Value) -> Self {
        ScopeValue::Json(value)
    }
}

impl From<Controller> for ScopeValue {
    fn from(controller: Controller) -> Self {
        ScopeValue::Controller(controller)
    }
}
