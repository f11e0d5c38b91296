//! Typed variable resolution.
//!
//! Converts variable declarations plus optional default expressions into
//! concrete runtime values: plain data types become coerced JSON values,
//! controller types become adapter handles. Failed coercions are evaluation
//! gaps, not errors — they resolve to null.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use trellis_api::{VariableDef, VariableType, named_defs};

use crate::{
    ApiCancelToken, AsyncController, Controller, ExpressionEvaluator, PageController,
    ScopeContext, ScopeValue, ScrollController, StoryController, StreamController,
    TextEditingController, TimerController, evaluate_expr_value,
};

/// Resolve one declaration. A supplied value (page args, component args)
/// wins over the declared default; both pass through type coercion.
pub fn resolve_variable(
    def: &VariableDef,
    supplied: Option<&Value>,
    evaluator: &dyn ExpressionEvaluator,
    scope: &dyn ScopeContext,
) -> ScopeValue {
    if def.var_type.is_controller() {
        return ScopeValue::Controller(instantiate_controller(def.var_type));
    }

    let raw = match supplied {
        Some(value) => value.clone(),
        None => def
            .default_value
            .as_ref()
            .map(|default| evaluate_expr_value(default, evaluator, scope))
            .unwrap_or(Value::Null),
    };
    ScopeValue::Json(coerce(raw, def.var_type))
}

/// Resolve a name-keyed declaration map, preserving declaration order.
pub fn resolve_variables(
    defs: &IndexMap<String, VariableDef>,
    supplied: Option<&Map<String, Value>>,
    evaluator: &dyn ExpressionEvaluator,
    scope: &dyn ScopeContext,
) -> Vec<(String, ScopeValue)> {
    named_defs(defs)
        .map(|(name, def)| {
            let supplied_value = supplied.and_then(|values| values.get(name));
            (name.to_string(), resolve_variable(def, supplied_value, evaluator, scope))
        })
        .collect()
}

fn instantiate_controller(var_type: VariableType) -> Controller {
    match var_type {
        VariableType::ScrollController => Controller::Scroll(Arc::new(ScrollController::new())),
        VariableType::TextEditingController => {
            Controller::TextEditing(Arc::new(TextEditingController::new()))
        }
        VariableType::TimerController => Controller::Timer(Arc::new(TimerController::new())),
        VariableType::PageController => Controller::Page(Arc::new(PageController::new())),
        VariableType::AsyncController => Controller::Async(Arc::new(AsyncController::unbound())),
        VariableType::StreamController => Controller::Stream(Arc::new(StreamController::new())),
        VariableType::ApiCancelToken => Controller::CancelToken(ApiCancelToken::new()),
        VariableType::StoryController => Controller::Story(Arc::new(StoryController::new())),
        _ => unreachable!("is_controller gates the data types"),
    }
}

fn coerce(value: Value, var_type: VariableType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match var_type {
        VariableType::String | VariableType::File => match value {
            Value::String(_) => value,
            Value::Number(number) => Value::String(number.to_string()),
            Value::Bool(flag) => Value::String(flag.to_string()),
            _ => Value::Null,
        },
        VariableType::Number => match value {
            Value::Number(_) => value,
            Value::String(text) => {
                serde_json::from_str::<Value>(text.trim())
                    .ok()
                    .filter(Value::is_number)
                    .unwrap_or(Value::Null)
            }
            _ => Value::Null,
        },
        VariableType::Boolean => match value {
            Value::Bool(_) => value,
            Value::String(text) => match text.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Null,
            },
            _ => Value::Null,
        },
        VariableType::Json => value,
        VariableType::JsonArray => match value {
            Value::Array(_) => value,
            _ => Value::Null,
        },
        _ => unreachable!("controller types resolved earlier"),
    }
}
