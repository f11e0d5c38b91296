//! Typed variable declarations.
//!
//! Used for page/component argument definitions and initial-state
//! definitions. A declaration carries a type tag and an optional default,
//! which may itself be an expression evaluated at resolution time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ExprValue;

/// The declared type of a variable.
///
/// Plain data types resolve to JSON values; controller types resolve to
/// adapter objects owned by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Json,
    JsonArray,
    File,
    ScrollController,
    TextEditingController,
    TimerController,
    PageController,
    AsyncController,
    StreamController,
    ApiCancelToken,
    StoryController,
}

impl VariableType {
    /// Whether this type resolves to a controller adapter rather than a
    /// plain JSON value.
    pub fn is_controller(&self) -> bool {
        matches!(
            self,
            VariableType::ScrollController
                | VariableType::TextEditingController
                | VariableType::TimerController
                | VariableType::PageController
                | VariableType::AsyncController
                | VariableType::StreamController
                | VariableType::ApiCancelToken
                | VariableType::StoryController
        )
    }
}

/// A single variable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDef {
    /// Declared name. May be empty when the declaration sits in a map keyed
    /// by name; use [`named_defs`] to normalize.
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub var_type: VariableType,

    /// Optional default, evaluated against the creating scope.
    #[serde(default, alias = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ExprValue>,
}

/// Normalize a name-keyed declaration map: an entry's effective name is its
/// map key, falling back to the inline `name` field only when the key is
/// empty (not a shape real documents use, but cheap to accept).
pub fn named_defs(
    defs: &IndexMap<String, VariableDef>,
) -> impl Iterator<Item = (&str, &VariableDef)> {
    defs.iter().map(|(key, def)| {
        let name = if key.is_empty() { def.name.as_str() } else { key.as_str() };
        (name, def)
    })
}
