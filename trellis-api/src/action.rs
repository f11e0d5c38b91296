//! Action and action-flow definitions.
//!
//! An action flow is an ordered list of actions executed strictly
//! sequentially by the runtime's action engine. The per-invocation action id
//! is assigned at execution time and never appears in the wire form.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ExprValue;

fn default_true() -> bool {
    true
}

/// An ordered list of actions plus flow-level options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFlowDef {
    pub actions: Vec<ActionDef>,

    /// Whether the tap surface triggering this flow shows ink feedback.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inkwell: bool,
}

impl ActionFlowDef {
    pub fn new(actions: Vec<ActionDef>) -> Self {
        Self { actions, inkwell: false }
    }
}

/// One action: a typed payload plus an optional disable condition.
///
/// `disable_action_if` is evaluated against the current scope immediately
/// before dispatch; true skips the action (a no-op, not an error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDef {
    #[serde(flatten)]
    pub kind: ActionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_action_if: Option<ExprValue>,
}

impl ActionDef {
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, disable_action_if: None }
    }

    /// The wire-format type string for this action kind.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ActionKind::SetState(_) => "setState",
            ActionKind::NavigateToPage(_) => "navigateToPage",
            ActionKind::NavigateBack(_) => "navigateBack",
            ActionKind::CallRestApi(_) => "callRestApi",
            ActionKind::OpenUrl(_) => "openUrl",
            ActionKind::ShowToast(_) => "showToast",
            ActionKind::RebuildState(_) => "rebuildState",
        }
    }
}

/// The tagged action payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ActionKind {
    SetState(SetStateAction),
    NavigateToPage(NavigateToPageAction),
    NavigateBack(NavigateBackAction),
    CallRestApi(CallRestApiAction),
    OpenUrl(OpenUrlAction),
    ShowToast(ShowToastAction),
    RebuildState(RebuildStateAction),
}

/// Merge evaluated updates into a state container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStateAction {
    /// Target container namespace, found by ancestor-name lookup. Absent
    /// means the nearest container in scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_name: Option<String>,

    /// key -> value expression, evaluated in declaration order.
    pub updates: IndexMap<String, ExprValue>,

    /// Whether subscribers are notified immediately after the merge.
    #[serde(default = "default_true")]
    pub rebuild: bool,
}

/// Push a page, optionally truncating the stack first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateToPageAction {
    pub page_id: ExprValue,

    /// Page arguments; nested expressions are evaluated deeply.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, ExprValue>,

    /// Pop back to this named route before pushing, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_until_route: Option<String>,

    /// Replace the current route instead of stacking on top of it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub replace: bool,

    /// Flow run with the navigation result bound into scope as `result`.
    /// Hosts without a result channel bind null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_result: Option<ActionFlowDef>,
}

/// Pop the current page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateBackAction {
    /// When true, check can-go-back first and report the outcome as a
    /// boolean instead of failing on an empty stack.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub maybe: bool,
}

/// Execute a registered API data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRestApiAction {
    pub data_source_id: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, ExprValue>,

    /// Evaluated against the response to pick the success branch; absent
    /// falls back to the transport's own success signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_condition: Option<ExprValue>,

    /// Name of a scope variable holding an API cancel token to attach to
    /// the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<ActionFlowDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<ActionFlowDef>,
}

/// Open a URL through the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenUrlAction {
    pub url: ExprValue,
}

/// Show a transient toast message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowToastAction {
    pub message: ExprValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Force a re-render by notifying a state container's subscribers without
/// changing values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildStateAction {
    /// Target container namespace. Absent rebuilds the origin (root)
    /// container, which is a deliberately broad refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_set_state_action() {
        let action: ActionDef = serde_json::from_value(json!({
            "type": "setState",
            "data": {
                "contextName": "cart_page",
                "updates": { "count": { "expr": "state.count + 1" } }
            }
        }))
        .unwrap();
        assert_eq!(action.type_name(), "setState");
        let ActionKind::SetState(set_state) = &action.kind else {
            panic!("expected setState");
        };
        assert_eq!(set_state.context_name.as_deref(), Some("cart_page"));
        assert!(set_state.rebuild, "rebuild defaults on");
    }

    #[test]
    fn parses_disable_condition() {
        let action: ActionDef = serde_json::from_value(json!({
            "type": "navigateBack",
            "data": { "maybe": true },
            "disableActionIf": { "expr": "state.busy" }
        }))
        .unwrap();
        assert_eq!(action.disable_action_if, Some(ExprValue::Expr("state.busy".into())));
    }

    #[test]
    fn parses_nested_flows() {
        let action: ActionDef = serde_json::from_value(json!({
            "type": "callRestApi",
            "data": {
                "dataSourceId": "get_products",
                "args": { "limit": 10 },
                "successCondition": { "expr": "response.statusCode == 200" },
                "onSuccess": {
                    "actions": [{
                        "type": "setState",
                        "data": { "updates": { "products": { "expr": "response.body" } } }
                    }]
                },
                "onError": {
                    "actions": [{
                        "type": "showToast",
                        "data": { "message": "Failed: ${response.error}" }
                    }]
                }
            }
        }))
        .unwrap();
        let ActionKind::CallRestApi(call) = &action.kind else {
            panic!("expected callRestApi");
        };
        assert_eq!(call.on_success.as_ref().unwrap().actions.len(), 1);
        assert_eq!(call.on_error.as_ref().unwrap().actions.len(), 1);
    }

    #[test]
    fn flow_round_trips_through_json() {
        let flow: ActionFlowDef = serde_json::from_value(json!({
            "inkwell": true,
            "actions": [
                {
                    "type": "setState",
                    "data": { "updates": { "n": "${state.n + 1}" } },
                    "disableActionIf": { "expr": "state.locked" }
                },
                { "type": "openUrl", "data": { "url": "https://example.com" } },
                { "type": "rebuildState", "data": {} }
            ]
        }))
        .unwrap();

        let reparsed: ActionFlowDef =
            serde_json::from_value(serde_json::to_value(&flow).unwrap()).unwrap();
        assert_eq!(flow, reparsed);
        assert!(reparsed.inkwell);
        assert_eq!(reparsed.actions[0].type_name(), "setState");
    }
}
