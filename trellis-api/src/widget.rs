//! Widget descriptors - the parsed JSON form of a UI tree.
//!
//! A [`WidgetDef`] is immutable: produced once from a definition document
//! and consumed by the registry in `trellis-view` to build virtual widgets.
//! Child groups preserve insertion order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ActionFlowDef, ExprValue, VariableDef};

/// Named, ordered groups of child descriptors (`children`, `child`,
/// `appBar`, `body`, ...).
pub type ChildGroups = IndexMap<String, Vec<WidgetDef>>;

/// A parsed widget descriptor.
///
/// Variants are distinguished by shape: a node carries `type`, a state
/// wrapper carries `initStateDefs`, a component reference carries `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetDef {
    Node(NodeDef),
    State(StateDef),
    Component(ComponentRefDef),
}

impl WidgetDef {
    /// The ref name used for hierarchy tracing, if one is declared.
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            WidgetDef::Node(node) => node.ref_name.as_deref(),
            WidgetDef::State(_) => None,
            WidgetDef::Component(component) => component.ref_name.as_deref(),
        }
    }
}

/// A concrete widget node: a namespaced type string plus its props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    /// Namespaced widget type, e.g. `t/text`.
    #[serde(rename = "type")]
    pub widget_type: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_props: Option<CommonProps>,

    #[serde(default, skip_serializing_if = "ChildGroups::is_empty")]
    pub child_groups: ChildGroups,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
}

impl NodeDef {
    /// A prop by name, as a raw JSON value.
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// A prop by name, parsed as an expression-or-literal.
    pub fn expr_prop(&self, name: &str) -> Option<ExprValue> {
        self.props.get(name).cloned().map(ExprValue::from)
    }
}

/// A state wrapper: initial-state declarations around a subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDef {
    pub init_state_defs: IndexMap<String, VariableDef>,

    #[serde(default, skip_serializing_if = "ChildGroups::is_empty")]
    pub child_groups: ChildGroups,
}

/// A reference to a reusable component, with caller-supplied arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRefDef {
    /// Component definition id.
    pub id: String,

    /// Argument expressions, evaluated against the caller's scope.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, ExprValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_props: Option<CommonProps>,

    /// Props inherited from the enclosing parent widget, passed through
    /// opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_props: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
}

/// Shared props every node may carry: visibility gating, alignment, the
/// style box, and a tap action flow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<ExprValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<ExprValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_click: Option<ActionFlowDef>,
}

/// The style box model applied around a rendered widget.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<ExprValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<ExprValue>,
}

impl StyleDef {
    pub fn is_empty(&self) -> bool {
        *self == StyleDef::default()
    }
}
