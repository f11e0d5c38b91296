//! Page and component definitions.
//!
//! Several generations of the definition schema are in the wild; key
//! aliases (`uid`/`pageUid`/`pageId`, `inputArgs`/`pageArgDefs`/`argDefs`,
//! `variables`/`initStateDefs`) are all accepted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ActionFlowDef, VariableDef, WidgetDef};

/// The layout block of a page or component: a single root descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDef {
    pub root: WidgetDef,
}

/// Lifecycle action flows a page may declare.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_page_load_action: Option<ActionFlowDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_back_press: Option<ActionFlowDef>,
}

impl PageActions {
    pub fn is_empty(&self) -> bool {
        self.on_page_load_action.is_none() && self.on_back_press.is_none()
    }
}

/// A page definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDef {
    #[serde(alias = "pageUid", alias = "pageId")]
    pub uid: String,

    /// Argument declarations, supplied by the navigation that pushed the
    /// page.
    #[serde(
        default,
        alias = "inputArgs",
        alias = "pageArgDefs",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub arg_defs: IndexMap<String, VariableDef>,

    /// Initial-state declarations backing the page's root state container.
    #[serde(default, alias = "variables", skip_serializing_if = "IndexMap::is_empty")]
    pub init_state_defs: IndexMap<String, VariableDef>,

    pub layout: LayoutDef,

    #[serde(default, skip_serializing_if = "PageActions::is_empty")]
    pub actions: PageActions,
}

/// A reusable component definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDef {
    #[serde(alias = "componentId")]
    pub id: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arg_defs: IndexMap<String, VariableDef>,

    #[serde(default, alias = "variables", skip_serializing_if = "IndexMap::is_empty")]
    pub init_state_defs: IndexMap<String, VariableDef>,

    pub layout: LayoutDef,
}
