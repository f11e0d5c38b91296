//! Chained scope contexts for expression evaluation.
//!
//! A scope is an immutable node in a cons-list chain: resolution checks the
//! node's own variables, then delegates outward. Chaining never mutates an
//! existing node — "splicing" builds a new spine — so captured scopes can be
//! reused across render passes without aliasing surprises.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::{ScopeValue, StateContext};

/// A linked evaluation context resolving names to values.
///
/// Absent names never error; callers treat a miss as null.
pub trait ScopeContext: Send + Sync {
    /// Resolve against this node only, ignoring enclosing scopes.
    fn resolve_local(&self, name: &str) -> Option<ScopeValue>;

    /// The enclosing scope, or none at the chain root.
    fn enclosing(&self) -> Option<Arc<dyn ScopeContext>>;

    /// Resolve walking the chain from this node outward; innermost wins.
    fn resolve(&self, name: &str) -> Option<ScopeValue> {
        self.resolve_local(name)
            .or_else(|| self.enclosing().and_then(|outer| outer.resolve(name)))
    }
}

/// Resolve to the JSON projection, null on a miss.
pub fn resolve_json(scope: &dyn ScopeContext, name: &str) -> Value {
    scope.resolve(name).map(|value| value.to_json()).unwrap_or(Value::Null)
}

/// A pure variable-map scope.
#[derive(Default)]
pub struct DefaultScopeContext {
    variables: HashMap<String, ScopeValue>,
    enclosing: Option<Arc<dyn ScopeContext>>,
}

impl DefaultScopeContext {
    pub fn new(
        variables: impl IntoIterator<Item = (String, ScopeValue)>,
        enclosing: Option<Arc<dyn ScopeContext>>,
    ) -> Self {
        Self { variables: variables.into_iter().collect(), enclosing }
    }

    /// An empty root scope.
    pub fn root() -> Arc<dyn ScopeContext> {
        Arc::new(Self::default())
    }

    /// A single-purpose scope from JSON values, enclosing nothing.
    pub fn from_json(variables: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self::new(
            variables.into_iter().map(|(name, value)| (name, ScopeValue::Json(value))),
            None,
        )
    }
}

impl ScopeContext for DefaultScopeContext {
    fn resolve_local(&self, name: &str) -> Option<ScopeValue> {
        self.variables.get(name).cloned()
    }

    fn enclosing(&self) -> Option<Arc<dyn ScopeContext>> {
        self.enclosing.clone()
    }
}

/// A scope backed by a live state container.
///
/// State names resolve against the container's *current* values on every
/// call — never a snapshot — so expressions always see the latest state.
pub struct StateScopeContext {
    variables: HashMap<String, ScopeValue>,
    state: Arc<StateContext>,
    enclosing: Option<Arc<dyn ScopeContext>>,
}

impl StateScopeContext {
    pub fn new(
        variables: impl IntoIterator<Item = (String, ScopeValue)>,
        state: Arc<StateContext>,
        enclosing: Option<Arc<dyn ScopeContext>>,
    ) -> Self {
        Self { variables: variables.into_iter().collect(), state, enclosing }
    }

    pub fn state(&self) -> &Arc<StateContext> {
        &self.state
    }
}

impl ScopeContext for StateScopeContext {
    fn resolve_local(&self, name: &str) -> Option<ScopeValue> {
        if let Some(value) = self.variables.get(name) {
            return Some(value.clone());
        }
        self.state.get_value(name)
    }

    fn enclosing(&self) -> Option<Arc<dyn ScopeContext>> {
        self.enclosing.clone()
    }
}

/// The result of splicing one chain in front of another.
///
/// Resolution exhausts the whole `head` chain before falling through to
/// `tail`; existing nodes are untouched.
struct SplicedScope {
    head: Arc<dyn ScopeContext>,
    tail: Arc<dyn ScopeContext>,
}

impl ScopeContext for SplicedScope {
    fn resolve_local(&self, name: &str) -> Option<ScopeValue> {
        self.head.resolve(name)
    }

    fn enclosing(&self) -> Option<Arc<dyn ScopeContext>> {
        Some(self.tail.clone())
    }
}

/// Attach `tail` as the terminal enclosing link of `chain` without
/// disturbing intermediate links.
///
/// Used to re-parent a local chain under a different ancestor at render
/// time: an item-scoped context of a repeated list child still sees outer
/// page and component variables through the spliced tail.
pub fn add_context_at_tail(
    chain: Arc<dyn ScopeContext>,
    tail: Arc<dyn ScopeContext>,
) -> Arc<dyn ScopeContext> {
    Arc::new(SplicedScope { head: chain, tail })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain_of_three() -> Arc<dyn ScopeContext> {
        // C (outermost) <- B <- A (innermost)
        let c: Arc<dyn ScopeContext> = Arc::new(DefaultScopeContext::new(
            [
                ("shared".to_string(), ScopeValue::Json(json!("from-c"))),
                ("outer_only".to_string(), ScopeValue::Json(json!(3))),
            ],
            None,
        ));
        let b: Arc<dyn ScopeContext> =
            Arc::new(DefaultScopeContext::new([], Some(c)));
        Arc::new(DefaultScopeContext::new(
            [("shared".to_string(), ScopeValue::Json(json!("from-a")))],
            Some(b),
        ))
    }

    #[test]
    fn outer_variable_is_resolvable_from_innermost() {
        let a = chain_of_three();
        assert_eq!(resolve_json(a.as_ref(), "outer_only"), json!(3));
    }

    #[test]
    fn innermost_definition_wins() {
        let a = chain_of_three();
        assert_eq!(resolve_json(a.as_ref(), "shared"), json!("from-a"));
    }

    #[test]
    fn unknown_names_resolve_to_null_without_error() {
        let a = chain_of_three();
        assert!(a.resolve("missing").is_none());
        assert_eq!(resolve_json(a.as_ref(), "missing"), Value::Null);
    }

    #[test]
    fn splicing_preserves_intermediate_links_and_adds_a_tail() {
        let item_scope: Arc<dyn ScopeContext> = Arc::new(DefaultScopeContext::from_json([
            ("currentItem".to_string(), json!("apple")),
            ("shared".to_string(), json!("item-wins")),
        ]));
        let page_scope = chain_of_three();

        let spliced = add_context_at_tail(item_scope, page_scope);

        // Item variables win, chain variables still reachable.
        assert_eq!(resolve_json(spliced.as_ref(), "currentItem"), json!("apple"));
        assert_eq!(resolve_json(spliced.as_ref(), "shared"), json!("item-wins"));
        assert_eq!(resolve_json(spliced.as_ref(), "outer_only"), json!(3));
    }

    #[test]
    fn state_scope_reads_live_values() {
        let state = StateContext::root("page", []);
        let scope = StateScopeContext::new([], Arc::clone(&state), None);

        assert!(scope.resolve("count").is_none());
        state.set_value("count", ScopeValue::Json(json!(1)), true);
        assert_eq!(resolve_json(&scope, "count"), json!(1));

        state.set_value("count", ScopeValue::Json(json!(2)), true);
        assert_eq!(resolve_json(&scope, "count"), json!(2), "not snapshotted");
    }
}
