//! The widget registry.
//!
//! Maps namespaced type strings to builder functions and dispatches on the
//! descriptor variant: nodes go through a registered builder, state
//! wrappers wrap their first child in a state-container widget, component
//! references become builder widgets that evaluate arguments against the
//! caller's scope and delegate to the component resolver.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use trellis_api::{ComponentDef, ComponentRefDef, NodeDef, WidgetDef};
use trellis_runtime::{DefaultScopeContext, ScopeContext, resolve_variables};

use crate::{
    BuilderWidget, RenderPayload, StateWidget, ViewError, ViewNode, VirtualWidget, WidgetBase,
    render_widget,
};

/// Child widgets built per named group, insertion order preserved.
pub type BuiltChildren = IndexMap<String, Vec<Arc<dyn VirtualWidget>>>;

/// A registered builder: descriptor plus built children in, widget out.
pub type WidgetBuilder =
    Arc<dyn Fn(&NodeDef, BuiltChildren) -> Result<Arc<dyn VirtualWidget>, ViewError> + Send + Sync>;

/// Resolves component ids to definitions.
pub trait ComponentResolver: Send + Sync {
    fn resolve(&self, id: &str) -> Option<ComponentDef>;
}

/// Component store backed by a plain map.
#[derive(Default)]
pub struct ComponentRegistry {
    components: HashMap<String, ComponentDef>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: ComponentDef) {
        self.components.insert(component.id.clone(), component);
    }

    pub fn with_component(mut self, component: ComponentDef) -> Self {
        self.insert(component);
        self
    }
}

impl ComponentResolver for ComponentRegistry {
    fn resolve(&self, id: &str) -> Option<ComponentDef> {
        self.components.get(id).cloned()
    }
}

/// String-keyed widget constructor table.
///
/// Registering an existing key replaces the prior builder — override
/// semantics, so hosts can swap a built-in for their own variant.
pub struct WidgetRegistry {
    builders: HashMap<String, WidgetBuilder>,
    components: Arc<dyn ComponentResolver>,
}

impl WidgetRegistry {
    pub fn new(components: Arc<dyn ComponentResolver>) -> Self {
        Self { builders: HashMap::new(), components }
    }

    /// Register a builder that receives the raw descriptor.
    pub fn register_json(
        &mut self,
        type_key: impl Into<String>,
        builder: impl Fn(&NodeDef, BuiltChildren) -> Result<Arc<dyn VirtualWidget>, ViewError>
        + Send
        + Sync
        + 'static,
    ) {
        self.builders.insert(type_key.into(), Arc::new(builder));
    }

    /// Register a builder with typed props parsed from the descriptor's
    /// prop map.
    pub fn register<P>(
        &mut self,
        type_key: impl Into<String>,
        builder: impl Fn(P, &NodeDef, BuiltChildren) -> Result<Arc<dyn VirtualWidget>, ViewError>
        + Send
        + Sync
        + 'static,
    ) where
        P: DeserializeOwned + Send + Sync + 'static,
    {
        let type_key = type_key.into();
        let key_for_errors = type_key.clone();
        self.register_json(type_key, move |def, children| {
            let props: P = serde_json::from_value(Value::Object(def.props.clone()))
                .map_err(|error| ViewError::InvalidProps {
                    widget_type: key_for_errors.clone(),
                    message: error.to_string(),
                })?;
            builder(props, def, children)
        });
    }

    /// The registered type keys, sorted, for error reporting.
    pub fn known_types(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.builders.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Build a virtual widget from a descriptor.
    ///
    /// Children are built depth-first; after the widget exists its children
    /// receive weak parent links. An unregistered node type and an
    /// unresolvable component id are configuration errors.
    pub fn create_widget(
        self: &Arc<Self>,
        def: &WidgetDef,
    ) -> Result<Arc<dyn VirtualWidget>, ViewError> {
        match def {
            WidgetDef::Node(node) => self.create_node(node),
            WidgetDef::State(state) => {
                let first_child = state
                    .child_groups
                    .values()
                    .next()
                    .and_then(|group| group.first())
                    .ok_or(ViewError::EmptyStateWrapper)?;
                // Single-child limitation: only the first child of the
                // first group is wrapped.
                let child = self.create_widget(first_child)?;
                let widget: Arc<dyn VirtualWidget> =
                    Arc::new(StateWidget::new(state.init_state_defs.clone(), Arc::clone(&child)));
                child.set_parent(Arc::downgrade(&widget));
                Ok(widget)
            }
            WidgetDef::Component(component) => Ok(self.create_component(component)),
        }
    }

    fn create_node(self: &Arc<Self>, node: &NodeDef) -> Result<Arc<dyn VirtualWidget>, ViewError> {
        let builder = self.builders.get(&node.widget_type).ok_or_else(|| {
            ViewError::UnknownWidgetType {
                widget_type: node.widget_type.clone(),
                known: self.known_types(),
            }
        })?;

        let mut children: BuiltChildren = IndexMap::new();
        for (group, defs) in &node.child_groups {
            let mut built = Vec::with_capacity(defs.len());
            for child_def in defs {
                built.push(self.create_widget(child_def)?);
            }
            children.insert(group.clone(), built);
        }

        let widget = builder(node, children.clone())?;
        for child in children.values().flatten() {
            child.set_parent(Arc::downgrade(&widget));
        }
        Ok(widget)
    }

    /// A component reference renders through a builder widget: at render
    /// time the arguments are evaluated against the *caller's* scope, the
    /// definition is resolved, and its tree — built once and memoized for
    /// this reference instance — renders in a component-scoped chain.
    fn create_component(self: &Arc<Self>, component: &ComponentRefDef) -> Arc<dyn VirtualWidget> {
        let registry = Arc::clone(self);
        let reference = component.clone();
        let built_root: OnceLock<Arc<dyn VirtualWidget>> = OnceLock::new();

        let base = WidgetBase::new(component.ref_name.clone(), component.common_props.clone());
        Arc::new(BuilderWidget::new(base, move |payload| {
            render_component(&registry, &reference, &built_root, payload)
        }))
    }
}

fn render_component(
    registry: &Arc<WidgetRegistry>,
    reference: &ComponentRefDef,
    built_root: &OnceLock<Arc<dyn VirtualWidget>>,
    payload: &RenderPayload,
) -> Result<ViewNode, ViewError> {
    let def = registry
        .components
        .resolve(&reference.id)
        .ok_or_else(|| ViewError::ComponentNotFound { id: reference.id.clone() })?;

    // Arguments evaluate in the caller's scope, before any component scope
    // exists.
    let mut supplied = serde_json::Map::new();
    for (name, expr) in &reference.args {
        supplied.insert(name.clone(), payload.eval(expr));
    }

    let resolved_args = resolve_variables(
        &def.arg_defs,
        Some(&supplied),
        payload.ctx.services.evaluator.as_ref(),
        payload.ctx.scope.as_ref(),
    );

    let root = match built_root.get() {
        Some(root) => Arc::clone(root),
        None => {
            let mut root = registry.create_widget(&def.layout.root)?;
            if !def.init_state_defs.is_empty() {
                let child = Arc::clone(&root);
                let wrapper: Arc<dyn VirtualWidget> =
                    Arc::new(StateWidget::new(def.init_state_defs.clone(), child));
                root = wrapper;
            }
            built_root.get_or_init(|| root).clone()
        }
    };

    let component_scope: Arc<dyn ScopeContext> =
        Arc::new(DefaultScopeContext::new(resolved_args, None));
    let chained = payload.copy_with_chained_context(component_scope);
    let component_payload = chained.copy_with_ctx(chained.ctx.with_entity_id(def.id.clone()));
    render_widget(root.as_ref(), &component_payload)
}
