//! Page assembly.
//!
//! A mounted page owns the built widget tree for a page definition, the
//! page's root state container, and the wiring between state notification
//! and the host's render schedule: notification marks the page dirty, the
//! host re-renders on its next update cycle with a fresh payload.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Map, Value};
use trellis_api::{ActionFlowDef, PageDef};
use trellis_runtime::{
    ExecutionContext, RuntimeError, Services, StateContext, StateScopeContext,
    actions::ActionExecutor, resolve_variables,
};

use crate::{
    RenderMode, RenderPayload, TapBindings, ViewError, ViewNode, VirtualWidget, WidgetRegistry,
    render_widget,
};

/// A page definition mounted into a renderable tree.
pub struct MountedPage {
    def: PageDef,
    root: Arc<dyn VirtualWidget>,
    state: Arc<StateContext>,
    args: Vec<(String, trellis_runtime::ScopeValue)>,
    services: Arc<Services>,
    mode: RenderMode,
    dirty: Arc<AtomicBool>,
}

impl MountedPage {
    /// Build the page's widget tree and state container.
    ///
    /// `supplied_args` are the values the pushing navigation provided;
    /// they resolve against the page's argument declarations. The root
    /// container is created from the page's initial-state declarations and
    /// subscribes the dirty flag, so any notification marks the page for
    /// re-render.
    pub fn mount(
        def: PageDef,
        registry: &Arc<WidgetRegistry>,
        services: Arc<Services>,
        supplied_args: Option<Map<String, Value>>,
        mode: RenderMode,
    ) -> Result<Self, ViewError> {
        let root = registry.create_widget(&def.layout.root)?;

        let bootstrap_scope = trellis_runtime::DefaultScopeContext::root();
        let args = resolve_variables(
            &def.arg_defs,
            supplied_args.as_ref(),
            services.evaluator.as_ref(),
            bootstrap_scope.as_ref(),
        );

        // Initial state may reference page arguments in default
        // expressions.
        let arg_scope = trellis_runtime::DefaultScopeContext::new(args.clone(), None);
        let initial_state = resolve_variables(
            &def.init_state_defs,
            None,
            services.evaluator.as_ref(),
            &arg_scope,
        );
        let state = StateContext::root(def.uid.clone(), initial_state);

        let dirty = Arc::new(AtomicBool::new(true));
        let dirty_for_subscriber = Arc::clone(&dirty);
        state.subscribe(move || {
            dirty_for_subscriber.store(true, Ordering::SeqCst);
        });

        tracing::info!(page = %def.uid, "mounted page");
        Ok(Self { def, root, state, args, services, mode, dirty })
    }

    pub fn uid(&self) -> &str {
        &self.def.uid
    }

    pub fn state(&self) -> &Arc<StateContext> {
        &self.state
    }

    /// The execution context for this page's action flows and renders:
    /// argument variables over the live state container.
    pub fn execution_context(&self) -> ExecutionContext {
        let scope = Arc::new(StateScopeContext::new(
            self.args.iter().cloned(),
            Arc::clone(&self.state),
            None,
        ));
        ExecutionContext::new(scope, Arc::clone(&self.services), self.def.uid.clone())
            .with_state(Arc::clone(&self.state))
    }

    /// Render one pass, clearing the dirty flag. Returns the output tree
    /// and the pass's tap bindings for the host to wire.
    pub fn render(&self) -> Result<(ViewNode, Arc<TapBindings>), ViewError> {
        self.dirty.store(false, Ordering::SeqCst);
        let payload = RenderPayload::new(self.execution_context(), self.mode);
        let bindings = Arc::clone(&payload.bindings);
        let node = render_widget(self.root.as_ref(), &payload)?;
        Ok((node, bindings))
    }

    /// Whether a state notification has occurred since the last render.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Run the page's on-load flow, if declared.
    pub async fn run_on_load(&self, executor: &ActionExecutor) -> Result<(), RuntimeError> {
        if let Some(flow) = &self.def.actions.on_page_load_action {
            executor.execute_flow(flow, &self.execution_context(), "onPageLoad").await?;
        }
        Ok(())
    }

    /// The back-press flow, for the host's back handling.
    pub fn on_back_press(&self) -> Option<&ActionFlowDef> {
        self.def.actions.on_back_press.as_ref()
    }
}
