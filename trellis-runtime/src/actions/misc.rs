//! Leaf side-effect processors: open-url, show-toast, rebuild-state.

use async_trait::async_trait;
use serde_json::Value;
use trellis_api::{ActionDef, ActionKind};

use crate::{
    ExecutionContext, RuntimeError,
    actions::{ActionExecutor, ActionOptions, ActionProcessor, wrong_kind},
    string_of,
};

/// Opens a URL through the host platform. Failures propagate.
pub struct OpenUrlProcessor;

#[async_trait]
impl ActionProcessor for OpenUrlProcessor {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        _executor: &ActionExecutor,
        _options: &ActionOptions,
    ) -> Result<Value, RuntimeError> {
        let ActionKind::OpenUrl(open) = &action.kind else {
            return Err(wrong_kind(action, "openUrl"));
        };
        let url = string_of(&ctx.eval(&open.url));
        ctx.services.url_opener.open(&url)?;
        Ok(Value::Null)
    }
}

/// Shows a transient toast. Failures propagate.
pub struct ShowToastProcessor;

#[async_trait]
impl ActionProcessor for ShowToastProcessor {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        _executor: &ActionExecutor,
        _options: &ActionOptions,
    ) -> Result<Value, RuntimeError> {
        let ActionKind::ShowToast(toast) = &action.kind else {
            return Err(wrong_kind(action, "showToast"));
        };
        let message = ctx.eval_string(&toast.message);
        ctx.services.toast.show(&message, toast.duration_ms)?;
        Ok(Value::Null)
    }
}

/// Forces a re-render by notifying a state container without changing
/// values.
///
/// With a target namespace this rebuilds the named ancestor; with none it
/// rebuilds the *origin* container — a whole-tree refresh. The breadth of
/// that default is inherited behavior; prefer a named target for scoped
/// rebuilds.
pub struct RebuildStateProcessor;

#[async_trait]
impl ActionProcessor for RebuildStateProcessor {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        _executor: &ActionExecutor,
        _options: &ActionOptions,
    ) -> Result<Value, RuntimeError> {
        let ActionKind::RebuildState(rebuild) = &action.kind else {
            return Err(wrong_kind(action, "rebuildState"));
        };

        let nearest = ctx.state.as_ref().ok_or(RuntimeError::NoStateContext)?;
        let target = match &rebuild.context_name {
            Some(namespace) => nearest.find_ancestor_context(namespace).ok_or_else(|| {
                RuntimeError::StateContextNotFound { namespace: namespace.clone() }
            })?,
            None => nearest.origin_context(),
        };

        tracing::debug!(namespace = target.namespace(), "rebuilding state subtree");
        target.trigger_listeners();
        Ok(Value::Null)
    }
}
