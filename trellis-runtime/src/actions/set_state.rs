//! SetState processor.

use async_trait::async_trait;
use serde_json::Value;
use trellis_api::{ActionDef, ActionKind};

use crate::{
    ExecutionContext, RuntimeError, ScopeValue,
    actions::{ActionExecutor, ActionOptions, ActionProcessor, wrong_kind},
};

/// Evaluates each update expression against the current scope and merges
/// the results into the target state container.
///
/// The target is the named ancestor context when `contextName` is set,
/// otherwise the nearest container in scope. Running with no container at
/// all is a broken widget tree and fails immediately.
pub struct SetStateProcessor;

#[async_trait]
impl ActionProcessor for SetStateProcessor {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        _executor: &ActionExecutor,
        _options: &ActionOptions,
    ) -> Result<Value, RuntimeError> {
        let ActionKind::SetState(set_state) = &action.kind else {
            return Err(wrong_kind(action, "setState"));
        };

        let nearest = ctx.state.as_ref().ok_or(RuntimeError::NoStateContext)?;
        let target = match &set_state.context_name {
            Some(namespace) => nearest.find_ancestor_context(namespace).ok_or_else(|| {
                RuntimeError::StateContextNotFound { namespace: namespace.clone() }
            })?,
            None => std::sync::Arc::clone(nearest),
        };

        let updates: Vec<(String, ScopeValue)> = set_state
            .updates
            .iter()
            .map(|(key, expr)| (key.clone(), ScopeValue::Json(ctx.eval(expr))))
            .collect();

        tracing::debug!(
            namespace = target.namespace(),
            keys = ?updates.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
            rebuild = set_state.rebuild,
            "merging state updates"
        );
        target.set_values(updates, set_state.rebuild);
        Ok(Value::Null)
    }
}
