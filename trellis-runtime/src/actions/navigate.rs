//! Navigation processors.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use trellis_api::{ActionDef, ActionKind};

use crate::{
    DefaultScopeContext, ExecutionContext, RuntimeError,
    actions::{ActionExecutor, ActionOptions, ActionProcessor, wrong_kind},
    string_of,
};

/// Pushes a page, optionally truncating the stack to a named route first.
///
/// Page id and arguments are deep-evaluated: nested expressions anywhere in
/// the argument structure are resolved against the caller's scope. When an
/// `onResult` flow is declared it runs after the push resolves, with the
/// navigation result bound into scope as `result` — hosts without a result
/// channel bind null.
pub struct NavigateToPageProcessor;

#[async_trait]
impl ActionProcessor for NavigateToPageProcessor {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        executor: &ActionExecutor,
        options: &ActionOptions,
    ) -> Result<Value, RuntimeError> {
        let ActionKind::NavigateToPage(navigate) = &action.kind else {
            return Err(wrong_kind(action, "navigateToPage"));
        };

        let page_id = string_of(&ctx.eval(&navigate.page_id));
        if page_id.is_empty() {
            return Err(RuntimeError::Navigation("page id evaluated to empty".to_string()));
        }

        let mut args = Map::new();
        for (name, expr) in &navigate.args {
            let wire: Value = expr.clone().into();
            args.insert(name.clone(), ctx.deep_eval(&wire));
        }
        let args = Value::Object(args);

        tracing::debug!(
            %page_id,
            remove_until = ?navigate.remove_until_route,
            replace = navigate.replace,
            "navigating"
        );
        let result = match &navigate.remove_until_route {
            Some(until_route) => {
                ctx.services
                    .navigator
                    .push_and_remove_until(&page_id, args, until_route)
                    .await?
            }
            None if navigate.replace => {
                ctx.services.navigator.replace(&page_id, args).await?;
                None
            }
            None => ctx.services.navigator.push(&page_id, args).await?,
        };

        let result_value = result.unwrap_or(Value::Null);
        if let Some(on_result) = &navigate.on_result {
            let result_scope: Arc<dyn crate::ScopeContext> =
                Arc::new(DefaultScopeContext::from_json([(
                    "result".to_string(),
                    result_value.clone(),
                )]));
            let nested_ctx = ctx.with_chained_scope(result_scope);
            executor
                .execute_flow_with_parent(on_result, &nested_ctx, "onResult", Some(options.action_id))
                .await?;
        }
        Ok(result_value)
    }
}

/// Pops the current page.
///
/// In `maybe` mode the processor checks can-go-back first and reports the
/// outcome as a boolean; otherwise it pops unconditionally and an empty
/// stack is an error.
pub struct NavigateBackProcessor;

#[async_trait]
impl ActionProcessor for NavigateBackProcessor {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        _executor: &ActionExecutor,
        _options: &ActionOptions,
    ) -> Result<Value, RuntimeError> {
        let ActionKind::NavigateBack(back) = &action.kind else {
            return Err(wrong_kind(action, "navigateBack"));
        };

        if back.maybe {
            if !ctx.services.navigator.can_go_back() {
                tracing::debug!("maybe-pop on a root route, reporting false");
                return Ok(Value::Bool(false));
            }
            ctx.services.navigator.pop().await?;
            return Ok(Value::Bool(true));
        }

        ctx.services.navigator.pop().await?;
        Ok(Value::Null)
    }
}
