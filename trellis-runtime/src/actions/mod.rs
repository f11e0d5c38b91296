//! Action-flow execution.
//!
//! A flow's actions run strictly sequentially: an action's processor fully
//! resolves — including any nested sub-flows — before the next action
//! starts. Each action's disable condition is evaluated immediately before
//! dispatch, against whatever state earlier actions left behind. A
//! processor error aborts the remainder of the flow and propagates to the
//! trigger site; the engine never swallows it.

mod misc;
mod navigate;
mod rest_api;
mod set_state;

pub use misc::{OpenUrlProcessor, RebuildStateProcessor, ShowToastProcessor};
pub use navigate::{NavigateBackProcessor, NavigateToPageProcessor};
pub use rest_api::CallRestApiProcessor;
pub use set_state::SetStateProcessor;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use trellis_api::{ActionDef, ActionFlowDef};
use uuid::Uuid;

use crate::{ExecutionContext, RuntimeError};

/// Per-invocation options handed to a processor.
#[derive(Debug, Clone)]
pub struct ActionOptions {
    /// Unique id for this invocation, generated at dispatch time.
    pub action_id: Uuid,

    /// The invoking action's id when this flow is nested, for correlation.
    pub parent_action_id: Option<Uuid>,

    /// What fired the flow (`onClick`, `onPageLoad`, `onSuccess`, ...).
    pub trigger: String,
}

/// Executes one action kind against the shared context.
///
/// Processors re-enter the engine for nested flows through the `executor`
/// argument, always passing the current context explicitly.
#[async_trait]
pub trait ActionProcessor: Send + Sync {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        executor: &ActionExecutor,
        options: &ActionOptions,
    ) -> Result<Value, RuntimeError>;
}

/// Maps action type strings to processors and runs flows.
pub struct ActionExecutor {
    processors: HashMap<String, Arc<dyn ActionProcessor>>,
}

impl ActionExecutor {
    /// An executor with no registered processors.
    pub fn empty() -> Self {
        Self { processors: HashMap::new() }
    }

    /// An executor with every built-in processor registered.
    pub fn new() -> Self {
        let mut executor = Self::empty();
        executor.register("setState", Arc::new(SetStateProcessor));
        executor.register("navigateToPage", Arc::new(NavigateToPageProcessor));
        executor.register("navigateBack", Arc::new(NavigateBackProcessor));
        executor.register("callRestApi", Arc::new(CallRestApiProcessor));
        executor.register("openUrl", Arc::new(OpenUrlProcessor));
        executor.register("showToast", Arc::new(ShowToastProcessor));
        executor.register("rebuildState", Arc::new(RebuildStateProcessor));
        executor
    }

    /// Register or replace the processor for an action type.
    pub fn register(&mut self, action_type: impl Into<String>, processor: Arc<dyn ActionProcessor>) {
        self.processors.insert(action_type.into(), processor);
    }

    /// Run a top-level flow.
    pub async fn execute_flow(
        &self,
        flow: &ActionFlowDef,
        ctx: &ExecutionContext,
        trigger: &str,
    ) -> Result<(), RuntimeError> {
        self.execute_flow_with_parent(flow, ctx, trigger, None).await
    }

    /// Run a flow nested under an invoking action.
    pub async fn execute_flow_with_parent(
        &self,
        flow: &ActionFlowDef,
        ctx: &ExecutionContext,
        trigger: &str,
        parent_action_id: Option<Uuid>,
    ) -> Result<(), RuntimeError> {
        for action in &flow.actions {
            // Evaluated fresh per action: earlier actions may have mutated
            // the state this condition reads.
            if let Some(condition) = &action.disable_action_if {
                if ctx.eval_bool(condition, false) {
                    tracing::debug!(
                        action_type = action.type_name(),
                        trigger,
                        "action disabled, skipping"
                    );
                    continue;
                }
            }

            let processor = self.processors.get(action.type_name()).ok_or_else(|| {
                let mut known: Vec<String> = self.processors.keys().cloned().collect();
                known.sort();
                RuntimeError::UnknownActionType {
                    action_type: action.type_name().to_string(),
                    known,
                }
            })?;

            let options = ActionOptions {
                action_id: Uuid::new_v4(),
                parent_action_id,
                trigger: trigger.to_string(),
            };
            tracing::debug!(
                action_type = action.type_name(),
                action_id = %options.action_id,
                parent_action_id = ?options.parent_action_id,
                trigger,
                "executing action"
            );

            processor.execute(action, ctx, self, &options).await?;
        }
        Ok(())
    }
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// The payload type didn't match the processor — a registration mistake.
pub(crate) fn wrong_kind(action: &ActionDef, expected: &str) -> RuntimeError {
    RuntimeError::Other(format!(
        "processor for '{expected}' received action of type '{}'",
        action.type_name()
    ))
}
