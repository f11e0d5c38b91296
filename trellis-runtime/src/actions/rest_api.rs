//! CallRestApi processor.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use trellis_api::{ActionDef, ActionKind, ApiModel, ApiRequest, CallRestApiAction};

use crate::{
    Controller, DefaultScopeContext, ExecutionContext, RuntimeError, ScopeContext,
    actions::{ActionExecutor, ActionOptions, ActionProcessor, wrong_kind},
    bool_of, resolve_variables, string_of,
};

/// Resolves a data-source id to a registered API model, evaluates its
/// arguments, executes the request through the host transport, and runs the
/// success or error sub-flow chosen by the success condition.
///
/// The transport returns the normalized response shape on every path, so
/// branching logic is identical whether the failure was a non-2xx status or
/// a network exception.
pub struct CallRestApiProcessor;

#[async_trait]
impl ActionProcessor for CallRestApiProcessor {
    async fn execute(
        &self,
        action: &ActionDef,
        ctx: &ExecutionContext,
        executor: &ActionExecutor,
        options: &ActionOptions,
    ) -> Result<Value, RuntimeError> {
        let ActionKind::CallRestApi(call) = &action.kind else {
            return Err(wrong_kind(action, "callRestApi"));
        };

        let model = ctx
            .services
            .resources
            .api_model(&call.data_source_id)
            .ok_or_else(|| RuntimeError::UnknownDataSource { id: call.data_source_id.clone() })?;

        let request = resolve_request(&model, call, ctx);
        let cancel = call.cancel_token.as_deref().and_then(|name| {
            match ctx.scope.resolve(name).and_then(|value| value.as_controller().cloned()) {
                Some(Controller::CancelToken(token)) => Some(token),
                _ => None,
            }
        });

        tracing::debug!(
            data_source = %call.data_source_id,
            url = %request.url,
            method = ?request.method,
            "executing API call"
        );
        let response = ctx.services.http.execute(request, cancel).await;
        let response_value = response.to_value();

        let response_scope: Arc<dyn ScopeContext> = Arc::new(DefaultScopeContext::from_json([(
            "response".to_string(),
            response_value.clone(),
        )]));
        let branch_ctx = ctx.with_chained_scope(response_scope);

        let succeeded = match &call.success_condition {
            Some(condition) => bool_of(&branch_ctx.eval(condition)).unwrap_or(false),
            None => response.is_success(),
        };

        let sub_flow = if succeeded { &call.on_success } else { &call.on_error };
        if let Some(flow) = sub_flow {
            let trigger = if succeeded { "onSuccess" } else { "onError" };
            executor
                .execute_flow_with_parent(flow, &branch_ctx, trigger, Some(options.action_id))
                .await?;
        }
        Ok(response_value)
    }
}

/// Evaluate the model's declared arguments (action-supplied values win over
/// defaults), then resolve url, headers, and body in an `args`-bearing
/// scope.
fn resolve_request(model: &ApiModel, call: &CallRestApiAction, ctx: &ExecutionContext) -> ApiRequest {
    let mut supplied = Map::new();
    for (name, expr) in &call.args {
        supplied.insert(name.clone(), ctx.eval(expr));
    }

    let resolved = resolve_variables(
        &model.arg_defs,
        Some(&supplied),
        ctx.services.evaluator.as_ref(),
        ctx.scope.as_ref(),
    );
    let mut args = Map::new();
    for (name, value) in &resolved {
        args.insert(name.clone(), value.to_json());
    }
    // Action arguments without a matching declaration still participate.
    for (name, value) in supplied {
        args.entry(name).or_insert(value);
    }

    let args_scope: Arc<dyn ScopeContext> =
        Arc::new(DefaultScopeContext::from_json([("args".to_string(), Value::Object(args))]));
    let request_ctx = ctx.with_chained_scope(args_scope);

    let url = string_of(&request_ctx.eval(&model.url));
    let mut headers = IndexMap::new();
    for (name, expr) in &model.headers {
        headers.insert(name.clone(), string_of(&request_ctx.eval(expr)));
    }
    let body = model.body.as_ref().map(|body| {
        let wire: Value = body.clone().into();
        request_ctx.deep_eval(&wire)
    });

    ApiRequest { url, method: model.method, headers, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpTransport, ApiCancelToken, ScopeValue, Services};
    use serde_json::json;
    use std::sync::Mutex;
    use trellis_api::{ActionFlowDef, ApiResponse, ExprValue, HttpMethod, SetStateAction};
    use uuid::Uuid;

    /// Transport double that records requests and replays canned responses.
    struct CannedTransport {
        response: ApiResponse,
        requests: Mutex<Vec<(ApiRequest, bool)>>,
    }

    impl CannedTransport {
        fn new(response: ApiResponse) -> Self {
            Self { response, requests: Mutex::new(Vec::new()) }
        }

        fn requests(&self) -> Vec<(ApiRequest, bool)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn execute(
            &self,
            request: ApiRequest,
            cancel: Option<ApiCancelToken>,
        ) -> ApiResponse {
            self.requests.lock().unwrap().push((request, cancel.is_some()));
            self.response.clone()
        }
    }

    fn model() -> ApiModel {
        serde_json::from_value(json!({
            "id": "get_products",
            "url": "https://api.example.com/products?limit=${args.limit}",
            "method": "GET",
            "headers": { "X-Page": "${args.page}" },
            "argDefs": {
                "limit": { "name": "limit", "type": "number", "default": 20 },
                "page": { "name": "page", "type": "number", "default": 1 }
            }
        }))
        .unwrap()
    }

    fn call_action(
        args: impl IntoIterator<Item = (&'static str, ExprValue)>,
        success_condition: Option<ExprValue>,
        on_success: Option<ActionFlowDef>,
        on_error: Option<ActionFlowDef>,
    ) -> ActionDef {
        ActionDef::new(ActionKind::CallRestApi(CallRestApiAction {
            data_source_id: "get_products".to_string(),
            args: args.into_iter().map(|(name, expr)| (name.to_string(), expr)).collect(),
            success_condition,
            cancel_token: None,
            on_success,
            on_error,
        }))
    }

    fn harness(
        response: ApiResponse,
    ) -> (ExecutionContext, Arc<CannedTransport>, Arc<crate::StateContext>) {
        let state = crate::StateContext::root("page", []);
        let transport = Arc::new(CannedTransport::new(response));
        let mut services = Services::bare();
        services.resources =
            Arc::new(crate::InMemoryResources::new().with_api_model(model()));
        services.http = Arc::clone(&transport) as Arc<dyn HttpTransport>;
        let scope = Arc::new(crate::StateScopeContext::new([], Arc::clone(&state), None));
        let ctx = ExecutionContext::new(scope, Arc::new(services), "page")
            .with_state(Arc::clone(&state));
        (ctx, transport, state)
    }

    fn ok_response(body: Value) -> ApiResponse {
        ApiResponse {
            body,
            status_code: 200,
            headers: IndexMap::new(),
            request_obj: None,
            error: None,
        }
    }

    fn options() -> ActionOptions {
        ActionOptions {
            action_id: Uuid::new_v4(),
            parent_action_id: None,
            trigger: "test".to_string(),
        }
    }

    fn store_body_flow() -> ActionFlowDef {
        ActionFlowDef::new(vec![ActionDef::new(ActionKind::SetState(SetStateAction {
            context_name: None,
            updates: [("last".to_string(), ExprValue::Expr("response.body".into()))]
                .into_iter()
                .collect(),
            rebuild: true,
        }))])
    }

    fn store_error_flow() -> ActionFlowDef {
        ActionFlowDef::new(vec![ActionDef::new(ActionKind::SetState(SetStateAction {
            context_name: None,
            updates: [("error".to_string(), ExprValue::Expr("response.error".into()))]
                .into_iter()
                .collect(),
            rebuild: true,
        }))])
    }

    #[tokio::test]
    async fn resolves_url_and_headers_from_declared_args() {
        let (ctx, transport, _state) = harness(ok_response(json!([])));
        let action = call_action(
            [("limit", ExprValue::Literal(json!(5)))],
            None,
            None,
            None,
        );

        CallRestApiProcessor
            .execute(&action, &ctx, &ActionExecutor::new(), &options())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let (request, had_token) = &requests[0];
        assert_eq!(request.url, "https://api.example.com/products?limit=5");
        assert_eq!(request.headers["X-Page"], "1", "default applied");
        assert_eq!(request.method, HttpMethod::Get);
        assert!(!had_token);
    }

    #[tokio::test]
    async fn success_branch_sees_the_response_in_scope() {
        let (ctx, _transport, state) = harness(ok_response(json!([{ "id": 1 }])));
        let action = call_action([], None, Some(store_body_flow()), Some(store_error_flow()));

        CallRestApiProcessor
            .execute(&action, &ctx, &ActionExecutor::new(), &options())
            .await
            .unwrap();

        assert_eq!(state.get_value("last").unwrap().to_json(), json!([{ "id": 1 }]));
        assert!(state.get_value("error").is_none());
    }

    #[tokio::test]
    async fn transport_failure_takes_the_error_branch_with_uniform_shape() {
        let failure = ApiResponse::from_transport_error(
            ApiRequest {
                url: "https://api.example.com/products".into(),
                method: HttpMethod::Get,
                headers: IndexMap::new(),
                body: None,
            },
            "connection reset",
        );
        let (ctx, _transport, state) = harness(failure);
        let action = call_action([], None, Some(store_body_flow()), Some(store_error_flow()));

        CallRestApiProcessor
            .execute(&action, &ctx, &ActionExecutor::new(), &options())
            .await
            .unwrap();

        assert_eq!(state.get_value("error").unwrap().to_json(), json!("connection reset"));
        assert!(state.get_value("last").is_none());
    }

    #[tokio::test]
    async fn success_condition_overrides_the_status_signal() {
        // 200 response whose payload flags a logical failure.
        let (ctx, _transport, state) =
            harness(ok_response(json!({ "ok": false })));
        let action = call_action(
            [],
            Some(ExprValue::Expr("response.body.ok".into())),
            Some(store_body_flow()),
            Some(store_error_flow()),
        );

        CallRestApiProcessor
            .execute(&action, &ctx, &ActionExecutor::new(), &options())
            .await
            .unwrap();

        assert!(state.get_value("last").is_none(), "success flow skipped");
        assert!(state.get_value("error").is_some(), "error flow ran");
    }

    #[tokio::test]
    async fn unknown_data_source_is_fatal() {
        let (ctx, _transport, _state) = harness(ok_response(Value::Null));
        let mut action = call_action([], None, None, None);
        if let ActionKind::CallRestApi(call) = &mut action.kind {
            call.data_source_id = "missing".to_string();
        }

        let error = CallRestApiProcessor
            .execute(&action, &ctx, &ActionExecutor::new(), &options())
            .await
            .unwrap_err();
        assert!(matches!(error, RuntimeError::UnknownDataSource { .. }));
    }

    #[tokio::test]
    async fn cancel_token_from_scope_reaches_the_transport() {
        let (ctx, transport, _state) = harness(ok_response(Value::Null));
        let token = ApiCancelToken::new();
        let scope: Arc<dyn ScopeContext> = Arc::new(DefaultScopeContext::new(
            [(
                "cancel".to_string(),
                ScopeValue::Controller(Controller::CancelToken(token)),
            )],
            Some(Arc::clone(&ctx.scope)),
        ));
        let ctx = ctx.with_scope(scope);

        let mut action = call_action([], None, None, None);
        if let ActionKind::CallRestApi(call) = &mut action.kind {
            call.cancel_token = Some("cancel".to_string());
        }

        CallRestApiProcessor
            .execute(&action, &ctx, &ActionExecutor::new(), &options())
            .await
            .unwrap();
        let (_, had_token) = &transport.requests()[0];
        assert!(had_token);
    }
}
