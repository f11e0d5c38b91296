//! Collaborator service traits and host-side defaults.
//!
//! The runtime consumes its surroundings — design tokens, API catalogs,
//! navigation, HTTP transport, URL/toast hosts — through these traits. The
//! bundled defaults are deliberately simple: in-memory catalogs and a
//! recording navigation stack, enough for embedding hosts to start from and
//! for the test suites to observe effects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use trellis_api::{ApiModel, ApiRequest, ApiResponse};

use crate::{ApiCancelToken, ExpressionEvaluator, PathEvaluator, RuntimeError};

/// Design-token and data-source lookups.
pub trait Resources: Send + Sync {
    /// A color token's resolved value, e.g. `#rrggbb`.
    fn get_color(&self, key: &str) -> Option<String>;

    /// A registered API data source.
    fn api_model(&self, id: &str) -> Option<ApiModel>;

    /// An icon glyph codepoint by family and name.
    fn icon(&self, family: &str, name: &str) -> Option<u32>;
}

/// In-memory resource catalog.
#[derive(Debug, Default)]
pub struct InMemoryResources {
    colors: HashMap<String, String>,
    api_models: HashMap<String, ApiModel>,
    icons: HashMap<(String, String), u32>,
}

impl InMemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.colors.insert(key.into(), value.into());
        self
    }

    pub fn with_api_model(mut self, model: ApiModel) -> Self {
        self.api_models.insert(model.id.clone(), model);
        self
    }

    pub fn with_icon(
        mut self,
        family: impl Into<String>,
        name: impl Into<String>,
        codepoint: u32,
    ) -> Self {
        self.icons.insert((family.into(), name.into()), codepoint);
        self
    }
}

impl Resources for InMemoryResources {
    fn get_color(&self, key: &str) -> Option<String> {
        self.colors.get(key).cloned()
    }

    fn api_model(&self, id: &str) -> Option<ApiModel> {
        self.api_models.get(id).cloned()
    }

    fn icon(&self, family: &str, name: &str) -> Option<u32> {
        self.icons.get(&(family.to_string(), name.to_string())).copied()
    }
}

/// Push/pop navigation with named-route addressing.
///
/// `push` may return a result delivered when the pushed page pops; hosts
/// without a result channel return `None`.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn push(&self, route: &str, args: Value) -> Result<Option<Value>, RuntimeError>;

    /// Pop back to the named route, then push. Routes above the named one
    /// are removed; an unknown route truncates nothing.
    async fn push_and_remove_until(
        &self,
        route: &str,
        args: Value,
        until_route: &str,
    ) -> Result<Option<Value>, RuntimeError>;

    /// Pop the current route. Errors on an empty stack.
    async fn pop(&self) -> Result<(), RuntimeError>;

    /// Replace the current route instead of stacking on top of it.
    async fn replace(&self, route: &str, args: Value) -> Result<(), RuntimeError>;

    fn can_go_back(&self) -> bool;
}

/// One entry on the recording navigation stack.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub route: String,
    pub args: Value,
}

/// A plain in-process navigation stack. Push results are always `None`
/// (no result channel); tests read the stack to assert navigation effects.
#[derive(Debug, Default)]
pub struct StackNavigator {
    stack: Mutex<Vec<RouteEntry>>,
}

impl StackNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(route: impl Into<String>) -> Self {
        let navigator = Self::new();
        navigator
            .stack
            .lock()
            .expect("navigation stack poisoned")
            .push(RouteEntry { route: route.into(), args: Value::Null });
        navigator
    }

    pub fn routes(&self) -> Vec<String> {
        self.stack
            .lock()
            .expect("navigation stack poisoned")
            .iter()
            .map(|entry| entry.route.clone())
            .collect()
    }

    pub fn top(&self) -> Option<RouteEntry> {
        self.stack.lock().expect("navigation stack poisoned").last().cloned()
    }
}

#[async_trait]
impl Navigator for StackNavigator {
    async fn push(&self, route: &str, args: Value) -> Result<Option<Value>, RuntimeError> {
        self.stack
            .lock()
            .expect("navigation stack poisoned")
            .push(RouteEntry { route: route.to_string(), args });
        Ok(None)
    }

    async fn push_and_remove_until(
        &self,
        route: &str,
        args: Value,
        until_route: &str,
    ) -> Result<Option<Value>, RuntimeError> {
        {
            let mut stack = self.stack.lock().expect("navigation stack poisoned");
            if let Some(position) =
                stack.iter().rposition(|entry| entry.route == until_route)
            {
                stack.truncate(position + 1);
            }
        }
        self.push(route, args).await
    }

    async fn pop(&self) -> Result<(), RuntimeError> {
        let mut stack = self.stack.lock().expect("navigation stack poisoned");
        if stack.pop().is_none() {
            return Err(RuntimeError::Navigation("pop on an empty stack".to_string()));
        }
        Ok(())
    }

    async fn replace(&self, route: &str, args: Value) -> Result<(), RuntimeError> {
        let mut stack = self.stack.lock().expect("navigation stack poisoned");
        if stack.pop().is_none() {
            return Err(RuntimeError::Navigation("replace on an empty stack".to_string()));
        }
        stack.push(RouteEntry { route: route.to_string(), args });
        Ok(())
    }

    fn can_go_back(&self) -> bool {
        self.stack.lock().expect("navigation stack poisoned").len() > 1
    }
}

/// HTTP transport. Implementations must return the normalized response
/// shape on every path; a transport-level failure is an `ApiResponse` with
/// `error` populated, never an `Err`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest, cancel: Option<ApiCancelToken>) -> ApiResponse;
}

/// A transport that answers every request with a canned connection error.
/// The default for hosts that have not wired a real client.
#[derive(Debug, Default)]
pub struct UnconfiguredTransport;

#[async_trait]
impl HttpTransport for UnconfiguredTransport {
    async fn execute(&self, request: ApiRequest, _cancel: Option<ApiCancelToken>) -> ApiResponse {
        ApiResponse::from_transport_error(request, "no HTTP transport configured")
    }
}

/// Opens URLs through the host platform.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), RuntimeError>;
}

/// Shows transient toast messages through the host platform.
pub trait ToastHost: Send + Sync {
    fn show(&self, message: &str, duration_ms: Option<u64>) -> Result<(), RuntimeError>;
}

/// Recording URL opener; rejects obviously invalid URLs so failure paths
/// are exercisable without a platform.
#[derive(Debug, Default)]
pub struct RecordingUrlOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingUrlOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened urls poisoned").clone()
    }
}

impl UrlOpener for RecordingUrlOpener {
    fn open(&self, url: &str) -> Result<(), RuntimeError> {
        if !url.contains("://") {
            return Err(RuntimeError::OpenUrl {
                url: url.to_string(),
                message: "not an absolute URL".to_string(),
            });
        }
        self.opened.lock().expect("opened urls poisoned").push(url.to_string());
        Ok(())
    }
}

/// Recording toast host.
#[derive(Debug, Default)]
pub struct RecordingToastHost {
    shown: Mutex<Vec<String>>,
}

impl RecordingToastHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().expect("shown toasts poisoned").clone()
    }
}

impl ToastHost for RecordingToastHost {
    fn show(&self, message: &str, _duration_ms: Option<u64>) -> Result<(), RuntimeError> {
        self.shown.lock().expect("shown toasts poisoned").push(message.to_string());
        Ok(())
    }
}

/// The full collaborator bundle threaded through rendering and action
/// execution. Hosts construct one at startup and share it; there are no
/// process-wide singletons.
pub struct Services {
    pub resources: Arc<dyn Resources>,
    pub navigator: Arc<dyn Navigator>,
    pub http: Arc<dyn HttpTransport>,
    pub url_opener: Arc<dyn UrlOpener>,
    pub toast: Arc<dyn ToastHost>,
    pub evaluator: Arc<dyn ExpressionEvaluator>,
}

impl Services {
    /// Defaults suitable for tests and bare hosts: in-memory resources, a
    /// recording navigation stack, an unconfigured transport, and the
    /// path-lookup evaluator.
    pub fn bare() -> Self {
        Self {
            resources: Arc::new(InMemoryResources::new()),
            navigator: Arc::new(StackNavigator::with_root("root")),
            http: Arc::new(UnconfiguredTransport),
            url_opener: Arc::new(RecordingUrlOpener::new()),
            toast: Arc::new(RecordingToastHost::new()),
            evaluator: PathEvaluator::shared(),
        }
    }
}
