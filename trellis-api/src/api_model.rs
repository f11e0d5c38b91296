//! API data-source models and the normalized HTTP exchange shapes.
//!
//! The runtime never talks to a transport directly; it resolves an
//! [`ApiModel`] into an [`ApiRequest`] and hands it to the host's transport,
//! which must return an [`ApiResponse`] on both success and failure paths so
//! flow branching is uniform regardless of failure cause.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{ExprValue, VariableDef};

/// HTTP method for an API data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A registered API data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiModel {
    pub id: String,

    /// URL template; may interpolate arguments.
    pub url: ExprValue,

    #[serde(default)]
    pub method: HttpMethod,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, ExprValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ExprValue>,

    /// Declared arguments, with defaults applied when the caller omits them.
    #[serde(default, alias = "variables", skip_serializing_if = "IndexMap::is_empty")]
    pub arg_defs: IndexMap<String, VariableDef>,
}

/// A fully resolved request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// The normalized response shape.
///
/// Transport failures populate `error` and a zero status code rather than
/// surfacing as a distinct type, so `onSuccess`/`onError` branching sees one
/// shape everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub body: Value,

    pub status_code: u16,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,

    /// The request that produced this response, for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_obj: Option<ApiRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Whether the transport reported a 2xx status and no error.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status_code)
    }

    /// Synthesize a response-shaped failure from a transport error, keeping
    /// the shape uniform for `onError` flows.
    pub fn from_transport_error(request: ApiRequest, message: impl Into<String>) -> Self {
        Self {
            body: Value::Null,
            status_code: 0,
            headers: IndexMap::new(),
            request_obj: Some(request),
            error: Some(message.into()),
        }
    }

    /// The response as a JSON value, for binding into an expression scope.
    pub fn to_value(&self) -> Value {
        json!({
            "body": self.body,
            "statusCode": self.status_code,
            "headers": self.headers,
            "error": self.error,
        })
    }
}
