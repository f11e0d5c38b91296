//! View-layer error types.
//!
//! Everything here is a configuration error in the taxonomy sense: a
//! malformed document or broken integration that must surface loudly.
//! Expression gaps never reach this type.

use thiserror::Error;
use trellis_runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum ViewError {
    /// No builder registered for a node's type string. Lists the known
    /// keys so the offending document is easy to fix.
    #[error("unknown widget type '{widget_type}', known types: {known:?}")]
    UnknownWidgetType { widget_type: String, known: Vec<String> },

    /// A component reference named an id the resolver does not know.
    #[error("component not found: '{id}'")]
    ComponentNotFound { id: String },

    /// A state wrapper declared no child to wrap.
    #[error("state wrapper has no child widget")]
    EmptyStateWrapper,

    /// A builder rejected its props.
    #[error("invalid props for widget type '{widget_type}': {message}")]
    InvalidProps { widget_type: String, message: String },

    /// A widget referenced a controller variable the scope does not hold.
    #[error("no controller named '{name}' in scope")]
    MissingController { name: String },

    /// A widget's variant-specific render failed.
    #[error("widget '{ref_name}' failed to render: {message}")]
    Render { ref_name: String, message: String },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
