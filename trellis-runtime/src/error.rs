//! Runtime error types.
//!
//! Configuration errors (broken documents, missing registrations, missing
//! state containers) are distinct variants and always propagate; expression
//! gaps never appear here — they resolve to null in the evaluation layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// SetState/RebuildState ran with no state container anywhere in scope.
    #[error("no state context available: the widget tree has no state container in scope")]
    NoStateContext,

    /// A named ancestor state container could not be found.
    #[error("state context not found: no ancestor context with namespace '{namespace}'")]
    StateContextNotFound { namespace: String },

    /// An action referenced a type with no registered processor.
    #[error("unknown action type '{action_type}', known types: {known:?}")]
    UnknownActionType { action_type: String, known: Vec<String> },

    /// CallRestApi referenced an unregistered API data source.
    #[error("unknown API data source '{id}'")]
    UnknownDataSource { id: String },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("failed to open url '{url}': {message}")]
    OpenUrl { url: String, message: String },

    #[error("failed to show toast: {0}")]
    Toast(String),

    /// A nested flow failed; the original error is carried as context.
    #[error("nested action flow failed: {0}")]
    NestedFlow(Box<RuntimeError>),

    #[error("{0}")]
    Other(String),
}
