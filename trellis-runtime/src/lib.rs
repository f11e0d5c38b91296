//! Trellis Runtime - evaluation and effect core for the Trellis SDUI system.
//!
//! This crate owns everything between the parsed DSL (`trellis-api`) and the
//! widget tree (`trellis-view`): chained scope contexts for expression
//! evaluation, state containers with subscriber notification, typed variable
//! resolution including controller adapters, the sequential action-flow
//! engine, and the collaborator service traits (resources, navigation, HTTP
//! transport, expression evaluation, URL/toast hosts).

pub mod actions;
mod async_controller;
mod context;
mod controllers;
mod error;
mod eval;
mod scope;
mod services;
mod state;
mod value;
mod vars;

pub use async_controller::*;
pub use context::*;
pub use controllers::*;
pub use error::*;
pub use eval::*;
pub use scope::*;
pub use services::*;
pub use state::*;
pub use value::*;
pub use vars::*;
