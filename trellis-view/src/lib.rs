//! Trellis View - the virtual widget tree.
//!
//! Converts parsed widget descriptors into a tree of polymorphic virtual
//! widgets and interprets that tree, one render pass at a time, into a
//! [`ViewNode`] description the host view system draws. The registry maps
//! namespaced type strings to builder functions; the render payload threads
//! scope, services, and the hierarchy trace down the tree.

mod common;
mod error;
mod layout;
mod output;
mod page;
mod payload;
mod registry;
mod widget;
pub mod widgets;

pub use common::*;
pub use error::*;
pub use layout::*;
pub use output::*;
pub use page::*;
pub use payload::*;
pub use registry::*;
pub use widget::*;
