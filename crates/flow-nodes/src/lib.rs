//! Flow Nodes
//!
//! Built-in node implementations for the flow engine. Every node type
//! registers itself at link time, so `NodeRegistry::with_builtins()` sees
//! all of them as long as this crate is linked.
//!
//! # Categories
//!
//! - **Input**: Nodes that produce values without inputs (roots)
//! - **Processing**: Nodes that transform values
//! - **Output**: Nodes that report values to the host

pub mod input;
pub mod output;
pub mod processing;

// Re-export all nodes for convenience
pub use input::*;
pub use output::*;
pub use processing::*;

use flow_engine::NodeRegistry;

/// Registry holding every built-in node type
///
/// Calling this also guarantees the crate is linked, which keeps the
/// link-time registrations from being discarded.
pub fn builtin_registry() -> NodeRegistry {
    NodeRegistry::with_builtins()
}
