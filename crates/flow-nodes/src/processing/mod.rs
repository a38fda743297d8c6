//! Processing nodes
//!
//! Nodes that compute new values from their inputs.

mod add;

pub use add::AddNode;
