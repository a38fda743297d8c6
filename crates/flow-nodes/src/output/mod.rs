//! Output nodes
//!
//! Nodes that report values to the host.

mod print;

pub use print::PrintNode;
