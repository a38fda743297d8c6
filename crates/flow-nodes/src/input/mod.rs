//! Input nodes
//!
//! Nodes without inputs; they are the roots of a flow.

mod random_number;

pub use random_number::RandomNumberNode;
