//! Flow Engine - dataflow graph execution
//!
//! Nodes declare typed, named input and output ports. A JSON definition
//! wires output ports to input ports; running the graph executes every
//! root node (a node without inputs) and pushes its outputs downstream,
//! depth-first, executing each node it reaches.
//!
//! # Architecture
//!
//! - `NodeRegistry`: resolves definition type tags to node factories
//! - `GraphBuilder`: two-pass build (instantiate, then link)
//! - `FlowGraph`: owns node instances and performs propagation
//! - `Runner`: root registry, loading and fail-fast execution
//! - `EventSink`: observes runs without coupling to a host
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flow_engine::{NodeRegistry, Runner};
//!
//! let mut runner = Runner::new(Arc::new(NodeRegistry::with_builtins()));
//! runner.load("flow.json")?;
//! runner.run()?;
//! ```

pub mod builder;
pub mod config;
pub mod definition;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod graph;
pub mod node;
pub mod registry;
pub mod runner;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::{BuiltGraph, GraphBuilder};
pub use config::RunnerConfig;
pub use definition::{ConnectionDefinition, DefinitionBuilder, GraphDefinition, NodeDefinition};
pub use descriptor::{NodeDescriptor, NodeMetadata, PortContract, PortMetadata};
pub use error::{FlowError, LoadError, NodeError, Result, StructuralError};
pub use events::{EventError, EventSink, FlowEvent, NullEventSink, VecEventSink};
pub use graph::FlowGraph;
pub use node::{Link, Node, NodeIndex, NodeInstance, NodePorts, PortMap};
pub use registry::{NodeFactory, NodeRegistration, NodeRegistry};
pub use runner::{RunReport, Runner};
pub use types::{NodeId, PortDataType, PortId, PortValues};
pub use validation::{validate_definition, validate_definition_with};
