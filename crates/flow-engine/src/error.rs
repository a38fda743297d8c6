//! Error types for the flow engine

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using FlowError
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur while loading, building or running a flow
#[derive(Debug, Error)]
pub enum FlowError {
    /// The definition source could not be read or parsed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The definition does not describe a valid graph
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A node with declared inputs was offered as a root
    #[error("Cannot add root node '{node_id}': it requires input")]
    InvalidRoot { node_id: String },

    /// A node index does not belong to the runner's graph
    #[error("No node at index {index}")]
    UnknownNode { index: usize },

    /// A node could not execute
    #[error("Node '{node_id}' failed: {source}")]
    NodeExecution {
        node_id: String,
        #[source]
        source: NodeError,
    },
}

impl FlowError {
    /// Attach a node identity to a node-local failure
    pub fn execution(node_id: impl Into<String>, source: NodeError) -> Self {
        Self::NodeExecution {
            node_id: node_id.into(),
            source,
        }
    }
}

/// Failure raised by a node's own `execute`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    /// A required input has no value
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// An input holds a value of the wrong type
    #[error("Invalid input type for '{port}': expected {expected}")]
    InvalidInputType { port: String, expected: String },

    /// An upstream output port was mapped but never written
    #[error("Output '{0}' was not produced")]
    MissingOutput(String),

    /// Any other node-specific failure
    #[error("Execution failed: {0}")]
    Failed(String),
}

impl NodeError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Failure to turn a source into a structured definition
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be read
    #[error("Cannot open {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source is not a valid definition document
    #[error("Invalid JSON definition: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A definition that parses but cannot be built into a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The document is valid JSON but not a definition
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// No factory is registered for the type tag
    #[error("Unknown node type '{node_type}' for node '{node_id}'")]
    UnknownNodeType { node_id: String, node_type: String },

    /// Two descriptors share an identifier
    #[error("Duplicate node id '{node_id}'")]
    DuplicateNodeId { node_id: String },

    /// A connection map is not of the form `source:target`
    #[error("Malformed port map '{map}' on node '{node_id}'")]
    MalformedPortMap { node_id: String, map: String },

    /// A link maps an output port the source does not declare
    #[error("Node '{node_id}' has no output port '{port}'")]
    UnknownOutputPort { node_id: String, port: String },

    /// A link maps an input port the target does not declare
    #[error("Node '{node_id}' has no input port '{port}'")]
    UnknownInputPort { node_id: String, port: String },

    /// A link joins ports whose data types cannot connect
    #[error("Port '{source_node}.{source_port}' ({source_type}) cannot feed '{target_node}.{target_port}' ({target_type})")]
    IncompatiblePortTypes {
        source_node: String,
        source_port: String,
        source_type: String,
        target_node: String,
        target_port: String,
        target_type: String,
    },

    /// A connection names a node that does not exist (strict mode only)
    #[error("Node '{node_id}' connects to unknown node '{target}'")]
    UnknownConnectionTarget { node_id: String, target: String },

    /// The link graph contains a cycle (cycle detection only)
    #[error("Cycle detected through node '{node_id}'")]
    CycleDetected { node_id: String },
}
