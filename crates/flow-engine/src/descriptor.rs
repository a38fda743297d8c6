//! Node descriptor trait and port contract types
//!
//! A node type describes itself through `NodeDescriptor`: its type tag,
//! label and the port contracts for its inputs and outputs. The same
//! metadata drives root eligibility, link validation and node listings.

use serde::{Deserialize, Serialize};

use crate::types::{PortDataType, PortId};

/// Trait for node types that can describe their metadata
///
/// # Example
///
/// ```ignore
/// use flow_engine::{NodeDescriptor, NodeMetadata, PortContract, PortDataType};
///
/// impl NodeDescriptor for DoubleNode {
///     fn descriptor() -> NodeMetadata {
///         NodeMetadata {
///             node_type: "Double".to_string(),
///             label: "Double".to_string(),
///             description: "Multiplies its input by two".to_string(),
///             inputs: PortContract::new().required("value", PortDataType::Integer),
///             outputs: PortContract::new().optional("value", PortDataType::Integer),
///         }
///     }
/// }
/// ```
pub trait NodeDescriptor {
    /// Get the static metadata for this node type
    fn descriptor() -> NodeMetadata
    where
        Self: Sized;
}

/// Complete metadata for a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Type tag used in definitions (e.g., "RandomNumber")
    pub node_type: String,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
    /// Declared input ports
    pub inputs: PortContract,
    /// Declared output ports
    pub outputs: PortContract,
}

impl NodeMetadata {
    /// Whether nodes of this type may be registered as roots
    pub fn is_root_eligible(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Metadata for a single port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMetadata {
    /// Port name (used in port maps)
    pub id: PortId,
    /// Data type
    pub data_type: PortDataType,
    /// Whether execution needs a value on this port
    pub required: bool,
}

impl PortMetadata {
    /// Create a required port
    pub fn required(id: impl Into<String>, data_type: PortDataType) -> Self {
        Self {
            id: id.into(),
            data_type,
            required: true,
        }
    }

    /// Create an optional port
    pub fn optional(id: impl Into<String>, data_type: PortDataType) -> Self {
        Self {
            id: id.into(),
            data_type,
            required: false,
        }
    }
}

/// The named, typed ports on one side of a node
///
/// Port names are unique: declaring a name twice replaces the earlier
/// declaration in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortContract {
    ports: Vec<PortMetadata>,
}

impl PortContract {
    /// Create an empty contract
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required port
    pub fn required(self, id: impl Into<String>, data_type: PortDataType) -> Self {
        self.with(PortMetadata::required(id, data_type))
    }

    /// Add an optional port
    pub fn optional(self, id: impl Into<String>, data_type: PortDataType) -> Self {
        self.with(PortMetadata::optional(id, data_type))
    }

    /// Add or replace a port
    pub fn with(mut self, port: PortMetadata) -> Self {
        match self.ports.iter_mut().find(|p| p.id == port.id) {
            Some(existing) => *existing = port,
            None => self.ports.push(port),
        }
        self
    }

    /// Look up a port by name
    pub fn get(&self, id: &str) -> Option<&PortMetadata> {
        self.ports.iter().find(|p| p.id == id)
    }

    /// Check whether a port is declared
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Whether no ports are declared
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Iterate ports in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &PortMetadata> {
        self.ports.iter()
    }

    /// Names of the ports that must hold a value before execution
    pub fn required_ports(&self) -> impl Iterator<Item = &str> {
        self.ports.iter().filter(|p| p.required).map(|p| p.id.as_str())
    }
}
