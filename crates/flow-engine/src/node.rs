//! Nodes, their value stores and outgoing links
//!
//! A concrete node kind implements [`Node`]. The graph wraps each one in a
//! [`NodeInstance`] that owns its identity, cached port contracts, current
//! port values and the links to downstream nodes.

use crate::descriptor::PortContract;
use crate::error::{FlowError, NodeError, Result};
use crate::types::{NodeId, PortDataType, PortId, PortValues};

/// A unit of computation
///
/// `execute` must be callable repeatedly and recompute its outputs from
/// whatever inputs are currently set; nothing is cached between calls.
pub trait Node: Send {
    /// Declared input ports; an empty contract makes the node a root
    fn inputs(&self) -> PortContract;

    /// Declared output ports
    fn outputs(&self) -> PortContract;

    /// Compute outputs from the current inputs
    fn execute(&mut self, ports: &mut NodePorts) -> std::result::Result<(), NodeError>;
}

/// Current input and output values of one node
#[derive(Debug, Clone, Default)]
pub struct NodePorts {
    inputs: PortValues,
    outputs: PortValues,
}

impl NodePorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value currently set on an input port
    pub fn input(&self, port: &str) -> Option<&serde_json::Value> {
        self.inputs.get(port)
    }

    /// Value on an input port, failing if it was never set
    pub fn require_input(&self, port: &str) -> std::result::Result<&serde_json::Value, NodeError> {
        self.inputs
            .get(port)
            .ok_or_else(|| NodeError::MissingInput(port.to_string()))
    }

    /// Required input read as an integer
    pub fn require_i64(&self, port: &str) -> std::result::Result<i64, NodeError> {
        self.require_input(port)?
            .as_i64()
            .ok_or_else(|| NodeError::InvalidInputType {
                port: port.to_string(),
                expected: PortDataType::Integer.to_string(),
            })
    }

    pub fn set_input_value(&mut self, port: impl Into<PortId>, value: serde_json::Value) {
        self.inputs.insert(port.into(), value);
    }

    /// Value last written to an output port
    pub fn output_value(&self, port: &str) -> Option<&serde_json::Value> {
        self.outputs.get(port)
    }

    pub fn set_output_value(&mut self, port: impl Into<PortId>, value: serde_json::Value) {
        self.outputs.insert(port.into(), value);
    }

    pub fn inputs(&self) -> &PortValues {
        &self.inputs
    }

    pub fn outputs(&self) -> &PortValues {
        &self.outputs
    }
}

/// Index of a node inside its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Ordered mapping from upstream output ports to downstream input ports
///
/// Mapping a source port a second time replaces its target but keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMap {
    pairs: Vec<(PortId, PortId)>,
}

impl PortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `output` on the upstream node to `input` on the downstream node
    pub fn insert(&mut self, output: impl Into<PortId>, input: impl Into<PortId>) {
        let output = output.into();
        let input = input.into();
        match self.pairs.iter_mut().find(|(from, _)| *from == output) {
            Some(pair) => pair.1 = input,
            None => self.pairs.push((output, input)),
        }
    }

    /// Builder-style `insert`
    pub fn with(mut self, output: impl Into<PortId>, input: impl Into<PortId>) -> Self {
        self.insert(output, input);
        self
    }

    /// Downstream input port for an upstream output port
    pub fn get(&self, output: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(from, _)| from == output)
            .map(|(_, to)| to.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

impl<O: Into<PortId>, I: Into<PortId>> FromIterator<(O, I)> for PortMap {
    fn from_iter<T: IntoIterator<Item = (O, I)>>(iter: T) -> Self {
        let mut map = PortMap::new();
        for (output, input) in iter {
            map.insert(output, input);
        }
        map
    }
}

/// A directed, port-mapped edge owned by the upstream node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Downstream node
    pub target: NodeIndex,
    /// Output → input pairs copied before the target runs
    pub port_map: PortMap,
}

/// A node placed in a graph
pub struct NodeInstance {
    id: NodeId,
    node: Box<dyn Node>,
    inputs: PortContract,
    outputs: PortContract,
    ports: NodePorts,
    links: Vec<Link>,
}

impl NodeInstance {
    /// Wrap a node, caching its port contracts
    pub fn new(id: impl Into<NodeId>, node: Box<dyn Node>) -> Self {
        let inputs = node.inputs();
        let outputs = node.outputs();
        Self {
            id: id.into(),
            node,
            inputs,
            outputs,
            ports: NodePorts::new(),
            links: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn inputs(&self) -> &PortContract {
        &self.inputs
    }

    pub fn outputs(&self) -> &PortContract {
        &self.outputs
    }

    /// A node with no declared inputs may be registered as a root
    pub fn is_root_eligible(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn ports(&self) -> &NodePorts {
        &self.ports
    }

    pub fn input_value(&self, port: &str) -> Option<&serde_json::Value> {
        self.ports.input(port)
    }

    pub fn output_value(&self, port: &str) -> Option<&serde_json::Value> {
        self.ports.output_value(port)
    }

    pub fn set_input_value(&mut self, port: impl Into<PortId>, value: serde_json::Value) {
        self.ports.set_input_value(port, value);
    }

    /// Record a link; links accumulate, even towards the same target
    pub(crate) fn push_link(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Run the node's computation against its current inputs
    pub fn execute(&mut self) -> Result<()> {
        log::debug!("Executing node '{}'", self.id);
        self.node
            .execute(&mut self.ports)
            .map_err(|err| FlowError::execution(self.id.clone(), err))
    }
}

impl std::fmt::Debug for NodeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInstance")
            .field("id", &self.id)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("ports", &self.ports)
            .field("links", &self.links)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Doubler;

    impl Node for Doubler {
        fn inputs(&self) -> PortContract {
            PortContract::new().required("value", PortDataType::Integer)
        }

        fn outputs(&self) -> PortContract {
            PortContract::new().optional("value", PortDataType::Integer)
        }

        fn execute(&mut self, ports: &mut NodePorts) -> std::result::Result<(), NodeError> {
            let value = ports.require_i64("value")?;
            ports.set_output_value("value", json!(value * 2));
            Ok(())
        }
    }

    #[test]
    fn test_port_map_replaces_repeated_source() {
        let map = PortMap::new()
            .with("number", "a")
            .with("other", "b")
            .with("number", "c");

        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("number", "c"), ("other", "b")]);
        assert_eq!(map.get("number"), Some("c"));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_instance_caches_contracts() {
        let instance = NodeInstance::new("double", Box::new(Doubler));
        assert_eq!(instance.id(), "double");
        assert!(instance.inputs().contains("value"));
        assert!(!instance.is_root_eligible());
        assert!(instance.output_value("value").is_none());
    }

    #[test]
    fn test_execute_is_repeatable() {
        let mut instance = NodeInstance::new("double", Box::new(Doubler));
        instance.set_input_value("value", json!(21));

        instance.execute().unwrap();
        assert_eq!(instance.output_value("value"), Some(&json!(42)));
        instance.execute().unwrap();
        assert_eq!(instance.output_value("value"), Some(&json!(42)));

        instance.set_input_value("value", json!(5));
        instance.execute().unwrap();
        assert_eq!(instance.output_value("value"), Some(&json!(10)));
    }

    #[test]
    fn test_execute_missing_input() {
        let mut instance = NodeInstance::new("double", Box::new(Doubler));
        let err = instance.execute().unwrap_err();
        match err {
            FlowError::NodeExecution { node_id, source } => {
                assert_eq!(node_id, "double");
                assert_eq!(source, NodeError::MissingInput("value".to_string()));
            }
            other => panic!("Expected NodeExecution, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_wrong_input_type() {
        let mut instance = NodeInstance::new("double", Box::new(Doubler));
        instance.set_input_value("value", json!("ten"));
        let err = instance.execute().unwrap_err();
        assert!(err.to_string().contains("expected integer"));
    }
}
