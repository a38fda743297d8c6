//! Random Number Node
//!
//! Emits a uniformly distributed integer each time it executes.

use flow_engine::{
    Node, NodeDescriptor, NodeError, NodeMetadata, NodePorts, NodeRegistration, PortContract,
    PortDataType,
};
use rand::Rng;

/// Random Number Node
///
/// # Outputs
/// - `number` - integer in `[1, 1000]`
#[derive(Debug, Clone, Default)]
pub struct RandomNumberNode;

impl RandomNumberNode {
    /// Port ID for the generated number
    pub const PORT_NUMBER: &'static str = "number";

    /// Smallest value produced
    pub const MIN: i64 = 1;
    /// Largest value produced
    pub const MAX: i64 = 1000;
}

impl NodeDescriptor for RandomNumberNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: "RandomNumber".to_string(),
            label: "Random Number".to_string(),
            description: "Emits a random integer between 1 and 1000".to_string(),
            inputs: PortContract::new(),
            outputs: PortContract::new().optional(Self::PORT_NUMBER, PortDataType::Integer),
        }
    }
}

inventory::submit!(NodeRegistration::of::<RandomNumberNode>());

impl Node for RandomNumberNode {
    fn inputs(&self) -> PortContract {
        Self::descriptor().inputs
    }

    fn outputs(&self) -> PortContract {
        Self::descriptor().outputs
    }

    fn execute(&mut self, ports: &mut NodePorts) -> Result<(), NodeError> {
        let number = rand::thread_rng().gen_range(Self::MIN..=Self::MAX);
        log::debug!("RandomNumberNode: generated {}", number);
        ports.set_output_value(Self::PORT_NUMBER, serde_json::json!(number));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_root_eligible() {
        let node = RandomNumberNode;
        assert!(node.inputs().is_empty());
        assert!(RandomNumberNode::descriptor().is_root_eligible());
        assert_eq!(
            node.outputs().get("number").unwrap().data_type,
            PortDataType::Integer
        );
    }

    #[test]
    fn test_output_in_range() {
        let mut node = RandomNumberNode;
        let mut ports = NodePorts::new();

        for _ in 0..500 {
            node.execute(&mut ports).unwrap();
            let number = ports.output_value("number").and_then(|v| v.as_i64()).unwrap();
            assert!((1..=1000).contains(&number), "out of range: {}", number);
        }
    }
}
