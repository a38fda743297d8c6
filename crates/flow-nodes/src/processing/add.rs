//! Add Node
//!
//! Sums two integer inputs.

use flow_engine::{
    Node, NodeDescriptor, NodeError, NodeMetadata, NodePorts, NodeRegistration, PortContract,
    PortDataType,
};

/// Add Node
///
/// # Inputs
/// - `a` (required) - left operand
/// - `b` (required) - right operand
///
/// # Outputs
/// - `sum` - `a + b`
///
/// Reached through a single link, only one operand has been set the
/// first time the node runs; that run fails with a missing input.
#[derive(Debug, Clone, Default)]
pub struct AddNode;

impl AddNode {
    pub const PORT_A: &'static str = "a";
    pub const PORT_B: &'static str = "b";
    pub const PORT_SUM: &'static str = "sum";
}

impl NodeDescriptor for AddNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: "Add".to_string(),
            label: "Add".to_string(),
            description: "Adds two integers".to_string(),
            inputs: PortContract::new()
                .required(Self::PORT_A, PortDataType::Integer)
                .required(Self::PORT_B, PortDataType::Integer),
            outputs: PortContract::new().optional(Self::PORT_SUM, PortDataType::Integer),
        }
    }
}

inventory::submit!(NodeRegistration::of::<AddNode>());

impl Node for AddNode {
    fn inputs(&self) -> PortContract {
        Self::descriptor().inputs
    }

    fn outputs(&self) -> PortContract {
        Self::descriptor().outputs
    }

    fn execute(&mut self, ports: &mut NodePorts) -> Result<(), NodeError> {
        let a = ports.require_i64(Self::PORT_A)?;
        let b = ports.require_i64(Self::PORT_B)?;
        let sum = a
            .checked_add(b)
            .ok_or_else(|| NodeError::failed(format!("{} + {} overflows", a, b)))?;
        ports.set_output_value(Self::PORT_SUM, serde_json::json!(sum));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_adds_inputs() {
        let mut node = AddNode;
        let mut ports = NodePorts::new();
        ports.set_input_value("a", json!(40));
        ports.set_input_value("b", json!(2));

        node.execute(&mut ports).unwrap();
        assert_eq!(ports.output_value("sum"), Some(&json!(42)));

        // Same inputs, same output
        node.execute(&mut ports).unwrap();
        assert_eq!(ports.output_value("sum"), Some(&json!(42)));
    }

    #[test]
    fn test_missing_operand() {
        let mut node = AddNode;
        let mut ports = NodePorts::new();
        ports.set_input_value("a", json!(1));

        let err = node.execute(&mut ports).unwrap_err();
        assert_eq!(err, NodeError::MissingInput("b".to_string()));
        assert!(ports.output_value("sum").is_none());
    }

    #[test]
    fn test_overflow() {
        let mut node = AddNode;
        let mut ports = NodePorts::new();
        ports.set_input_value("a", json!(i64::MAX));
        ports.set_input_value("b", json!(1));

        assert!(matches!(node.execute(&mut ports), Err(NodeError::Failed(_))));
    }
}
