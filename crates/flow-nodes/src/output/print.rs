//! Print Node
//!
//! Logs whatever arrives on its input and mirrors it on its output, so the
//! host can read the last printed value after a run.

use flow_engine::{
    Node, NodeDescriptor, NodeError, NodeMetadata, NodePorts, NodeRegistration, PortContract,
    PortDataType,
};

/// Print Node
///
/// # Inputs
/// - `input` (required) - value to print
///
/// # Outputs
/// - `value` - the printed value
#[derive(Debug, Clone, Default)]
pub struct PrintNode;

impl PrintNode {
    pub const PORT_INPUT: &'static str = "input";
    pub const PORT_VALUE: &'static str = "value";
}

impl NodeDescriptor for PrintNode {
    fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: "Print".to_string(),
            label: "Print".to_string(),
            description: "Logs its input and passes it through".to_string(),
            inputs: PortContract::new().required(Self::PORT_INPUT, PortDataType::Any),
            outputs: PortContract::new().optional(Self::PORT_VALUE, PortDataType::Any),
        }
    }
}

inventory::submit!(NodeRegistration::of::<PrintNode>());

impl Node for PrintNode {
    fn inputs(&self) -> PortContract {
        Self::descriptor().inputs
    }

    fn outputs(&self) -> PortContract {
        Self::descriptor().outputs
    }

    fn execute(&mut self, ports: &mut NodePorts) -> Result<(), NodeError> {
        let value = ports.require_input(Self::PORT_INPUT)?.clone();
        log::info!("{}", value);
        ports.set_output_value(Self::PORT_VALUE, value);
        Ok(())
    }
}
