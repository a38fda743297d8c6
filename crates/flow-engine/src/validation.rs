//! Whole-definition validation
//!
//! `GraphBuilder` stops at the first problem. `validate_definition` checks
//! a definition without building it and reports every problem it finds,
//! including ones the builder tolerates (unknown connection targets,
//! cycles). `validate_definition_with` applies the same leniency a
//! runner with the given config would.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::RunnerConfig;
use crate::definition::{GraphDefinition, NodeDefinition};
use crate::error::StructuralError;
use crate::registry::NodeRegistry;

/// Validate a definition against a registry, with every check enabled
///
/// Returns all problems found (not just the first), in definition order.
pub fn validate_definition(
    definition: &GraphDefinition,
    registry: &NodeRegistry,
) -> Vec<StructuralError> {
    validate_definition_with(definition, registry, &RunnerConfig::strict())
}

/// Validate a definition the way a runner with `config` would load it
///
/// Unknown connection targets are only reported under `strict_targets`
/// and port checks only under `validate_ports`. Cycles are always
/// reported since running a cyclic graph never finishes.
pub fn validate_definition_with(
    definition: &GraphDefinition,
    registry: &NodeRegistry,
    config: &RunnerConfig,
) -> Vec<StructuralError> {
    let mut errors = Vec::new();

    validate_node_ids(definition, &mut errors);
    validate_node_types(definition, registry, &mut errors);
    validate_connections(definition, registry, config, &mut errors);
    detect_cycles(definition, &mut errors);

    errors
}

/// First declaration of every identifier, in definition order
fn unique_nodes(definition: &GraphDefinition) -> Vec<&NodeDefinition> {
    let mut seen = HashSet::new();
    definition
        .nodes
        .iter()
        .filter(|n| seen.insert(n.id.as_str()))
        .collect()
}

/// Check that identifiers are unique
fn validate_node_ids(definition: &GraphDefinition, errors: &mut Vec<StructuralError>) {
    let mut seen = HashSet::new();
    for node in &definition.nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(StructuralError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }
}

/// Check that all nodes have known types in the registry
fn validate_node_types(
    definition: &GraphDefinition,
    registry: &NodeRegistry,
    errors: &mut Vec<StructuralError>,
) {
    for node in &definition.nodes {
        if !registry.has_node_type(&node.node_type) {
            errors.push(StructuralError::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            });
        }
    }
}

/// Check maps, targets, port names and port types of every connection
fn validate_connections(
    definition: &GraphDefinition,
    registry: &NodeRegistry,
    config: &RunnerConfig,
    errors: &mut Vec<StructuralError>,
) {
    let types: HashMap<&str, &str> = unique_nodes(definition)
        .into_iter()
        .map(|n| (n.id.as_str(), n.node_type.as_str()))
        .collect();

    for node in &definition.nodes {
        let source_meta = registry.get_metadata(&node.node_type);

        for connection in &node.connections {
            let Some((output, input)) = connection.ports() else {
                errors.push(StructuralError::MalformedPortMap {
                    node_id: node.id.clone(),
                    map: connection.map.clone(),
                });
                continue;
            };

            let Some(target_type) = types.get(connection.node.as_str()) else {
                if config.strict_targets {
                    errors.push(StructuralError::UnknownConnectionTarget {
                        node_id: node.id.clone(),
                        target: connection.node.clone(),
                    });
                }
                continue;
            };

            if !config.validate_ports {
                continue;
            }

            let out_port = source_meta.and_then(|meta| {
                let port = meta.outputs.get(output);
                if port.is_none() {
                    errors.push(StructuralError::UnknownOutputPort {
                        node_id: node.id.clone(),
                        port: output.to_string(),
                    });
                }
                port
            });
            let in_port = registry.get_metadata(target_type).and_then(|meta| {
                let port = meta.inputs.get(input);
                if port.is_none() {
                    errors.push(StructuralError::UnknownInputPort {
                        node_id: connection.node.clone(),
                        port: input.to_string(),
                    });
                }
                port
            });

            if let (Some(out_port), Some(in_port)) = (out_port, in_port) {
                if !out_port.data_type.is_compatible_with(&in_port.data_type) {
                    errors.push(StructuralError::IncompatiblePortTypes {
                        source_node: node.id.clone(),
                        source_port: output.to_string(),
                        source_type: out_port.data_type.to_string(),
                        target_node: connection.node.clone(),
                        target_port: input.to_string(),
                        target_type: in_port.data_type.to_string(),
                    });
                }
            }
        }
    }
}

/// Detect cycles using Kahn's algorithm (topological sort)
///
/// Only the first declaration of a repeated identifier takes part, so a
/// duplicate never counts or releases edges twice.
fn detect_cycles(definition: &GraphDefinition, errors: &mut Vec<StructuralError>) {
    let nodes = unique_nodes(definition);

    let mut in_degree: HashMap<&str, usize> =
        nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    for node in &nodes {
        for connection in &node.connections {
            if let Some(deg) = in_degree.get_mut(connection.node.as_str()) {
                *deg += 1;
            }
        }
    }

    let mut queue: VecDeque<&NodeDefinition> = nodes
        .iter()
        .copied()
        .filter(|n| in_degree.get(n.id.as_str()) == Some(&0))
        .collect();
    let by_id: HashMap<&str, &NodeDefinition> =
        nodes.iter().map(|n| (n.id.as_str(), *n)).collect();

    while let Some(node) = queue.pop_front() {
        for connection in &node.connections {
            if let Some(deg) = in_degree.get_mut(connection.node.as_str()) {
                *deg -= 1;
                if *deg == 0 {
                    if let Some(target) = by_id.get(connection.node.as_str()) {
                        queue.push_back(target);
                    }
                }
            }
        }
    }

    if let Some(node) = nodes
        .iter()
        .find(|n| in_degree.get(n.id.as_str()).is_some_and(|&deg| deg > 0))
    {
        errors.push(StructuralError::CycleDetected {
            node_id: node.id.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionBuilder;
    use crate::descriptor::{NodeMetadata, PortContract};
    use crate::error::NodeError;
    use crate::node::{Node, NodePorts};
    use crate::types::PortDataType;

    struct Inert;

    impl Node for Inert {
        fn inputs(&self) -> PortContract {
            PortContract::new()
        }

        fn outputs(&self) -> PortContract {
            PortContract::new()
        }

        fn execute(&mut self, _ports: &mut NodePorts) -> Result<(), NodeError> {
            Ok(())
        }
    }

    fn make_test_registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register_fn(
            NodeMetadata {
                node_type: "Number".to_string(),
                label: "Number".to_string(),
                description: String::new(),
                inputs: PortContract::new(),
                outputs: PortContract::new().optional("number", PortDataType::Integer),
            },
            || Box::new(Inert),
        );
        registry.register_fn(
            NodeMetadata {
                node_type: "Relay".to_string(),
                label: "Relay".to_string(),
                description: String::new(),
                inputs: PortContract::new().optional("input", PortDataType::Any),
                outputs: PortContract::new().optional("number", PortDataType::Any),
            },
            || Box::new(Inert),
        );
        registry.register_fn(
            NodeMetadata {
                node_type: "Text".to_string(),
                label: "Text".to_string(),
                description: String::new(),
                inputs: PortContract::new(),
                outputs: PortContract::new().optional("text", PortDataType::String),
            },
            || Box::new(Inert),
        );
        registry.register_fn(
            NodeMetadata {
                node_type: "Double".to_string(),
                label: "Double".to_string(),
                description: String::new(),
                inputs: PortContract::new().required("input", PortDataType::Integer),
                outputs: PortContract::new().optional("number", PortDataType::Integer),
            },
            || Box::new(Inert),
        );
        registry
    }

    #[test]
    fn test_valid_definition() {
        let definition = DefinitionBuilder::new()
            .add_node("a", "Number")
            .add_node("b", "Relay")
            .connect("a", "b", "number", "input")
            .build();

        let errors = validate_definition(&definition, &make_test_registry());
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_detect_cycle() {
        let definition = DefinitionBuilder::new()
            .add_node("a", "Relay")
            .add_node("b", "Relay")
            .connect("a", "b", "number", "input")
            .connect("b", "a", "number", "input")
            .build();

        let errors = validate_definition(&definition, &make_test_registry());
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::CycleDetected { .. })));
    }

    #[test]
    fn test_no_cycle_in_diamond() {
        let definition = DefinitionBuilder::new()
            .add_node("a", "Number")
            .add_node("b", "Relay")
            .add_node("c", "Relay")
            .add_node("d", "Relay")
            .connect("a", "b", "number", "input")
            .connect("a", "c", "number", "input")
            .connect("b", "d", "number", "input")
            .connect("c", "d", "number", "input")
            .build();

        let errors = validate_definition(&definition, &make_test_registry());
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_unknown_target_and_ports() {
        let definition = DefinitionBuilder::new()
            .add_node("a", "Number")
            .add_node("b", "Relay")
            .connect("a", "ghost", "number", "input")
            .connect("a", "b", "digits", "nothing")
            .build();

        let errors = validate_definition(&definition, &make_test_registry());
        assert_eq!(errors.len(), 3, "got: {:?}", errors);
        assert!(matches!(errors[0], StructuralError::UnknownConnectionTarget { .. }));
        assert!(matches!(errors[1], StructuralError::UnknownOutputPort { .. }));
        assert!(matches!(errors[2], StructuralError::UnknownInputPort { .. }));
    }

    #[test]
    fn test_collects_multiple_errors() {
        let mut definition = DefinitionBuilder::new()
            .add_node("a", "Mystery")
            .add_node("a", "Number")
            .build();
        definition.nodes[1].connections.push(crate::definition::ConnectionDefinition {
            node: "a".to_string(),
            map: "broken".to_string(),
        });

        let errors = validate_definition(&definition, &make_test_registry());
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::DuplicateNodeId { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::UnknownNodeType { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::MalformedPortMap { .. })));
    }

    #[test]
    fn test_duplicate_id_with_connections() {
        let mut definition = DefinitionBuilder::new()
            .add_node("a", "Number")
            .add_node("a", "Number")
            .add_node("b", "Relay")
            .build();
        definition.nodes[0].connections.push(crate::definition::ConnectionDefinition {
            node: "b".to_string(),
            map: "number:input".to_string(),
        });

        let errors = validate_definition(&definition, &make_test_registry());
        assert_eq!(
            errors,
            vec![StructuralError::DuplicateNodeId {
                node_id: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_ids_both_connected() {
        let mut definition = DefinitionBuilder::new()
            .add_node("a", "Number")
            .add_node("a", "Number")
            .add_node("b", "Relay")
            .connect("a", "b", "number", "input")
            .build();
        definition.nodes[1].connections = definition.nodes[0].connections.clone();

        let errors = validate_definition(&definition, &make_test_registry());
        assert!(errors
            .iter()
            .any(|e| matches!(e, StructuralError::DuplicateNodeId { .. })));
        assert!(!errors
            .iter()
            .any(|e| matches!(e, StructuralError::CycleDetected { .. })));
    }

    #[test]
    fn test_incompatible_port_types() {
        let definition = DefinitionBuilder::new()
            .add_node("t", "Text")
            .add_node("d", "Double")
            .connect("t", "d", "text", "input")
            .build();

        let errors = validate_definition(&definition, &make_test_registry());
        assert_eq!(errors.len(), 1, "got: {:?}", errors);
        match &errors[0] {
            StructuralError::IncompatiblePortTypes {
                source_node,
                source_type,
                target_node,
                target_type,
                ..
            } => {
                assert_eq!(source_node, "t");
                assert_eq!(source_type, "string");
                assert_eq!(target_node, "d");
                assert_eq!(target_type, "integer");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_lenient_config_matches_builder() {
        let definition = DefinitionBuilder::new()
            .add_node("t", "Text")
            .add_node("d", "Double")
            .connect("t", "ghost", "text", "input")
            .connect("t", "d", "text", "input")
            .build();
        let registry = make_test_registry();

        let errors = validate_definition_with(&definition, &registry, &RunnerConfig::default());
        assert_eq!(errors.len(), 1, "got: {:?}", errors);
        assert!(matches!(errors[0], StructuralError::IncompatiblePortTypes { .. }));

        let config = RunnerConfig {
            validate_ports: false,
            ..RunnerConfig::default()
        };
        assert!(validate_definition_with(&definition, &registry, &config).is_empty());
    }
}
