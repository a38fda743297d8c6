//! Declarative graph definitions
//!
//! A definition lists nodes in order; each node names its type tag and
//! its outgoing connections. Connections carry a single
//! `sourcePort:targetPort` mapping.
//!
//! ```json
//! { "nodes": [
//!     { "id": "a", "type": "RandomNumber",
//!       "connections": [ { "node": "b", "map": "number:input" } ] },
//!     { "id": "b", "type": "Print", "connections": [] }
//! ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, StructuralError};
use crate::node::PortMap;
use crate::types::NodeId;

/// A complete graph definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Nodes in declaration order
    pub nodes: Vec<NodeDefinition>,
}

/// One node of a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Identifier, unique within the definition
    pub id: NodeId,
    /// Type tag resolved through the node registry
    #[serde(rename = "type")]
    pub node_type: String,
    /// Outgoing connections
    #[serde(default)]
    pub connections: Vec<ConnectionDefinition>,
}

/// One outgoing connection of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    /// Target node identifier
    pub node: NodeId,
    /// `sourcePort:targetPort`
    pub map: String,
}

impl ConnectionDefinition {
    /// Split the map into its output and input port names
    pub fn ports(&self) -> Option<(&str, &str)> {
        let (from, to) = self.map.split_once(':')?;
        if from.is_empty() || to.is_empty() || to.contains(':') {
            return None;
        }
        Some((from, to))
    }
}

impl NodeDefinition {
    /// Connections grouped by target, in order of first appearance
    ///
    /// All pairs destined for one target merge into a single port map.
    pub fn port_maps(&self) -> Result<Vec<(&str, PortMap)>, StructuralError> {
        let mut grouped: Vec<(&str, PortMap)> = Vec::new();
        for connection in &self.connections {
            let (from, to) =
                connection
                    .ports()
                    .ok_or_else(|| StructuralError::MalformedPortMap {
                        node_id: self.id.clone(),
                        map: connection.map.clone(),
                    })?;

            match grouped.iter_mut().find(|(target, _)| *target == connection.node) {
                Some((_, map)) => map.insert(from, to),
                None => grouped.push((connection.node.as_str(), PortMap::new().with(from, to))),
            }
        }
        Ok(grouped)
    }
}

impl GraphDefinition {
    /// Parse a JSON document
    ///
    /// Text that is not JSON is a load error; JSON that does not have the
    /// shape of a definition is a structural error.
    pub fn from_json(text: &str) -> Result<Self, crate::error::FlowError> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(LoadError::Parse)?;
        Self::from_value(value).map_err(Into::into)
    }

    /// Interpret an already-parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, StructuralError> {
        serde_json::from_value(value).map_err(|e| StructuralError::InvalidDefinition(e.to_string()))
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Fluent builder for definitions
///
/// # Example
///
/// ```ignore
/// let definition = DefinitionBuilder::new()
///     .add_node("a", "RandomNumber")
///     .add_node("b", "Print")
///     .connect("a", "b", "number", "input")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct DefinitionBuilder {
    nodes: Vec<NodeDefinition>,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no connections
    pub fn add_node(mut self, id: impl Into<String>, node_type: impl Into<String>) -> Self {
        self.nodes.push(NodeDefinition {
            id: id.into(),
            node_type: node_type.into(),
            connections: Vec::new(),
        });
        self
    }

    /// Add a connection to an already-added source node
    ///
    /// Connections on an unknown source are dropped.
    pub fn connect(
        mut self,
        source: &str,
        target: impl Into<String>,
        source_port: &str,
        target_port: &str,
    ) -> Self {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == source) {
            node.connections.push(ConnectionDefinition {
                node: target.into(),
                map: format!("{}:{}", source_port, target_port),
            });
        }
        self
    }

    /// Build the definition without validation
    pub fn build(self) -> GraphDefinition {
        GraphDefinition { nodes: self.nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;

    #[test]
    fn test_parse_definition() {
        let definition = GraphDefinition::from_json(
            r#"{"nodes":[
                {"id":"a","type":"RandomNumber","connections":[{"node":"b","map":"number:input"}]},
                {"id":"b","type":"Print"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(definition.nodes.len(), 2);
        assert_eq!(definition.nodes[0].node_type, "RandomNumber");
        assert!(definition.find_node("b").unwrap().connections.is_empty());
    }

    #[test]
    fn test_invalid_json_is_load_error() {
        let err = GraphDefinition::from_json("{nodes: ").unwrap_err();
        assert!(matches!(err, FlowError::Load(LoadError::Parse(_))));
    }

    #[test]
    fn test_missing_field_is_structural_error() {
        let err = GraphDefinition::from_json(r#"{"nodes":[{"id":"a"}]}"#).unwrap_err();
        assert!(matches!(
            err,
            FlowError::Structural(StructuralError::InvalidDefinition(_))
        ));

        let err = GraphDefinition::from_json(r#"{"graph":[]}"#).unwrap_err();
        assert!(matches!(err, FlowError::Structural(_)));
    }

    #[test]
    fn test_connection_ports() {
        let ok = ConnectionDefinition {
            node: "b".to_string(),
            map: "number:input".to_string(),
        };
        assert_eq!(ok.ports(), Some(("number", "input")));

        for bad in ["number", ":input", "number:", "a:b:c", ""] {
            let conn = ConnectionDefinition {
                node: "b".to_string(),
                map: bad.to_string(),
            };
            assert_eq!(conn.ports(), None, "map {:?}", bad);
        }
    }

    #[test]
    fn test_port_maps_group_by_target() {
        let definition = DefinitionBuilder::new()
            .add_node("a", "Pair")
            .connect("a", "b", "x", "in1")
            .connect("a", "c", "x", "in")
            .connect("a", "b", "y", "in2")
            .connect("a", "b", "x", "in3")
            .build();

        let maps = definition.nodes[0].port_maps().unwrap();
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[0].0, "b");
        assert_eq!(
            maps[0].1.iter().collect::<Vec<_>>(),
            vec![("x", "in3"), ("y", "in2")]
        );
        assert_eq!(maps[1].0, "c");
    }

    #[test]
    fn test_port_maps_reject_malformed_map() {
        let mut definition = DefinitionBuilder::new().add_node("a", "Pair").build();
        definition.nodes[0].connections.push(ConnectionDefinition {
            node: "b".to_string(),
            map: "nocolon".to_string(),
        });

        let err = definition.nodes[0].port_maps().unwrap_err();
        assert_eq!(
            err,
            StructuralError::MalformedPortMap {
                node_id: "a".to_string(),
                map: "nocolon".to_string(),
            }
        );
    }

    #[test]
    fn test_round_trip_uses_type_key() {
        let definition = DefinitionBuilder::new().add_node("r", "RandomNumber").build();
        let json = serde_json::to_value(&definition).unwrap();
        assert_eq!(json["nodes"][0]["type"], "RandomNumber");
    }
}
