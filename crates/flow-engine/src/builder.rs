//! Two-pass graph construction from a definition
//!
//! Connections may reference nodes declared later, so building happens in
//! two passes over the definition:
//!
//! 1. **Instantiate** every node through the registry and note the ones
//!    with no inputs as roots.
//! 2. **Link** each node to its targets, one link per target with all of
//!    that target's port pairs merged.
//!
//! The identifier-to-node map lives in the graph being built; nothing is
//! shared until `build` returns successfully.

use std::collections::HashSet;

use crate::config::RunnerConfig;
use crate::definition::GraphDefinition;
use crate::error::StructuralError;
use crate::graph::FlowGraph;
use crate::node::NodeIndex;
use crate::registry::NodeRegistry;

/// A fully linked graph and its roots in declaration order
#[derive(Debug)]
pub struct BuiltGraph {
    pub graph: FlowGraph,
    pub roots: Vec<NodeIndex>,
}

/// Builds graphs from definitions using a registry of node types
pub struct GraphBuilder<'a> {
    registry: &'a NodeRegistry,
    config: RunnerConfig,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder with default checks
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self {
            registry,
            config: RunnerConfig::default(),
        }
    }

    /// Use the given checks
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a graph from a definition
    pub fn build(&self, definition: &GraphDefinition) -> Result<BuiltGraph, StructuralError> {
        let mut graph = FlowGraph::new();
        let mut roots = Vec::new();
        let mut seen = HashSet::new();

        for node in &definition.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(StructuralError::DuplicateNodeId {
                    node_id: node.id.clone(),
                });
            }
            let instance = self.registry.create(&node.node_type).ok_or_else(|| {
                StructuralError::UnknownNodeType {
                    node_id: node.id.clone(),
                    node_type: node.node_type.clone(),
                }
            })?;
            let idx = graph.insert(node.id.clone(), instance);
            if graph.node(idx).is_some_and(|n| n.is_root_eligible()) {
                roots.push(idx);
            }
        }

        for node in &definition.nodes {
            let Some(from) = graph.index_of(&node.id) else {
                continue;
            };
            for (target, port_map) in node.port_maps()? {
                let Some(to) = graph.index_of(target) else {
                    if self.config.strict_targets {
                        return Err(StructuralError::UnknownConnectionTarget {
                            node_id: node.id.clone(),
                            target: target.to_string(),
                        });
                    }
                    log::warn!(
                        "Node '{}' connects to unknown node '{}'; skipping",
                        node.id,
                        target
                    );
                    continue;
                };
                if self.config.validate_ports {
                    graph.link_checked(from, to, port_map)?;
                } else {
                    graph.link(from, to, port_map);
                }
            }
        }

        if self.config.detect_cycles {
            if let Some(idx) = graph.find_cycle() {
                let node_id = graph
                    .node(idx)
                    .map(|n| n.id().to_string())
                    .unwrap_or_default();
                return Err(StructuralError::CycleDetected { node_id });
            }
        }

        log::debug!(
            "Built graph with {} node(s) and {} root(s)",
            graph.len(),
            roots.len()
        );
        Ok(BuiltGraph { graph, roots })
    }
}
