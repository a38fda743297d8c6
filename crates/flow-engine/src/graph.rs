//! Node arena, linking and depth-first propagation
//!
//! `FlowGraph` owns every node instance; links refer to targets by
//! [`NodeIndex`]. Running a node executes it, then walks its links in
//! insertion order: each link copies the mapped output values into the
//! target's inputs and runs the target before the next link is handled.
//!
//! The walk uses an explicit stack instead of recursion, so graph depth is
//! bounded by memory rather than the call stack. Nodes reached through
//! several paths execute once per path; a cyclic link graph never finishes
//! unless cycles are rejected at build time.

use std::collections::{HashMap, VecDeque};

use crate::error::{FlowError, NodeError, Result, StructuralError};
use crate::events::{emit, EventSink, FlowEvent, NullEventSink};
use crate::node::{Link, Node, NodeIndex, NodeInstance, PortMap};
use crate::types::NodeId;

/// A set of linked node instances
#[derive(Debug, Default)]
pub struct FlowGraph {
    nodes: Vec<NodeInstance>,
    index: HashMap<NodeId, NodeIndex>,
}

impl FlowGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a node in the graph under `id`
    ///
    /// Reusing an identifier re-points the identifier at the new node; the
    /// old instance stays reachable through any links that target it.
    pub fn insert(&mut self, id: impl Into<NodeId>, node: Box<dyn Node>) -> NodeIndex {
        let instance = NodeInstance::new(id, node);
        let idx = NodeIndex(self.nodes.len());
        self.index.insert(instance.id().to_string(), idx);
        self.nodes.push(instance);
        idx
    }

    /// Swap the node at `idx` for a fresh, unlinked instance under the same ID
    ///
    /// Links that target `idx` now reach the new instance.
    pub fn replace(&mut self, idx: NodeIndex, node: Box<dyn Node>) -> Option<&NodeInstance> {
        let slot = self.nodes.get_mut(idx.0)?;
        *slot = NodeInstance::new(slot.id().to_string(), node);
        Some(slot)
    }

    /// Index of the node currently registered under `id`
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&NodeInstance> {
        self.nodes.get(idx.0)
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut NodeInstance> {
        self.nodes.get_mut(idx.0)
    }

    /// Find a node by ID
    pub fn get(&self, id: &str) -> Option<&NodeInstance> {
        self.index_of(id).and_then(|idx| self.node(idx))
    }

    /// Find a node by ID (mutable)
    pub fn get_mut(&mut self, id: &str) -> Option<&mut NodeInstance> {
        self.index_of(id).and_then(move |idx| self.node_mut(idx))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate every instance in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &NodeInstance)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    /// Check that every pair of a port map names declared, compatible ports
    pub fn check_port_map(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        port_map: &PortMap,
    ) -> std::result::Result<(), StructuralError> {
        let (Some(source), Some(target)) = (self.node(from), self.node(to)) else {
            return Ok(());
        };

        for (output, input) in port_map.iter() {
            let out_port = source.outputs().get(output).ok_or_else(|| {
                StructuralError::UnknownOutputPort {
                    node_id: source.id().to_string(),
                    port: output.to_string(),
                }
            })?;
            let in_port = target.inputs().get(input).ok_or_else(|| {
                StructuralError::UnknownInputPort {
                    node_id: target.id().to_string(),
                    port: input.to_string(),
                }
            })?;
            if !out_port.data_type.is_compatible_with(&in_port.data_type) {
                return Err(StructuralError::IncompatiblePortTypes {
                    source_node: source.id().to_string(),
                    source_port: output.to_string(),
                    source_type: out_port.data_type.to_string(),
                    target_node: target.id().to_string(),
                    target_port: input.to_string(),
                    target_type: in_port.data_type.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Record a link from `from` to `to` without checking port names
    ///
    /// Links accumulate: linking the same pair twice yields two links,
    /// and the target runs once for each.
    pub fn link(&mut self, from: NodeIndex, to: NodeIndex, port_map: PortMap) {
        if let Some(source) = self.nodes.get_mut(from.0) {
            log::debug!(
                "Linking '{}' -> #{} ({} port(s))",
                source.id(),
                to.0,
                port_map.len()
            );
            source.push_link(Link {
                target: to,
                port_map,
            });
        }
    }

    /// Record a link after checking its port map against both contracts
    pub fn link_checked(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        port_map: PortMap,
    ) -> std::result::Result<(), StructuralError> {
        self.check_port_map(from, to, &port_map)?;
        self.link(from, to, port_map);
        Ok(())
    }

    /// First node found on a cycle of links, if any
    ///
    /// Uses Kahn's algorithm; every node left with a non-zero in-degree
    /// lies on or downstream of a cycle, and the lowest index is reported.
    pub fn find_cycle(&self) -> Option<NodeIndex> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for node in &self.nodes {
            for link in node.links() {
                in_degree[link.target.0] += 1;
            }
        }

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(i, _)| i)
            .collect();

        while let Some(i) = queue.pop_front() {
            for link in self.nodes[i].links() {
                let deg = &mut in_degree[link.target.0];
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(link.target.0);
                }
            }
        }

        in_degree.iter().position(|&deg| deg > 0).map(NodeIndex)
    }

    /// Execute a single node without propagating
    pub fn execute(&mut self, idx: NodeIndex) -> Result<()> {
        match self.nodes.get_mut(idx.0) {
            Some(node) => node.execute(),
            None => Ok(()),
        }
    }

    /// Run a node and everything reachable from it
    pub fn run_node(&mut self, start: NodeIndex) -> Result<usize> {
        self.run_from(start, &NullEventSink, "")
    }

    /// Run a node and everything reachable from it, reporting to `sink`
    ///
    /// Returns the number of node executions performed.
    pub fn run_from(
        &mut self,
        start: NodeIndex,
        sink: &dyn EventSink,
        execution_id: &str,
    ) -> Result<usize> {
        if self.node(start).is_none() {
            return Ok(0);
        }
        let mut executed = 0;
        // Pending (source, link position) pairs; popped in link order.
        let mut stack: Vec<(NodeIndex, usize)> = Vec::new();

        self.execute_and_schedule(start, &mut stack, sink, execution_id)?;
        executed += 1;

        while let Some((source, position)) = stack.pop() {
            let target = self.propagate(source, position, sink, execution_id)?;
            self.execute_and_schedule(target, &mut stack, sink, execution_id)?;
            executed += 1;
        }

        Ok(executed)
    }

    fn execute_and_schedule(
        &mut self,
        idx: NodeIndex,
        stack: &mut Vec<(NodeIndex, usize)>,
        sink: &dyn EventSink,
        execution_id: &str,
    ) -> Result<()> {
        let Some(node) = self.nodes.get_mut(idx.0) else {
            return Ok(());
        };
        node.execute()?;
        emit(sink, FlowEvent::node_executed(execution_id, node.id()));

        stack.extend((0..node.links().len()).rev().map(|position| (idx, position)));
        Ok(())
    }

    /// Copy the mapped outputs of one link into its target's inputs
    fn propagate(
        &mut self,
        source: NodeIndex,
        position: usize,
        sink: &dyn EventSink,
        execution_id: &str,
    ) -> Result<NodeIndex> {
        let upstream = &self.nodes[source.0];
        let link = &upstream.links()[position];
        let target = link.target;

        let mut values = Vec::with_capacity(link.port_map.len());
        for (output, input) in link.port_map.iter() {
            let value = upstream.output_value(output).cloned().ok_or_else(|| {
                FlowError::execution(upstream.id(), NodeError::MissingOutput(output.to_string()))
            })?;
            values.push((output.to_string(), input.to_string(), value));
        }
        let source_id = upstream.id().to_string();

        let downstream = &mut self.nodes[target.0];
        for (output, input, value) in values {
            log::debug!(
                "Propagating {}.{} -> {}.{}",
                source_id,
                output,
                downstream.id(),
                input
            );
            emit(
                sink,
                FlowEvent::ValuePropagated {
                    execution_id: execution_id.to_string(),
                    source: source_id.clone(),
                    source_port: output,
                    target: downstream.id().to_string(),
                    target_port: input.clone(),
                    value: value.clone(),
                },
            );
            downstream.set_input_value(input, value);
        }

        Ok(target)
    }
}

impl std::ops::Index<NodeIndex> for FlowGraph {
    type Output = NodeInstance;

    fn index(&self, idx: NodeIndex) -> &NodeInstance {
        &self.nodes[idx.0]
    }
}
