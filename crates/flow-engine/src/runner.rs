//! Root registry and flow execution
//!
//! The `Runner` owns the current graph and the ordered set of root nodes.
//! `run` executes every root in registration order; each root drives the
//! depth-first propagation through everything downstream of it.

use std::path::Path;
use std::sync::Arc;

use crate::builder::GraphBuilder;
use crate::config::RunnerConfig;
use crate::definition::GraphDefinition;
use crate::error::{FlowError, LoadError, Result, StructuralError};
use crate::events::{emit, EventSink, FlowEvent, NullEventSink};
use crate::graph::FlowGraph;
use crate::node::{Node, NodeIndex, NodeInstance};
use crate::registry::NodeRegistry;
use crate::types::NodeId;

/// Outcome of one successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier attached to every event of the run
    pub execution_id: String,
    /// Total node executions, counting repeats along shared paths
    pub executed_nodes: usize,
}

/// Loads definitions and runs their roots
pub struct Runner {
    registry: Arc<NodeRegistry>,
    config: RunnerConfig,
    graph: FlowGraph,
    roots: Vec<(NodeId, NodeIndex)>,
    event_sink: Arc<dyn EventSink>,
}

impl Runner {
    /// Create a runner resolving node types through `registry`
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            config: RunnerConfig::default(),
            graph: FlowGraph::new(),
            roots: Vec::new(),
            event_sink: Arc::new(NullEventSink),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Report run progress to `sink`
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The current graph
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// The current graph, for inserting and linking nodes by hand
    ///
    /// Nodes added this way only run when reachable from a root; see
    /// [`Runner::add_root_at`].
    pub fn graph_mut(&mut self) -> &mut FlowGraph {
        &mut self.graph
    }

    /// Adopt a hand-built graph, dropping the current graph and roots
    pub fn with_graph(mut self, graph: FlowGraph) -> Self {
        self.graph = graph;
        self.roots.clear();
        self
    }

    /// Find a node of the current graph by ID
    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.graph.get(id)
    }

    /// Registered root IDs in run order
    pub fn roots(&self) -> Vec<&str> {
        self.roots.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.roots.iter().any(|(root, _)| root == id)
    }

    /// Register a node with no inputs as a root
    ///
    /// A root with the same ID is replaced in place and keeps its place in
    /// the run order. Nodes that declare inputs are refused, as is an ID
    /// already used by a non-root node; nothing changes on failure.
    pub fn add_root(&mut self, id: impl Into<NodeId>, node: Box<dyn Node>) -> Result<&NodeInstance> {
        let id = id.into();
        if !node.inputs().is_empty() {
            return Err(FlowError::InvalidRoot { node_id: id });
        }

        if let Some(&(_, idx)) = self.roots.iter().find(|(root, _)| *root == id) {
            log::debug!("Replacing root '{}'", id);
            return self
                .graph
                .replace(idx, node)
                .ok_or(FlowError::UnknownNode { index: idx.index() });
        }
        if self.graph.index_of(&id).is_some() {
            return Err(StructuralError::DuplicateNodeId { node_id: id }.into());
        }

        let idx = self.graph.insert(id.clone(), node);
        self.roots.push((id, idx));
        Ok(&self.graph[idx])
    }

    /// Register a node already in the graph as a root
    ///
    /// The node must have no inputs. Registering the same node twice keeps
    /// its first place in the run order.
    pub fn add_root_at(&mut self, idx: NodeIndex) -> Result<&NodeInstance> {
        let instance = self
            .graph
            .node(idx)
            .ok_or(FlowError::UnknownNode { index: idx.index() })?;
        if !instance.is_root_eligible() {
            return Err(FlowError::InvalidRoot {
                node_id: instance.id().to_string(),
            });
        }

        let id = instance.id().to_string();
        match self.roots.iter_mut().find(|(root, _)| *root == id) {
            Some(entry) => entry.1 = idx,
            None => self.roots.push((id, idx)),
        }
        Ok(&self.graph[idx])
    }

    /// Load a definition file, replacing the current graph and roots
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading flow definition from {}", path.display());
        self.load_str(&text)
    }

    /// Load a definition from JSON text
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let definition = GraphDefinition::from_json(text)?;
        self.load_definition(&definition)
    }

    /// Build a parsed definition and adopt it
    ///
    /// The current graph and roots are only replaced once the build has
    /// fully succeeded.
    pub fn load_definition(&mut self, definition: &GraphDefinition) -> Result<()> {
        let built = GraphBuilder::new(&self.registry)
            .with_config(self.config.clone())
            .build(definition)?;

        let roots = built
            .roots
            .into_iter()
            .map(|idx| (built.graph[idx].id().to_string(), idx))
            .collect();
        self.graph = built.graph;
        self.roots = roots;

        log::info!(
            "Loaded {} node(s), {} root(s)",
            self.graph.len(),
            self.roots.len()
        );
        Ok(())
    }

    /// Run every root in registration order
    ///
    /// The first failure aborts the remaining roots.
    pub fn run(&mut self) -> Result<RunReport> {
        let execution_id = uuid::Uuid::new_v4().to_string();
        let sink = self.event_sink.clone();

        log::info!(
            "Starting run {} with {} root(s)",
            execution_id,
            self.roots.len()
        );
        emit(
            sink.as_ref(),
            FlowEvent::RunStarted {
                execution_id: execution_id.clone(),
                roots: self.roots.iter().map(|(id, _)| id.clone()).collect(),
            },
        );

        let mut executed_nodes = 0;
        for (id, idx) in &self.roots {
            log::debug!("Running root '{}'", id);
            match self.graph.run_from(*idx, sink.as_ref(), &execution_id) {
                Ok(count) => executed_nodes += count,
                Err(err) => {
                    log::error!("Run {} failed: {}", execution_id, err);
                    emit(
                        sink.as_ref(),
                        FlowEvent::RunFailed {
                            execution_id: execution_id.clone(),
                            error: err.to_string(),
                        },
                    );
                    return Err(err);
                }
            }
        }

        log::info!(
            "Run {} completed: {} node execution(s)",
            execution_id,
            executed_nodes
        );
        emit(
            sink.as_ref(),
            FlowEvent::RunCompleted {
                execution_id: execution_id.clone(),
                executed_nodes,
            },
        );

        Ok(RunReport {
            execution_id,
            executed_nodes,
        })
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .field("roots", &self.roots)
            .field("nodes", &self.graph.len())
            .finish()
    }
}
