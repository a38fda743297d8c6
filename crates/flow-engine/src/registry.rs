//! Node type registry for resolving definition type tags
//!
//! This module maps type tag strings (e.g. `"RandomNumber"`) to node
//! metadata and a factory that creates fresh instances. The graph builder
//! resolves every descriptor through a registry; nothing is looked up by
//! reflection or global state.
//!
//! # Usage
//!
//! ```ignore
//! use flow_engine::NodeRegistry;
//!
//! let mut registry = NodeRegistry::with_builtins();
//! registry.register::<MyNode>();
//! let node = registry.create("MyNode").unwrap();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{NodeDescriptor, NodeMetadata};
use crate::node::Node;

/// Creates fresh instances of one node type
pub trait NodeFactory: Send + Sync {
    fn create(&self) -> Box<dyn Node>;
}

impl<F> NodeFactory for F
where
    F: Fn() -> Box<dyn Node> + Send + Sync,
{
    fn create(&self) -> Box<dyn Node> {
        self()
    }
}

/// Link-time registration of a built-in node type
///
/// Node crates submit one of these per type:
///
/// ```ignore
/// inventory::submit!(flow_engine::NodeRegistration::of::<RandomNumberNode>());
/// ```
pub struct NodeRegistration {
    pub descriptor: fn() -> NodeMetadata,
    pub create: fn() -> Box<dyn Node>,
}

impl NodeRegistration {
    /// Registration for a self-describing, default-constructible node
    pub const fn of<N>() -> Self
    where
        N: NodeDescriptor + Node + Default + 'static,
    {
        Self {
            descriptor: N::descriptor,
            create: create_default::<N>,
        }
    }
}

fn create_default<N: Node + Default + 'static>() -> Box<dyn Node> {
    Box::new(N::default())
}

inventory::collect!(NodeRegistration);

/// A registration entry combining metadata with its factory
#[derive(Clone)]
struct RegistryEntry {
    metadata: NodeMetadata,
    factory: Arc<dyn NodeFactory>,
}

/// Registry of node types with their metadata and factories
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = NodeRegistry::with_builtins();
/// registry.merge(plugin_registry);
/// ```
#[derive(Clone, Default)]
pub struct NodeRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every node type submitted via `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<NodeRegistration> {
            let create = registration.create;
            registry.register_factory((registration.descriptor)(), Arc::new(create));
        }
        log::debug!("Registered {} built-in node types", registry.entries.len());
        registry
    }

    /// Register a self-describing, default-constructible node type
    pub fn register<N>(&mut self)
    where
        N: NodeDescriptor + Node + Default + 'static,
    {
        self.register_factory(N::descriptor(), Arc::new(create_default::<N>));
    }

    /// Register a node type with an explicit factory
    ///
    /// A later registration for the same type tag replaces the earlier one.
    pub fn register_factory(&mut self, metadata: NodeMetadata, factory: Arc<dyn NodeFactory>) {
        self.entries.insert(
            metadata.node_type.clone(),
            RegistryEntry { metadata, factory },
        );
    }

    /// Register a node type backed by a closure
    pub fn register_fn<F>(&mut self, metadata: NodeMetadata, factory: F)
    where
        F: Fn() -> Box<dyn Node> + Send + Sync + 'static,
    {
        self.register_factory(metadata, Arc::new(factory));
    }

    /// Create a fresh node of the given type
    pub fn create(&self, node_type: &str) -> Option<Box<dyn Node>> {
        self.entries.get(node_type).map(|e| e.factory.create())
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.entries.get(node_type).map(|e| &e.metadata)
    }

    /// All registered metadata, sorted by type tag
    pub fn all_metadata(&self) -> Vec<&NodeMetadata> {
        let mut all: Vec<_> = self.entries.values().map(|e| &e.metadata).collect();
        all.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        all
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// List all registered type tags
    pub fn node_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share the same type tag.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.entries.extend(other.entries);
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types = self.node_types();
        types.sort_unstable();
        f.debug_struct("NodeRegistry").field("types", &types).finish()
    }
}
