//! Graph definition types.
//!
//! A definition is the mutable, build-time form of a workflow graph:
//! - [`GraphDefinition`]: nodes, edges, and the entry point, built
//!   incrementally
//! - [`NodeName`]: unique node identifier within one definition
//! - [`Target`] / [`TERMINAL`]: where an edge leads
//! - [`ConditionalEdges`]: a router plus its dispatch table
//! - [`GraphMetadata`]: descriptive metadata carried through compilation
//!
//! Definitions are frozen into an immutable
//! [`CompiledGraph`](crate::graph::CompiledGraph) by
//! [`GraphDefinition::compile`]; nothing validates before that point, so
//! edges may be declared ahead of the nodes they reference.

use std::collections::BTreeMap;
use std::sync::Arc;

mod metadata;
mod name;
mod routing;
mod target;

pub use metadata::GraphMetadata;
pub use name::NodeName;
pub use routing::ConditionalEdges;
pub use target::{TERMINAL, Target};

use crate::error::ValidationError;
use crate::graph::CompiledGraph;
use crate::manifest::{GraphManifest, RoutingManifest};
use crate::node::{Router, Transform};

/// A workflow graph under construction.
///
/// Nodes are registered by name; each node then declares either one
/// unconditional edge or one conditional edge set. Cycles are legal —
/// a conditional edge may route back to an earlier node — and are bounded
/// at execution time by the step budget, not at validation time.
pub struct GraphDefinition {
    pub(crate) entry_point: NodeName,
    pub(crate) nodes: BTreeMap<NodeName, Arc<dyn Transform>>,
    pub(crate) edges: BTreeMap<NodeName, Target>,
    pub(crate) conditional: BTreeMap<NodeName, ConditionalEdges>,
    pub(crate) metadata: GraphMetadata,
}

impl GraphDefinition {
    /// Creates an empty definition with the given entry point name.
    ///
    /// The entry point must be registered as a node before compilation.
    pub fn new(entry_point: impl Into<NodeName>) -> Self {
        Self {
            entry_point: entry_point.into(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            conditional: BTreeMap::new(),
            metadata: GraphMetadata::default(),
        }
    }

    /// Sets the metadata, consuming and returning the definition.
    pub fn with_metadata(mut self, metadata: GraphMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Changes the entry point.
    pub fn set_entry_point(&mut self, name: impl Into<NodeName>) -> &mut Self {
        self.entry_point = name.into();
        self
    }

    /// Registers a node, replacing any previous node with the same name.
    pub fn add_node(
        &mut self,
        name: impl Into<NodeName>,
        transform: impl Transform + 'static,
    ) -> &mut Self {
        self.nodes.insert(name.into(), Arc::new(transform));
        self
    }

    /// Declares an unconditional edge from `from`.
    ///
    /// Replaces any previously declared unconditional edge from the same
    /// node.
    pub fn add_edge(&mut self, from: impl Into<NodeName>, to: impl Into<Target>) -> &mut Self {
        self.edges.insert(from.into(), to.into());
        self
    }

    /// Declares conditional edges from `from`: a router plus its
    /// dispatch table.
    ///
    /// Replaces any previously declared conditional edge set from the
    /// same node.
    pub fn add_conditional_edges(
        &mut self,
        from: impl Into<NodeName>,
        router: impl Router + 'static,
        dispatch: impl IntoIterator<Item = (impl Into<String>, impl Into<Target>)>,
    ) -> &mut Self {
        self.conditional.insert(
            from.into(),
            ConditionalEdges::new(Arc::new(router), dispatch),
        );
        self
    }

    /// Returns the entry point name.
    pub fn entry_point(&self) -> &NodeName {
        &self.entry_point
    }

    /// Returns the number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether a node is registered.
    pub fn contains_node(&self, name: &NodeName) -> bool {
        self.nodes.contains_key(name)
    }

    /// Returns an iterator over registered node names, in name order.
    pub fn node_names(&self) -> impl Iterator<Item = &NodeName> {
        self.nodes.keys()
    }

    /// Returns the metadata.
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Returns the serializable shape of this definition.
    ///
    /// Fails with [`ValidationError::AmbiguousEdges`] if a node declares
    /// both kinds of routing, since the manifest can express only one.
    pub fn manifest(&self) -> Result<GraphManifest, ValidationError> {
        let mut routing = BTreeMap::new();
        for (name, target) in &self.edges {
            if self.conditional.contains_key(name) {
                return Err(ValidationError::AmbiguousEdges(name.clone()));
            }
            routing.insert(name.clone(), RoutingManifest::Direct {
                target: target.clone(),
            });
        }
        for (name, edges) in &self.conditional {
            routing.insert(name.clone(), RoutingManifest::Conditional {
                dispatch: edges.dispatch().clone(),
            });
        }

        Ok(GraphManifest {
            entry_point: self.entry_point.clone(),
            nodes: self.nodes.keys().cloned().collect(),
            routing,
            metadata: self.metadata.clone(),
        })
    }

    /// Validates this definition and freezes it into an immutable,
    /// runnable graph.
    ///
    /// See [`ValidationError`] for the distinct failure kinds. Validation
    /// is deterministic and side-effect-free; a failed compile never
    /// yields a partially built graph.
    pub fn compile(self) -> Result<CompiledGraph, ValidationError> {
        crate::engine::compiler::compile(self)
    }
}

impl std::fmt::Debug for GraphDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphDefinition")
            .field("entry_point", &self.entry_point)
            .field("node_count", &self.nodes.len())
            .field("edge_count", &(self.edges.len() + self.conditional.len()))
            .finish()
    }
}
