//! Compiled workflow graph.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::definition::{GraphMetadata, NodeName, Target};
use crate::manifest::{GraphManifest, RoutingManifest};
use crate::node::{Router, Transform};

/// A validated, immutable workflow graph ready for execution.
///
/// This is the runtime representation of a definition after compilation:
/// every routing target is resolved to a graph index, so the run loop
/// never re-resolves names. The graph is read-only and safe to share
/// across concurrent runs.
pub struct CompiledGraph {
    /// The underlying directed graph.
    graph: DiGraph<CompiledNode, EdgeData>,
    /// Map from node names to graph indices.
    node_indices: HashMap<NodeName, NodeIndex>,
    /// Entry point index.
    entry: NodeIndex,
    /// Graph metadata.
    metadata: GraphMetadata,
}

impl CompiledGraph {
    /// Creates a compiled graph. Callers must have validated that
    /// `entry` and every successor index exist in `graph`.
    pub(crate) fn new(
        graph: DiGraph<CompiledNode, EdgeData>,
        node_indices: HashMap<NodeName, NodeIndex>,
        entry: NodeIndex,
        metadata: GraphMetadata,
    ) -> Self {
        Self {
            graph,
            node_indices,
            entry,
            metadata,
        }
    }

    /// Returns the graph metadata.
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Returns the entry point name.
    pub fn entry_point(&self) -> &NodeName {
        &self.graph[self.entry].name
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges, counting each dispatch entry once.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, name: &NodeName) -> bool {
        self.node_indices.contains_key(name)
    }

    /// Returns an iterator over node names, in name order.
    pub fn node_names(&self) -> impl Iterator<Item = &NodeName> {
        let mut names: Vec<&NodeName> = self.node_indices.keys().collect();
        names.sort();
        names.into_iter()
    }

    /// Returns a node's successors as `(dispatch label, target name)`
    /// pairs, in label order.
    ///
    /// Unconditional edges carry no label. Edges to the terminal
    /// sentinel are not part of the underlying graph and do not appear
    /// here.
    pub fn successors(&self, name: &NodeName) -> Vec<(Option<&str>, &NodeName)> {
        let Some(&index) = self.node_indices.get(name) else {
            return Vec::new();
        };
        let mut successors: Vec<(Option<&str>, &NodeName)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (edge.weight().label.as_deref(), &self.graph[edge.target()].name))
            .collect();
        successors.sort();
        successors
    }

    /// Returns the serializable shape of this graph.
    pub fn manifest(&self) -> GraphManifest {
        let mut routing = BTreeMap::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            routing.insert(node.name.clone(), match &node.routing {
                CompiledRouting::Direct(successor) => RoutingManifest::Direct {
                    target: self.successor_target(*successor),
                },
                CompiledRouting::Conditional { dispatch, .. } => RoutingManifest::Conditional {
                    dispatch: dispatch
                        .iter()
                        .map(|(label, successor)| {
                            (label.clone(), self.successor_target(*successor))
                        })
                        .collect(),
                },
            });
        }

        GraphManifest {
            entry_point: self.entry_point().clone(),
            nodes: self.node_names().cloned().collect(),
            routing,
            metadata: self.metadata.clone(),
        }
    }

    /// Returns the entry point index.
    pub(crate) fn entry_index(&self) -> NodeIndex {
        self.entry
    }

    /// Returns the node at a graph index.
    pub(crate) fn node(&self, index: NodeIndex) -> &CompiledNode {
        &self.graph[index]
    }

    fn successor_target(&self, successor: Successor) -> Target {
        match successor {
            Successor::Node(idx) => Target::Node(self.graph[idx].name.clone()),
            Successor::Terminal => Target::Terminal,
        }
    }
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("entry_point", self.entry_point())
            .field("node_count", &self.graph.node_count())
            .field("edge_count", &self.graph.edge_count())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// A node with its routing resolved to graph indices.
pub(crate) struct CompiledNode {
    /// The node's unique name.
    pub(crate) name: NodeName,
    /// The node's transformation.
    pub(crate) transform: Arc<dyn Transform>,
    /// Outgoing routing.
    pub(crate) routing: CompiledRouting,
}

/// Resolved outgoing routing of a compiled node.
pub(crate) enum CompiledRouting {
    /// Unconditional successor.
    Direct(Successor),
    /// Router plus resolved dispatch table.
    Conditional {
        router: Arc<dyn Router>,
        dispatch: BTreeMap<String, Successor>,
    },
}

/// A resolved routing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Successor {
    /// Continue with the node at this index.
    Node(NodeIndex),
    /// Finish the run.
    Terminal,
}

/// Data stored on edges of the underlying graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EdgeData {
    /// Dispatch label for conditional edges, `None` for unconditional
    /// ones.
    pub(crate) label: Option<String>,
}
