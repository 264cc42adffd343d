//! Graph compiler: validates a definition and freezes it for execution.
//!
//! # Compilation process
//!
//! 1. **Shape extraction**: reject ambiguous routing while deriving the
//!    definition's declarative shape
//! 2. **Validation**: entry point, edge sources and targets, dead ends,
//!    reachability — each a distinct [`ValidationError`] kind
//! 3. **Graph building**: resolve every routing target to a graph index
//!    and build the petgraph structure
//!
//! Validation is deterministic: definitions iterate in name order, so the
//! same malformed definition always reports the same error. Cycles are
//! legal and never checked here; the step budget bounds them at run time.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::definition::{GraphDefinition, NodeName, Target};
use crate::error::ValidationError;
use crate::graph::{CompiledGraph, CompiledNode, CompiledRouting, EdgeData, Successor};
use crate::manifest::GraphManifest;

/// Compiles a definition into an executable graph.
pub(crate) fn compile(def: GraphDefinition) -> Result<CompiledGraph, ValidationError> {
    let manifest = def.manifest()?;
    validate_shape(&manifest)?;

    let GraphDefinition {
        entry_point,
        nodes,
        edges,
        conditional,
        metadata,
    } = def;

    // Indices are assigned in insertion order, so they can be computed
    // up front and used while resolving routing targets.
    let node_indices: HashMap<NodeName, NodeIndex> = nodes
        .keys()
        .enumerate()
        .map(|(i, name)| (name.clone(), NodeIndex::new(i)))
        .collect();

    let resolve = |target: &Target| -> Successor {
        match target {
            // Validated above, so the lookup cannot miss.
            Target::Node(name) => Successor::Node(node_indices[name]),
            Target::Terminal => Successor::Terminal,
        }
    };

    let mut edges = edges;
    let mut conditional = conditional;
    let mut graph = DiGraph::with_capacity(nodes.len(), nodes.len());

    for (name, transform) in nodes {
        let routing = if let Some(target) = edges.remove(&name) {
            CompiledRouting::Direct(resolve(&target))
        } else if let Some(cond) = conditional.remove(&name) {
            let (router, dispatch) = cond.into_parts();
            CompiledRouting::Conditional {
                router,
                dispatch: dispatch
                    .iter()
                    .map(|(label, target)| (label.clone(), resolve(target)))
                    .collect(),
            }
        } else {
            // Ruled out by the MissingEdges check.
            return Err(ValidationError::MissingEdges(name));
        };

        graph.add_node(CompiledNode {
            name,
            transform,
            routing,
        });
    }

    for idx in graph.node_indices().collect::<Vec<_>>() {
        let targets: Vec<(Option<String>, Successor)> = match &graph[idx].routing {
            CompiledRouting::Direct(successor) => vec![(None, *successor)],
            CompiledRouting::Conditional { dispatch, .. } => dispatch
                .iter()
                .map(|(label, successor)| (Some(label.clone()), *successor))
                .collect(),
        };
        for (label, successor) in targets {
            if let Successor::Node(to) = successor {
                graph.add_edge(idx, to, EdgeData { label });
            }
        }
    }

    let entry = node_indices[&entry_point];

    Ok(CompiledGraph::new(graph, node_indices, entry, metadata))
}

/// Validates the structural rules shared by definitions and manifests.
pub(crate) fn validate_shape(manifest: &GraphManifest) -> Result<(), ValidationError> {
    let registered: HashSet<&NodeName> = manifest.nodes.iter().collect();

    if !registered.contains(&manifest.entry_point) {
        return Err(ValidationError::UnknownEntryPoint(
            manifest.entry_point.clone(),
        ));
    }

    for (from, routing) in &manifest.routing {
        if !registered.contains(from) {
            return Err(ValidationError::UnknownEdgeSource(from.clone()));
        }
        for target in routing.targets() {
            if let Target::Node(name) = target {
                if !registered.contains(name) {
                    return Err(ValidationError::DanglingEdgeTarget {
                        from: from.clone(),
                        target: name.clone(),
                    });
                }
            }
        }
    }

    for name in &manifest.nodes {
        if !manifest.routing.contains_key(name) {
            return Err(ValidationError::MissingEdges(name.clone()));
        }
    }

    reachability(manifest)
}

/// Checks that every registered node is reachable from the entry point.
fn reachability(manifest: &GraphManifest) -> Result<(), ValidationError> {
    let mut shape = DiGraph::<(), ()>::new();
    let mut indices: BTreeMap<&NodeName, NodeIndex> = BTreeMap::new();
    for name in &manifest.nodes {
        indices.insert(name, shape.add_node(()));
    }
    for (from, routing) in &manifest.routing {
        for target in routing.targets() {
            if let Target::Node(name) = target {
                shape.add_edge(indices[from], indices[name], ());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut dfs = Dfs::new(&shape, indices[&manifest.entry_point]);
    while let Some(idx) = dfs.next(&shape) {
        visited.insert(idx);
    }

    for name in &manifest.nodes {
        if !visited.contains(&indices[name]) {
            return Err(ValidationError::UnreachableNode(name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TERMINAL;
    use crate::node::{Transform, router_fn, transform_fn};

    fn passthrough() -> impl Transform {
        transform_fn(|state| Ok(state))
    }

    fn linear_definition() -> GraphDefinition {
        let mut def = GraphDefinition::new("first");
        def.add_node("first", passthrough());
        def.add_node("second", passthrough());
        def.add_edge("first", "second");
        def.add_edge("second", TERMINAL);
        def
    }

    #[test]
    fn test_compile_linear_graph() {
        let graph = linear_definition().compile().unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.entry_point().as_str(), "first");
    }

    #[test]
    fn test_compile_rejects_unknown_entry_point() {
        let mut def = GraphDefinition::new("missing");
        def.add_node("only", passthrough());
        def.add_edge("only", TERMINAL);

        assert_eq!(
            def.compile().unwrap_err(),
            ValidationError::UnknownEntryPoint("missing".into())
        );
    }

    #[test]
    fn test_compile_rejects_dangling_edge_target() {
        let mut def = linear_definition();
        def.add_edge("second", "ghost");

        assert_eq!(
            def.compile().unwrap_err(),
            ValidationError::DanglingEdgeTarget {
                from: "second".into(),
                target: "ghost".into(),
            }
        );
    }

    #[test]
    fn test_compile_rejects_dangling_dispatch_target() {
        let mut def = GraphDefinition::new("route");
        def.add_node("route", passthrough());
        def.add_conditional_edges(
            "route",
            router_fn(|_| "left".to_string()),
            [("left", "ghost")],
        );

        assert_eq!(
            def.compile().unwrap_err(),
            ValidationError::DanglingEdgeTarget {
                from: "route".into(),
                target: "ghost".into(),
            }
        );
    }

    #[test]
    fn test_compile_rejects_edge_from_unknown_node() {
        let mut def = linear_definition();
        def.add_edge("ghost", TERMINAL);

        assert_eq!(
            def.compile().unwrap_err(),
            ValidationError::UnknownEdgeSource("ghost".into())
        );
    }

    #[test]
    fn test_compile_rejects_ambiguous_routing() {
        let mut def = linear_definition();
        def.add_conditional_edges(
            "second",
            router_fn(|_| "x".to_string()),
            [("x", TERMINAL)],
        );

        assert_eq!(
            def.compile().unwrap_err(),
            ValidationError::AmbiguousEdges("second".into())
        );
    }

    #[test]
    fn test_compile_rejects_dead_end_node() {
        let mut def = linear_definition();
        def.add_node("third", passthrough());
        def.add_edge("second", "third");

        assert_eq!(
            def.compile().unwrap_err(),
            ValidationError::MissingEdges("third".into())
        );
    }

    #[test]
    fn test_compile_rejects_unreachable_node() {
        let mut def = linear_definition();
        def.add_node("island", passthrough());
        def.add_edge("island", TERMINAL);

        assert_eq!(
            def.compile().unwrap_err(),
            ValidationError::UnreachableNode("island".into())
        );
    }

    #[test]
    fn test_compile_accepts_cycles() {
        let mut def = GraphDefinition::new("loop");
        def.add_node("loop", passthrough());
        def.add_conditional_edges(
            "loop",
            router_fn(|_| "again".to_string()),
            [("again", Target::from("loop")), ("done", TERMINAL)],
        );

        let graph = def.compile().unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_compiled_graph_successors() {
        let mut def = GraphDefinition::new("route");
        def.add_node("route", passthrough());
        def.add_node("left", passthrough());
        def.add_node("right", passthrough());
        def.add_conditional_edges(
            "route",
            router_fn(|_| "a".to_string()),
            [("a", "left"), ("b", "right")],
        );
        def.add_edge("left", TERMINAL);
        def.add_edge("right", TERMINAL);
        let graph = def.compile().unwrap();

        let left = NodeName::from("left");
        let right = NodeName::from("right");
        let successors = graph.successors(&"route".into());
        assert_eq!(successors, vec![(Some("a"), &left), (Some("b"), &right)]);
        // Terminal edges are not graph edges.
        assert!(graph.successors(&left).is_empty());
    }

    #[test]
    fn test_compiled_manifest_matches_definition_manifest() {
        let def = linear_definition();
        let expected = def.manifest().unwrap();

        let graph = def.compile().unwrap();
        assert_eq!(graph.manifest(), expected);
    }
}
