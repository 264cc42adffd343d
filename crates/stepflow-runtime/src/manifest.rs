//! Serializable declarative shape of a graph definition.
//!
//! A manifest carries names and routing only — never function references
//! — so it can be stored, diffed, or rendered by a frontend. No file
//! format is mandated beyond `serde`. A manifest is validated by the same
//! structural rules as compilation, so a definition that compiles always
//! produces a manifest that validates, and vice versa.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::{GraphMetadata, NodeName, Target};
use crate::error::ValidationError;

/// Serializable shape of a graph definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphManifest {
    /// Entry point name.
    pub entry_point: NodeName,
    /// Registered node names, in name order.
    pub nodes: Vec<NodeName>,
    /// Declared routing, keyed by source node.
    pub routing: BTreeMap<NodeName, RoutingManifest>,
    /// Graph metadata.
    #[serde(default)]
    pub metadata: GraphMetadata,
}

impl GraphManifest {
    /// Validates the manifest with the same structural rules as
    /// [`GraphDefinition::compile`](crate::definition::GraphDefinition::compile).
    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::engine::compiler::validate_shape(self)
    }
}

/// Declarative shape of one node's outgoing routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingManifest {
    /// Unconditional successor.
    Direct {
        /// Where the edge leads.
        target: Target,
    },
    /// Dispatch table keyed by router label.
    Conditional {
        /// Label-to-target table, in label order.
        dispatch: BTreeMap<String, Target>,
    },
}

impl RoutingManifest {
    /// Returns an iterator over every target this routing can reach.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        match self {
            RoutingManifest::Direct { target } => {
                Box::new(std::iter::once(target)) as Box<dyn Iterator<Item = &Target>>
            }
            RoutingManifest::Conditional { dispatch } => Box::new(dispatch.values()),
        }
    }
}
