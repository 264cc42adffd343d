//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use stepflow_runtime::prelude::*;
//! ```

pub use crate::definition::{
    ConditionalEdges, GraphDefinition, GraphMetadata, NodeName, TERMINAL, Target,
};
pub use crate::engine::{
    BatchOutcome, Engine, EngineConfig, RunId, RunOptions, RunOutcome, RunReport,
};
pub use crate::error::{RunError, RunErrorKind, RunFailure, ValidationError};
pub use crate::graph::CompiledGraph;
pub use crate::manifest::{GraphManifest, RoutingManifest};
pub use crate::node::{
    ClassifyNode, LabelPolicy, Router, SinkNode, Transform, router_fn, transform_fn,
};
