//! Validation and run error types.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

use stepflow_core::BoxedError;
use stepflow_core::record::StateRecord;

use crate::definition::NodeName;

/// Errors raised while compiling a graph definition.
///
/// Every variant is a compile-time failure: a definition that fails
/// validation never produces a compiled graph, partially or otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The entry point is not a registered node.
    #[error("entry point references unknown node: {0}")]
    UnknownEntryPoint(NodeName),

    /// An edge was declared from a node that was never registered.
    #[error("edge declared from unknown node: {0}")]
    UnknownEdgeSource(NodeName),

    /// An edge or dispatch entry targets a node that was never registered.
    #[error("edge from {from} targets unknown node: {target}")]
    DanglingEdgeTarget {
        /// Source node of the offending edge.
        from: NodeName,
        /// The unregistered target.
        target: NodeName,
    },

    /// A node declares both an unconditional edge and conditional edges.
    #[error("node {0} declares both an unconditional edge and conditional edges")]
    AmbiguousEdges(NodeName),

    /// A node declares no outgoing routing at all.
    #[error("node {0} has no outgoing edge")]
    MissingEdges(NodeName),

    /// A registered node cannot be reached from the entry point.
    ///
    /// Always a hard error; the validator has no permissive mode.
    #[error("node {0} is unreachable from the entry point")]
    UnreachableNode(NodeName),
}

/// Errors that terminate a single run.
#[derive(Debug, Error)]
pub enum RunError {
    /// A node's transformation (or the collaborator it wraps) failed.
    #[error("node {node} failed")]
    NodeExecution {
        /// The node whose invocation failed.
        node: NodeName,
        /// The underlying failure.
        #[source]
        source: BoxedError,
    },

    /// A router produced a label absent from its dispatch table.
    ///
    /// The engine never falls back to a default target; label clamping
    /// is an explicit node-level policy.
    #[error("node {node} routed to unknown label {label:?}")]
    UnroutableLabel {
        /// The node whose dispatch table was missing the label.
        node: NodeName,
        /// The label the router produced.
        label: String,
    },

    /// The run exceeded its step budget; likely a routing cycle.
    #[error("step budget of {budget} node invocations exceeded")]
    StepBudgetExceeded {
        /// The budget that was in effect.
        budget: usize,
    },

    /// The run was cancelled before the next node was invoked.
    #[error("run cancelled")]
    Cancelled,

    /// Internal engine error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RunError {
    /// Returns the node this error is scoped to, if any.
    pub fn node(&self) -> Option<&NodeName> {
        match self {
            Self::NodeExecution { node, .. } | Self::UnroutableLabel { node, .. } => Some(node),
            Self::StepBudgetExceeded { .. } | Self::Cancelled | Self::Internal(_) => None,
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> RunErrorKind {
        match self {
            Self::NodeExecution { .. } => RunErrorKind::NodeExecution,
            Self::UnroutableLabel { .. } => RunErrorKind::UnroutableLabel,
            Self::StepBudgetExceeded { .. } => RunErrorKind::StepBudgetExceeded,
            Self::Cancelled => RunErrorKind::Cancelled,
            Self::Internal(_) => RunErrorKind::Internal,
        }
    }
}

/// Categories of run failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RunErrorKind {
    /// A node's wrapped collaborator failed.
    NodeExecution,
    /// A router produced an undispatchable label.
    UnroutableLabel,
    /// The step budget was exhausted.
    StepBudgetExceeded,
    /// The run was cancelled.
    Cancelled,
    /// Internal engine error.
    Internal,
}

/// A failed run.
///
/// Carries the error together with the state as of the last successfully
/// completed node and the path taken up to the failure point, so callers
/// can diagnose without re-running blind.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// What terminated the run.
    pub error: RunError,
    /// State after the last node that completed successfully.
    pub state: StateRecord,
    /// Ordered names of the nodes that completed before the failure.
    pub path: Vec<NodeName>,
}
