//! Run outcome types.

use std::time::Duration;

use derive_more::{Debug, Display, From, Into};
use uuid::Uuid;

use stepflow_core::record::StateRecord;

use crate::definition::NodeName;
use crate::error::RunFailure;

/// Unique identifier for a single run, used for log correlation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

/// A successfully completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier of this run.
    pub run_id: RunId,
    /// Final state after the last node before the terminal sentinel.
    pub state: StateRecord,
    /// Exact ordered sequence of node names visited.
    pub path: Vec<NodeName>,
    /// Number of node invocations.
    pub steps: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Outcome of one run: a report on success, a failure with the state at
/// the failure point otherwise.
pub type RunOutcome = Result<RunReport, RunFailure>;

/// Outcome of one input in a batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The initial state this outcome belongs to.
    pub input: StateRecord,
    /// Success report or failure for this input.
    pub outcome: RunOutcome,
}

impl BatchOutcome {
    /// Returns whether this input's run succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
