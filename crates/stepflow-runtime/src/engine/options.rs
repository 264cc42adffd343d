//! Per-run execution options.

use tokio_util::sync::CancellationToken;

/// Options for a single run or for every run of a batch.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the engine's default step budget for this run.
    pub step_budget: Option<usize>,
    /// Cancellation signal, checked before each node invocation.
    pub cancel: Option<CancellationToken>,
}

impl RunOptions {
    /// Creates empty options: engine defaults, no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step budget for this run.
    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = Some(budget);
        self
    }

    /// Sets the cancellation token for this run.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
