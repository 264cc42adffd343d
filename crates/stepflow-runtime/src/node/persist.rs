//! Persistence node.

use std::sync::Arc;

use async_trait::async_trait;

use stepflow_core::BoxedError;
use stepflow_core::record::StateRecord;
use stepflow_core::sink::StateSink;

use super::Transform;
use crate::TRACING_TARGET;

/// Node that stores the whole current record in a [`StateSink`].
///
/// The state passes through unchanged. Sink failures surface as this
/// node's own failure and are never suppressed.
pub struct SinkNode {
    sink: Arc<dyn StateSink>,
}

impl SinkNode {
    /// Creates a node writing to the given sink.
    pub fn new(sink: Arc<dyn StateSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Transform for SinkNode {
    async fn apply(&self, state: StateRecord) -> Result<StateRecord, BoxedError> {
        self.sink.store(&state).await?;

        tracing::trace!(
            target: TRACING_TARGET,
            fields = state.len(),
            "Record stored"
        );

        Ok(state)
    }
}

impl std::fmt::Debug for SinkNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkNode").finish_non_exhaustive()
    }
}
