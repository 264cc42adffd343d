//! Persistence contract for workflow records.

use async_trait::async_trait;
use thiserror::Error;

use crate::BoxedError;
use crate::record::StateRecord;

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors a persistence backend can surface.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backing store rejected the write.
    #[error("sink rejected write: {message}")]
    Rejected {
        /// Human-readable description of the rejection.
        message: String,
    },

    /// The backing store could not be reached.
    #[error("sink unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying transport or backend error, if any.
        #[source]
        source: Option<BoxedError>,
    },
}

impl SinkError {
    /// Creates a rejected error from a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates an unavailable error from a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }
}

/// A persistence sink: record in, success or failure out.
///
/// Each `store` call is an atomic unit: the implementation acquires
/// whatever connection it needs, writes, and releases on every exit path,
/// so partial writes never leak across runs. Failures must be returned,
/// never suppressed.
#[async_trait]
pub trait StateSink: Send + Sync {
    /// Stores one record.
    async fn store(&self, record: &StateRecord) -> SinkResult<()>;
}

#[async_trait]
impl<T: StateSink + ?Sized> StateSink for std::sync::Arc<T> {
    async fn store(&self, record: &StateRecord) -> SinkResult<()> {
        (**self).store(record).await
    }
}
