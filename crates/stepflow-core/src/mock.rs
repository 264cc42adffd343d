//! Mock implementations of the collaborator contracts for testing.
//!
//! These mocks keep everything in memory and are deterministic, which
//! makes them suitable for unit tests in this crate and for engine tests
//! in `stepflow-runtime`.
//!
//! # Example
//!
//! ```rust
//! use stepflow_core::mock::{MockClassifier, MockSink};
//!
//! // Always returns the same label.
//! let classifier = MockClassifier::fixed("positive");
//!
//! // Records every stored record for later assertions.
//! let sink = MockSink::new();
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::classify::{Classifier, ClassifyError, ClassifyResult};
use crate::record::StateRecord;
use crate::sink::{SinkError, SinkResult, StateSink};

/// Mock classifier with scriptable behavior.
#[derive(Debug)]
pub struct MockClassifier {
    behavior: Behavior,
}

#[derive(Debug)]
enum Behavior {
    /// Always return this label.
    Fixed(String),
    /// Pop results in order; exhausting the script is an error.
    Script(Mutex<VecDeque<ClassifyResult<String>>>),
    /// Always fail as unavailable.
    Unavailable,
}

impl MockClassifier {
    /// Creates a classifier that always returns the given label.
    pub fn fixed(label: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Fixed(label.into()),
        }
    }

    /// Creates a classifier that returns the scripted results in order.
    ///
    /// Once the script is exhausted, further calls fail with
    /// [`ClassifyError::Unavailable`].
    pub fn script(results: impl IntoIterator<Item = ClassifyResult<String>>) -> Self {
        Self {
            behavior: Behavior::Script(Mutex::new(results.into_iter().collect())),
        }
    }

    /// Creates a classifier that always fails as unavailable.
    pub fn unavailable() -> Self {
        Self {
            behavior: Behavior::Unavailable,
        }
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _text: &str) -> ClassifyResult<String> {
        match &self.behavior {
            Behavior::Fixed(label) => Ok(label.clone()),
            Behavior::Script(queue) => {
                let next = queue.lock().expect("mock script lock poisoned").pop_front();
                next.unwrap_or_else(|| Err(ClassifyError::unavailable("mock script exhausted")))
            }
            Behavior::Unavailable => Err(ClassifyError::unavailable("mock classifier down")),
        }
    }
}

/// Mock sink that records every stored record in memory.
#[derive(Debug, Default)]
pub struct MockSink {
    stored: Mutex<Vec<StateRecord>>,
    failure: Option<String>,
}

impl MockSink {
    /// Creates a sink that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that fails every write as unavailable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            stored: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// Returns a copy of every record stored so far, in write order.
    pub fn stored(&self) -> Vec<StateRecord> {
        self.stored.lock().expect("mock sink lock poisoned").clone()
    }

    /// Returns the number of records stored so far.
    pub fn store_count(&self) -> usize {
        self.stored.lock().expect("mock sink lock poisoned").len()
    }
}

#[async_trait]
impl StateSink for MockSink {
    async fn store(&self, record: &StateRecord) -> SinkResult<()> {
        if let Some(message) = &self.failure {
            return Err(SinkError::unavailable(message.clone()));
        }
        self.stored
            .lock()
            .expect("mock sink lock poisoned")
            .push(record.clone());
        Ok(())
    }
}
