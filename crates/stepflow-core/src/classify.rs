//! Text classification contract.
//!
//! A classifier is the narrow functional boundary a workflow node wraps:
//! text in, label out. Concrete backends (a hosted model, a local LLM)
//! live outside this workspace; [`KeywordClassifier`] is the built-in
//! deterministic implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::BoxedError;

/// Result type for classification operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors a classification backend can surface.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The classification service could not be reached.
    #[error("classifier unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying transport or backend error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// The classification call did not complete in time.
    #[error("classifier timed out")]
    Timeout,
}

impl ClassifyError {
    /// Creates an unavailable error from a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unavailable error wrapping a backend error.
    pub fn unavailable_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// A text classifier: text in, label out.
///
/// Implementations must be stateless across calls and safe to share
/// between concurrent runs. Any fallback-for-unrecognized-output policy
/// belongs to the node wrapping the classifier, not the classifier itself.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies the given text, returning a label.
    async fn classify(&self, text: &str) -> ClassifyResult<String>;
}

#[async_trait]
impl<T: Classifier + ?Sized> Classifier for std::sync::Arc<T> {
    async fn classify(&self, text: &str) -> ClassifyResult<String> {
        (**self).classify(text).await
    }
}

/// Deterministic substring-marker classifier.
///
/// Returns the positive label when any marker occurs in the text, the
/// negative label otherwise. Useful as a dependency-free baseline and in
/// tests where a model call would be nondeterministic.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    markers: Vec<String>,
    positive: String,
    negative: String,
}

impl KeywordClassifier {
    /// Creates a classifier with the given positive markers and the
    /// default `positive`/`negative` labels.
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
            positive: "positive".into(),
            negative: "negative".into(),
        }
    }

    /// Overrides the labels returned on match and on no match.
    pub fn with_labels(mut self, positive: impl Into<String>, negative: impl Into<String>) -> Self {
        self.positive = positive.into();
        self.negative = negative.into();
        self
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> ClassifyResult<String> {
        let matched = self.markers.iter().any(|marker| text.contains(marker));
        if matched {
            Ok(self.positive.clone())
        } else {
            Ok(self.negative.clone())
        }
    }
}
