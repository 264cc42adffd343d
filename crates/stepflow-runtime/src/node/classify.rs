//! Classification node.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stepflow_core::BoxedError;
use stepflow_core::classify::Classifier;
use stepflow_core::record::StateRecord;

use super::Transform;
use crate::TRACING_TARGET;

/// Label normalization policy applied after a classifier call.
///
/// Whatever policy is chosen, it runs before any router sees the state:
/// the routing layer itself never clamps an unrecognized label.
#[derive(Debug, Clone, Default)]
pub enum LabelPolicy {
    /// Propagate the classifier's label unchanged beyond trimming and
    /// lowercasing. An unrecognized label then fails downstream routing.
    #[default]
    Strict,

    /// Clamp any label outside `allowed` to `fallback`.
    ///
    /// Reproduces the guard free-text models need against off-vocabulary
    /// output, as an opt-in decision visible at graph-build time.
    Clamp {
        /// Labels passed through as-is.
        allowed: Vec<String>,
        /// Label substituted for anything outside `allowed`.
        fallback: String,
    },
}

/// Errors raised by [`ClassifyNode`] before the classifier is invoked.
#[derive(Debug, Error)]
pub enum ClassifyNodeError {
    /// The configured input field is absent or not textual.
    #[error("missing text field {0:?} in state record")]
    MissingField(String),
}

/// Node that classifies one text field and writes the label to another.
///
/// The classifier is injected at construction, giving it a lifecycle
/// independent of the graph. Classifier failures surface as this node's
/// own failure; the engine does not retry them.
pub struct ClassifyNode {
    classifier: Arc<dyn Classifier>,
    input_field: String,
    output_field: String,
    policy: LabelPolicy,
}

impl ClassifyNode {
    /// Creates a node reading `input_field` and writing `output_field`,
    /// with the [`LabelPolicy::Strict`] policy.
    pub fn new(
        classifier: Arc<dyn Classifier>,
        input_field: impl Into<String>,
        output_field: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            input_field: input_field.into(),
            output_field: output_field.into(),
            policy: LabelPolicy::default(),
        }
    }

    /// Sets the label policy.
    pub fn with_policy(mut self, policy: LabelPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl Transform for ClassifyNode {
    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord, BoxedError> {
        let text = state
            .get_str(&self.input_field)
            .ok_or_else(|| ClassifyNodeError::MissingField(self.input_field.clone()))?;

        let raw = self.classifier.classify(text).await?;
        let label = raw.trim().to_lowercase();

        let label = match &self.policy {
            LabelPolicy::Strict => label,
            LabelPolicy::Clamp { allowed, fallback } => {
                if allowed.iter().any(|a| a == &label) {
                    label
                } else {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        label = %label,
                        fallback = %fallback,
                        "Clamping off-vocabulary label"
                    );
                    fallback.clone()
                }
            }
        };

        state.insert(self.output_field.clone(), label);
        Ok(state)
    }
}

impl std::fmt::Debug for ClassifyNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifyNode")
            .field("input_field", &self.input_field)
            .field("output_field", &self.output_field)
            .field("policy", &self.policy)
            .finish()
    }
}
