//! Engine configuration.

use derive_builder::Builder;

/// Configuration for the workflow execution engine.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum number of concurrent runs.
    #[builder(default = "8")]
    pub max_concurrent_runs: usize,

    /// Default maximum node invocations per run.
    ///
    /// Guards against unbounded routing cycles; overridable per run via
    /// [`RunOptions`](super::RunOptions).
    #[builder(default = "64")]
    pub step_budget: usize,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_concurrent_runs {
            if max == 0 {
                return Err("max_concurrent_runs must be at least 1".into());
            }
        }
        if let Some(budget) = self.step_budget {
            if budget == 0 {
                return Err("step_budget must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 8,
            step_budget: 64,
        }
    }
}
