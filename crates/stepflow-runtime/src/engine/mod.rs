//! Workflow execution engine.
//!
//! This module provides the runtime for executing compiled graphs:
//! - [`Engine`]: the main execution engine
//! - [`EngineConfig`]: configuration options
//! - [`RunOptions`]: per-run overrides (step budget, cancellation)
//! - [`RunReport`] / [`BatchOutcome`]: run outcomes

pub(crate) mod compiler;
mod config;
mod executor;
mod options;
mod outcome;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use executor::Engine;
pub use options::RunOptions;
pub use outcome::{BatchOutcome, RunId, RunOutcome, RunReport};
