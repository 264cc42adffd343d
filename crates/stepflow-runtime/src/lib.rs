#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod definition;
pub mod engine;
mod error;
pub mod graph;
pub mod manifest;
pub mod node;

#[doc(hidden)]
pub mod prelude;

pub use error::{RunError, RunErrorKind, RunFailure, ValidationError};

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "stepflow_runtime";
