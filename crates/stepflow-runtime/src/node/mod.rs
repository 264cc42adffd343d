//! Node transformations and routing functions.
//!
//! This module provides the functional seams of a workflow graph:
//! - [`Transform`]: a node's state transformation
//! - [`Router`]: a pure state-to-label function for conditional edges
//! - [`transform_fn`] / [`router_fn`]: closure adapters
//! - [`ClassifyNode`]: transformation wrapping a [`Classifier`]
//! - [`SinkNode`]: transformation wrapping a [`StateSink`]
//!
//! [`Classifier`]: stepflow_core::classify::Classifier
//! [`StateSink`]: stepflow_core::sink::StateSink

use std::sync::Arc;

use async_trait::async_trait;

use stepflow_core::BoxedError;
use stepflow_core::record::StateRecord;

mod classify;
mod persist;

pub use classify::{ClassifyNode, ClassifyNodeError, LabelPolicy};
pub use persist::SinkNode;

/// A state transformation applied by a node.
///
/// A node receives the whole current state and returns the whole next
/// state; fields it does not touch must carry forward unchanged.
/// Implementations must be stateless across invocations: a single
/// instance may be invoked many times across many concurrent runs.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Applies the transformation, producing the next state.
    async fn apply(&self, state: StateRecord) -> Result<StateRecord, BoxedError>;
}

#[async_trait]
impl<T: Transform + ?Sized> Transform for Arc<T> {
    async fn apply(&self, state: StateRecord) -> Result<StateRecord, BoxedError> {
        (**self).apply(state).await
    }
}

/// A pure routing function mapping a node's output state to a dispatch
/// label.
///
/// Routers must be read-only and deterministic: the same state always
/// yields the same label.
pub trait Router: Send + Sync {
    /// Computes the dispatch label for the given state.
    fn route(&self, state: &StateRecord) -> String;
}

impl<T: Router + ?Sized> Router for Arc<T> {
    fn route(&self, state: &StateRecord) -> String {
        (**self).route(state)
    }
}

/// Wraps a synchronous closure as a [`Transform`].
pub fn transform_fn<F>(f: F) -> FnTransform<F>
where
    F: Fn(StateRecord) -> Result<StateRecord, BoxedError> + Send + Sync,
{
    FnTransform(f)
}

/// A [`Transform`] backed by a closure. Built with [`transform_fn`].
pub struct FnTransform<F>(F);

#[async_trait]
impl<F> Transform for FnTransform<F>
where
    F: Fn(StateRecord) -> Result<StateRecord, BoxedError> + Send + Sync,
{
    async fn apply(&self, state: StateRecord) -> Result<StateRecord, BoxedError> {
        (self.0)(state)
    }
}

/// Wraps a closure as a [`Router`].
pub fn router_fn<F>(f: F) -> FnRouter<F>
where
    F: Fn(&StateRecord) -> String + Send + Sync,
{
    FnRouter(f)
}

/// A [`Router`] backed by a closure. Built with [`router_fn`].
pub struct FnRouter<F>(F);

impl<F> Router for FnRouter<F>
where
    F: Fn(&StateRecord) -> String + Send + Sync,
{
    fn route(&self, state: &StateRecord) -> String {
        (self.0)(state)
    }
}
