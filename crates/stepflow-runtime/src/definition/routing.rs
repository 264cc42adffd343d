//! Outgoing routing declared for a source node.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::Target;
use crate::node::Router;

/// A router together with its dispatch table.
///
/// The router inspects the state a node produced and yields a label; the
/// dispatch table maps each label to a target. A label the table does not
/// contain fails the run at execution time.
#[derive(Clone)]
pub struct ConditionalEdges {
    router: Arc<dyn Router>,
    dispatch: BTreeMap<String, Target>,
}

impl ConditionalEdges {
    /// Creates a conditional edge set.
    pub fn new(
        router: Arc<dyn Router>,
        dispatch: impl IntoIterator<Item = (impl Into<String>, impl Into<Target>)>,
    ) -> Self {
        Self {
            router,
            dispatch: dispatch
                .into_iter()
                .map(|(label, target)| (label.into(), target.into()))
                .collect(),
        }
    }

    /// Returns the router.
    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    /// Returns the dispatch table in label order.
    pub fn dispatch(&self) -> &BTreeMap<String, Target> {
        &self.dispatch
    }

    /// Consumes the edge set, returning the router and dispatch table.
    pub(crate) fn into_parts(self) -> (Arc<dyn Router>, BTreeMap<String, Target>) {
        (self.router, self.dispatch)
    }
}

impl std::fmt::Debug for ConditionalEdges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdges")
            .field("labels", &self.dispatch.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
