use std::sync::Arc;

use aviary_interner::Key;
use thiserror::Error;

/// Failure modes surfaced by the known-graph engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// A graph with nodes but no tail: every node has at least one parent
    /// edge, so no topological order exists.
    #[error("{} node(s) form a cycle and have no tail to start a topological order from", residual.len())]
    Cycle { residual: Vec<Arc<Key>> },

    /// A query named a key that was never added to the graph.
    #[error("key is not present in this graph")]
    UnknownKey(Arc<Key>),
}
