use std::sync::Arc;

use aviary_interner::Key;
use aviary_revision_graph::GraphError;
use thiserror::Error;

/// A boxed I/O failure from the caller's versioned-file store. The
/// annotator doesn't know or care what went wrong underneath — disk,
/// network, a corrupt pack — only that the store couldn't answer.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Failure modes surfaced by `annotate`/`annotate_flat`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnnotateError {
    /// The requested key was never returned by the store's own ancestry
    /// walk.
    #[error("revision {0:?} is not present in the versioned-file store")]
    RevisionNotPresent(Arc<Key>),

    #[error("versioned-file store failed: {0}")]
    Store(#[from] StoreError),

    #[error("known-graph lookup failed: {0}")]
    Graph(#[from] GraphError),
}
