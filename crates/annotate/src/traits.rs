use std::sync::Arc;

use aviary_interner::Key;

use crate::error::StoreError;

/// A record as returned by [`VersionedFileStore::get_record_stream`]: a
/// key plus its full text, delivered as chunks so the store can stream
/// large blobs without assembling them in one allocation.
#[derive(Debug, Clone)]
pub struct FullTextRecord {
    pub key: Arc<Key>,
    pub chunks: Vec<Vec<u8>>,
}

/// The external collaborator `annotate` is built against. Object-safe so
/// callers can inject a test double in place of a real content-addressed
/// store.
pub trait VersionedFileStore {
    /// For each of `keys`, the key's parents — `None` where the store has
    /// no ancestry information for it (a ghost).
    fn iter_ancestry(&self, keys: &[Arc<Key>]) -> Result<Vec<(Arc<Key>, Option<Vec<Arc<Key>>>)>, StoreError>;

    /// The full text of each of `keys`, in whatever order the store finds
    /// convenient to produce.
    fn get_record_stream(&self, keys: &[Arc<Key>]) -> Result<Vec<FullTextRecord>, StoreError>;
}

/// The external sequence matcher `annotate` runs over each parent/child
/// line pair. Blocks are `(a_idx, b_idx, length)` in strictly increasing
/// order; a trailing zero-length sentinel block is tolerated and ignored.
pub trait LineMatcher {
    fn matching_blocks(&self, a: &[Vec<u8>], b: &[Vec<u8>]) -> Vec<(usize, usize, usize)>;
}
