use std::sync::Arc;

use aviary_interner::Key;

/// An index into a [`crate::Graph`]'s node arena. Stable for the lifetime
/// of the graph; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(pub(crate) u32);

/// One revision in the graph. Parent links are `None` where the parent
/// key was never supplied to the graph (a ghost): the edge is preserved
/// as a hole rather than silently dropped.
#[derive(Debug, Clone)]
pub struct Node {
    pub key: Arc<Key>,
    pub parents: Box<[Option<NodeIdx>]>,
    pub children: Vec<NodeIdx>,
    pub gdfo: u32,
}

impl Node {
    pub(crate) fn real_parent_count(&self) -> u32 {
        self.parents.iter().filter(|p| p.is_some()).count() as u32
    }
}
