//! The known-graph engine: an arena-of-indices revision DAG with gdfo,
//! topological sort, merge-sort line-of-history numbering, and a
//! heads query with ghost-parent tolerance.
//!
//! Nodes are addressed by [`NodeIdx`] into a flat arena rather than by
//! `Rc`/`RefCell` pointers, so the structure has no reference cycles and
//! every traversal below is an explicit work-stack walk.

mod error;
mod graph;
mod merge_sort;
mod node;

pub use error::GraphError;
pub use graph::{Graph, NULL_REVISION};
pub use merge_sort::{merge_sort, MergeSortedRevision};
