//! Canonical, interned key tuples.
//!
//! This crate provides the small building block the rest of the history
//! engine leans on to avoid storing millions of duplicate
//! `(file_id, revision_id)`-shaped tuples: a [`TupleSet`] that hands back a
//! single shared [`std::sync::Arc`] for every distinct key value, and the
//! [`Key`] type itself.

mod key;
mod set;

pub use key::{Component, Key, KeyArityError};
pub use set::{Config, Iter, TupleSet, TupleSetError};
