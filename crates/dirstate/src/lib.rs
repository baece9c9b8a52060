//! Dirstate packed-record codec, directory-aware path comparison, and the
//! working-tree entry refresh logic (`update_entry`) built on top of them.
//!
//! This crate has no filesystem access of its own: `update_entry` takes an
//! already-taken `stat` snapshot and a caller-supplied closure for fresh
//! content (sha1 of a file, a symlink's target) so it stays synchronous and
//! testable without touching disk.

mod bisect;
mod compare;
mod error;
mod pack_stat;
mod record;
mod update_entry;

pub use bisect::{bisect_dirblock, bisect_path_left, bisect_path_right};
pub use compare::{cmp_by_dirs, cmp_path_by_dirblock, split_dirname, PathCache};
pub use error::{DirstateError, DirstateErrorKind};
pub use pack_stat::pack_stat;
pub use record::{parse_records, serialize_records, Record, TreeState};
pub use update_entry::{dirname_of, update_entry, DirblockIndex, EntryState, FileKind, FreshContent, Stat};
