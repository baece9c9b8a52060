//! Per-line annotation: attributes each line of a revision's text to the
//! revision(s) that introduced it, by walking the ancestry a caller's
//! [`VersionedFileStore`] exposes and folding matcher output parent by
//! parent.
//!
//! The sequence matcher and the versioned-file store are both supplied
//! by the caller (see [`LineMatcher`] and [`VersionedFileStore`]) so this
//! crate never touches a working tree or a pack file directly.

mod annotate;
mod error;
mod lines;
mod merge;
mod progress;
mod traits;

pub use crate::annotate::{annotate, annotate_flat};
pub use error::{AnnotateError, StoreError};
pub use lines::split_lines;
pub use progress::{ProgressScope, ProgressSink};
pub use traits::{FullTextRecord, LineMatcher, VersionedFileStore};
