use thiserror::Error;

/// A dirstate corruption, naming the state object it was found in.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("dirstate {context} is corrupt: {kind}")]
pub struct DirstateError {
    pub context: String,
    pub kind: DirstateErrorKind,
}

impl DirstateError {
    #[must_use]
    pub fn corrupt_in(context: impl Into<String>, kind: DirstateErrorKind) -> Self {
        Self { context: context.into(), kind }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DirstateErrorKind {
    #[error("record is missing its trailing newline")]
    MissingTerminator,

    #[error("line has {actual} NUL-separated field(s), expected {declared}")]
    EntryCountMismatch { declared: usize, actual: usize },

    #[error("is_executable flag byte {0:#04x} is neither 'y' nor 'n'")]
    BadExecutableFlag(u8),

    #[error("size field is not a valid ASCII decimal integer")]
    MalformedSize,
}
