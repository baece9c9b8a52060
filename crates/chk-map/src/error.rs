use thiserror::Error;

/// Failure modes for parsing CHK leaf and internal node blobs.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChkError {
    #[error("blob is missing the {expected:?} magic header")]
    BadMagic { expected: &'static str },

    #[error("blob ended before a complete record could be read")]
    Truncated,

    #[error("record assembled {actual} key component(s), expected width {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("node declares length {declared} but contains {actual} item(s)")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("field at line {line} is not a valid integer")]
    MalformedInteger { line: usize },
}
