use thiserror::Error;

/// Failure modes surfaced by the codec. Formatted malformed-input errors
/// carry the byte offset of the failure so a caller can report useful
/// diagnostics without re-scanning the input.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BencodeError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unexpected byte {found:#04x} at offset {offset}")]
    UnexpectedByte { offset: usize, found: u8 },

    #[error("malformed integer at offset {offset}")]
    MalformedInteger { offset: usize },

    #[error("malformed byte-string length at offset {offset}")]
    MalformedLength { offset: usize },

    #[error("dictionary keys out of order at offset {offset}")]
    KeysDisordered { offset: usize },

    #[error("dictionary key at offset {offset} is missing its value")]
    DictMissingValue { offset: usize },

    #[error("dictionary key at offset {offset} is not a byte string")]
    DictKeyNotBytes { offset: usize },

    #[error("nesting exceeds the configured depth limit of {limit}")]
    TooDeep { limit: usize },

    #[error("{extra} trailing byte(s) after the top-level value")]
    TrailingBytes { extra: usize },

    #[error("unsupported value kind: {0}")]
    UnsupportedType(&'static str),
}
