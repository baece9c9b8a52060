//! Deterministic BEncode (BEP-3) encoding and decoding.
//!
//! Encoding is canonical: dictionary keys are held in ascending byte order
//! by construction ([`Value::Dict`] is a `BTreeMap`), so the same logical
//! structure always serializes to the same bytes. Decoding is an explicit
//! iterative parser rather than a recursive-descent one, so a malicious or
//! corrupt input can only ever be rejected with [`BencodeError::TooDeep`],
//! never blow the host stack.

mod decode;
mod encode;
mod error;
mod value;

#[cfg(feature = "dynamic")]
mod dynamic;

pub use decode::{decode, decode_with_config, Config};
pub use encode::encode;
pub use error::BencodeError;
pub use value::Value;
