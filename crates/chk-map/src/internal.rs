use std::collections::BTreeMap;
use std::sync::Arc;

use aviary_interner::{Key, TupleSet};

use crate::error::ChkError;
use crate::line_reader::LineReader;

const MAGIC: &str = "chknode:\n";

/// A content-addressed map fragment whose items point at child nodes
/// rather than holding values directly. Every item's full prefix is
/// `prefix || item_suffix` and has the same length, `node_width`.
#[derive(Debug, Clone)]
pub struct InternalNode {
    pub maximum_size: u64,
    pub width: usize,
    pub prefix: Vec<u8>,
    /// item suffix -> the (interned, 1-tuple) flat key of the child node.
    pub items: BTreeMap<Vec<u8>, Arc<Key>>,
}

impl InternalNode {
    #[must_use]
    pub fn new(maximum_size: u64, width: usize) -> Self {
        Self { maximum_size, width, prefix: Vec::new(), items: BTreeMap::new() }
    }

    pub fn parse(bytes: &[u8], interner: &mut TupleSet<Key>) -> Result<Self, ChkError> {
        let mut lines = LineReader::new(bytes);
        lines.expect_magic(MAGIC)?;
        let maximum_size = lines.next_uint_line()?;
        let width = usize::try_from(lines.next_uint_line()?).unwrap_or(usize::MAX);
        let length = usize::try_from(lines.next_uint_line()?).unwrap_or(usize::MAX);
        let prefix = lines.next_raw_line()?.to_vec();

        let mut items = BTreeMap::new();
        while !lines.at_end() {
            let record = lines.next_raw_line()?;
            let split = record.iter().position(|&b| b == 0).ok_or(ChkError::Truncated)?;
            let suffix = record[..split].to_vec();
            let flat_child_key = record[split + 1..].to_vec();
            let key = interner.add(Key::single(flat_child_key));
            items.insert(suffix, key);
        }

        if !lines.finished_cleanly() {
            return Err(ChkError::Truncated);
        }
        if items.len() != length {
            return Err(ChkError::LengthMismatch { declared: length, actual: items.len() });
        }

        Ok(Self { maximum_size, width, prefix, items })
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC.as_bytes());
        out.extend(self.maximum_size.to_string().into_bytes());
        out.push(b'\n');
        out.extend(self.width.to_string().into_bytes());
        out.push(b'\n');
        out.extend(self.items.len().to_string().into_bytes());
        out.push(b'\n');
        out.extend_from_slice(&self.prefix);
        out.push(b'\n');

        for (suffix, child_key) in &self.items {
            out.extend_from_slice(suffix);
            out.push(0);
            out.extend_from_slice(&child_key.components()[0]);
            out.push(b'\n');
        }
        out
    }

    /// The full item prefix for `suffix`: `self.prefix` followed by it.
    #[must_use]
    pub fn full_prefix(&self, suffix: &[u8]) -> Vec<u8> {
        let mut out = self.prefix.clone();
        out.extend_from_slice(suffix);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interner() -> TupleSet<Key> {
        TupleSet::default()
    }

    #[test]
    fn round_trips_an_internal_node() {
        let mut set = interner();
        let mut node = InternalNode::new(65536, 16);
        node.prefix = b"AB".to_vec();
        node.items.insert(b"CD".to_vec(), set.add(Key::single(b"sha1:child-a".as_slice())));
        node.items.insert(b"EF".to_vec(), set.add(Key::single(b"sha1:child-b".as_slice())));

        let blob = node.serialize();
        let parsed = InternalNode::parse(&blob, &mut set).unwrap();
        assert_eq!(parsed.serialize(), blob);
        assert_eq!(parsed.full_prefix(b"CD"), b"ABCD".to_vec());
        assert_eq!(
            parsed.items.get(b"CD".as_slice()).unwrap().components()[0].as_ref(),
            b"sha1:child-a".as_slice()
        );
    }

    #[test]
    fn parse_rejects_missing_magic() {
        let mut set = interner();
        assert_eq!(
            InternalNode::parse(b"chkleaf:\n", &mut set),
            Err(ChkError::BadMagic { expected: MAGIC })
        );
    }

    #[test]
    fn parse_rejects_a_blob_missing_its_trailing_newline() {
        let mut set = interner();
        let mut node = InternalNode::new(100, 2);
        node.items.insert(b"CD".to_vec(), set.add(Key::single(b"x".as_slice())));
        let mut blob = node.serialize();
        blob.pop();
        assert_eq!(InternalNode::parse(&blob, &mut set), Err(ChkError::Truncated));
    }
}
