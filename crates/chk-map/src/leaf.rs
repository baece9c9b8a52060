use std::collections::BTreeMap;
use std::sync::Arc;

use aviary_interner::{Key, TupleSet};

use crate::error::ChkError;
use crate::line_reader::LineReader;

const MAGIC: &str = "chkleaf:\n";

/// A content-addressed map fragment holding up to `length` keyed values
/// directly, with the leading components the keys all share factored out
/// into `common_prefix`.
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub maximum_size: u64,
    pub width: usize,
    pub common_prefix: Vec<u8>,
    pub items: BTreeMap<Arc<Key>, Vec<u8>>,
}

impl LeafNode {
    #[must_use]
    pub fn new(maximum_size: u64, width: usize) -> Self {
        Self { maximum_size, width, common_prefix: Vec::new(), items: BTreeMap::new() }
    }

    /// The size estimate used to decide whether this leaf needs to split:
    /// the serialized length of its items plus `length * len(common_prefix)`.
    #[must_use]
    pub fn current_size(&self) -> usize {
        let items_len: usize = self
            .items
            .iter()
            .map(|(key, value)| record_len(key, &self.common_prefix, value))
            .sum();
        items_len + self.items.len() * self.common_prefix.len()
    }

    /// Parses a leaf blob, interning every key component through `interner`
    /// so repeated keys across leaves share one allocation.
    pub fn parse(bytes: &[u8], interner: &mut TupleSet<Key>) -> Result<Self, ChkError> {
        let mut lines = LineReader::new(bytes);
        lines.expect_magic(MAGIC)?;
        let maximum_size = lines.next_uint_line()?;
        let width = usize::try_from(lines.next_uint_line()?).unwrap_or(usize::MAX);
        let length = usize::try_from(lines.next_uint_line()?).unwrap_or(usize::MAX);
        let common_prefix = lines.next_raw_line()?.to_vec();
        let common_components: Vec<&[u8]> = split_components(&common_prefix);
        let prefix_width = if common_prefix.is_empty() { 0 } else { common_components.len() };

        let mut items = BTreeMap::new();
        while !lines.at_end() {
            let header = lines.next_raw_line()?;
            let mut parts: Vec<&[u8]> = header.split(|&b| b == 0).collect();
            let num_lines_field = parts.pop().ok_or(ChkError::Truncated)?;
            let num_lines: usize = std::str::from_utf8(num_lines_field)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or(ChkError::Truncated)?;
            let tail = parts;
            let actual_width = prefix_width + tail.len();
            if actual_width != width {
                return Err(ChkError::WidthMismatch { expected: width, actual: actual_width });
            }

            let mut components: Vec<Box<[u8]>> =
                Vec::with_capacity(common_components.len() + tail.len());
            components.extend(common_components.iter().map(|c| Box::from(*c)));
            components.extend(tail.iter().map(|c| Box::from(*c)));
            let key = Key::new(components)
                .map_err(|e| ChkError::WidthMismatch { expected: width, actual: e.0 })?;

            let value = lines.next_n_lines(num_lines)?.to_vec();
            items.insert(interner.add(key), value);
        }

        if !lines.finished_cleanly() {
            return Err(ChkError::Truncated);
        }
        if items.len() != length {
            return Err(ChkError::LengthMismatch { declared: length, actual: items.len() });
        }

        Ok(Self { maximum_size, width, common_prefix, items })
    }

    /// Serializes back to the exact grammar `parse` accepts.
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
        out.extend_from_slice(&self.common_prefix);
        out.push(b'\n');

        let common_components = split_components(&self.common_prefix);
        let prefix_width = if self.common_prefix.is_empty() { 0 } else { common_components.len() };

        for (key, value) in &self.items {
            for component in &key.components()[prefix_width..] {
                out.extend_from_slice(component);
                out.push(0);
            }
            let num_lines = value.iter().filter(|&&b| b == b'\n').count();
            out.extend(num_lines.to_string().into_bytes());
            out.push(b'\n');
            out.extend_from_slice(value);
        }
        out
    }
}

fn split_components(bytes: &[u8]) -> Vec<&[u8]> {
    bytes.split(|&b| b == 0).collect()
}

fn record_len(key: &Key, common_prefix: &[u8], value: &[u8]) -> usize {
    let common_components = split_components(common_prefix);
    let prefix_width = if common_prefix.is_empty() { 0 } else { common_components.len() };
    let tail = &key.components()[prefix_width..];
    let mut len: usize = tail.iter().map(|c| c.len() + 1).sum();
    let num_lines = value.iter().filter(|&&b| b == b'\n').count();
    len += num_lines.to_string().len() + 1 + value.len();
    len
}
