use crate::error::ChkError;

/// A cursor over a line-oriented blob shared by the leaf and internal node
/// parsers. Every read consumes through (and including) a `\n`; a read that
/// can't find one reports the blob as truncated rather than panicking.
pub(crate) struct LineReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> LineReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0, line: 0 }
    }

    pub(crate) fn expect_magic(&mut self, magic: &'static str) -> Result<(), ChkError> {
        let bytes = magic.as_bytes();
        if self.bytes.get(self.pos..self.pos + bytes.len()) == Some(bytes) {
            self.pos += bytes.len();
            self.line += 1;
            Ok(())
        } else {
            Err(ChkError::BadMagic { expected: magic })
        }
    }

    pub(crate) fn next_raw_line(&mut self) -> Result<&'a [u8], ChkError> {
        let rest = self.bytes.get(self.pos..).ok_or(ChkError::Truncated)?;
        let newline = rest.iter().position(|&b| b == b'\n').ok_or(ChkError::Truncated)?;
        let line = &rest[..newline];
        self.pos += newline + 1;
        self.line += 1;
        Ok(line)
    }

    pub(crate) fn next_uint_line(&mut self) -> Result<u64, ChkError> {
        let line_no = self.line + 1;
        let line = self.next_raw_line()?;
        std::str::from_utf8(line)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(ChkError::MalformedInteger { line: line_no })
    }

    /// Reads exactly `n` newline-terminated lines and returns their
    /// concatenated bytes verbatim, terminators included.
    pub(crate) fn next_n_lines(&mut self, n: usize) -> Result<&'a [u8], ChkError> {
        let start = self.pos;
        for _ in 0..n {
            let rest = self.bytes.get(self.pos..).ok_or(ChkError::Truncated)?;
            let newline = rest.iter().position(|&b| b == b'\n').ok_or(ChkError::Truncated)?;
            self.pos += newline + 1;
            self.line += 1;
        }
        Ok(&self.bytes[start..self.pos])
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub(crate) fn finished_cleanly(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
