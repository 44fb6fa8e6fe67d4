use crate::error::ParseError;

/// Position inside one received frame.
///
/// Every structured read goes through [`HeaderCursor::header`], which checks
/// that the whole structure ends at or before the frame end before handing
/// out a slice. Advancing is unchecked; the next `header` or `ensure` call
/// catches an offset that has walked past the end.
#[derive(Debug, Clone, Copy)]
pub struct HeaderCursor<'a> {
    frame: &'a [u8],
    offset: usize,
}

impl<'a> HeaderCursor<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self::at(frame, 0)
    }

    pub fn at(frame: &'a [u8], offset: usize) -> Self {
        Self { frame, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Frame end bound (exclusive)
    pub fn end(&self) -> usize {
        self.frame.len()
    }

    /// Check that `len` bytes starting at the cursor fit inside the frame.
    #[inline(always)]
    pub fn ensure(&self, len: usize) -> Result<(), ParseError> {
        match self.offset.checked_add(len) {
            Some(stop) if stop <= self.frame.len() => Ok(()),
            _ => Err(ParseError::Truncated {
                offset: self.offset,
                needed: len,
                end: self.frame.len(),
            }),
        }
    }

    /// Bounds-checked view of the `len`-byte header at the cursor.
    #[inline(always)]
    pub fn header(&self, len: usize) -> Result<&'a [u8], ParseError> {
        self.ensure(len)?;
        Ok(&self.frame[self.offset..self.offset + len])
    }

    #[inline(always)]
    pub fn advance(&mut self, len: usize) {
        self.offset = self.offset.saturating_add(len);
    }
}

/// Decode a network-order u16 at `at` within an already bounds-checked header.
#[inline(always)]
pub(crate) fn be16(header: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([header[at], header[at + 1]])
}
