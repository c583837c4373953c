use super::error::BencodeError;

/// A position-tracking view over raw bytes.
///
/// Each decode owns its cursor, so nothing about the scan position outlives
/// or leaks between calls.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// The byte under the cursor, if any.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.data.len());
    }

    /// Index of the next `delimiter` at or after the cursor. Does not move.
    pub fn find(&self, delimiter: u8) -> Result<usize, BencodeError> {
        self.data[self.position.min(self.data.len())..]
            .iter()
            .position(|&b| b == delimiter)
            .map(|i| self.position + i)
            .ok_or(BencodeError::MissingDelimiter {
                offset: self.position,
                delimiter: delimiter as char,
            })
    }

    /// Bytes in `start..end` of the underlying input.
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.data[start..end]
    }

    /// Takes `length` bytes starting at the cursor and moves past them.
    pub fn take(&mut self, length: usize) -> Result<&'a [u8], BencodeError> {
        let available = self.remaining();
        if length > available {
            return Err(BencodeError::Truncated {
                offset: self.position,
                length,
                available,
            });
        }
        let start = self.position;
        self.position += length;
        Ok(&self.data[start..self.position])
    }

    /// Moves the cursor to just past `index`.
    pub fn seek_past(&mut self, index: usize) {
        self.position = (index + 1).min(self.data.len());
    }
}
