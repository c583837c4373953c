use thiserror::Error;

/// Errors raised by the bencode codec.
///
/// Every variant except [`BencodeError::BufferTooSmall`] is a malformed-input
/// condition found while decoding and carries the byte offset where the decoder
/// gave up. Decoding never recovers partially.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BencodeError {
    #[error("missing delimiter {delimiter:?} after offset {offset}")]
    MissingDelimiter { offset: usize, delimiter: char },

    #[error("not a number: byte 0x{byte:02x} at offset {offset}")]
    NotANumber { offset: usize, byte: u8 },

    #[error("byte string at offset {offset} declares {length} bytes but only {available} remain")]
    Truncated {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("unterminated {kind} starting at offset {offset}")]
    Unterminated { offset: usize, kind: &'static str },

    #[error("integer at offset {offset} does not fit in 64 bits")]
    Overflow { offset: usize },

    #[error("negative byte string length at offset {offset}")]
    NegativeLength { offset: usize },

    #[error("nesting deeper than {max_depth} levels at offset {offset}")]
    NestingTooDeep { offset: usize, max_depth: usize },

    #[error("output buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },
}

impl BencodeError {
    /// True for the decode-time variants, i.e. the input was not valid bencode.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, BencodeError::BufferTooSmall { .. })
    }

    /// Byte offset of a decode failure.
    pub fn offset(&self) -> Option<usize> {
        match self {
            BencodeError::MissingDelimiter { offset, .. }
            | BencodeError::NotANumber { offset, .. }
            | BencodeError::Truncated { offset, .. }
            | BencodeError::Unterminated { offset, .. }
            | BencodeError::Overflow { offset }
            | BencodeError::NegativeLength { offset }
            | BencodeError::NestingTooDeep { offset, .. } => Some(*offset),
            BencodeError::BufferTooSmall { .. } => None,
        }
    }
}
