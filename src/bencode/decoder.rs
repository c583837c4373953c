//! Single-pass bencode decoder.
//!
//! The grammar is read byte by byte with no backtracking. It is deliberately
//! more permissive than BEP-3 so that `.torrent` files produced by sloppy
//! encoders in the wild still decode:
//! - integers may carry a leading `+`, and leading zeros are accepted
//! - a radix point ends an integer, keeping only the integral part (`i3.7e` is 3)
//! - empty digits decode as 0
//! - bytes after the first complete value are ignored

use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::debug;

use super::bvalue::BValue;
use super::cursor::ByteCursor;
use super::error::BencodeError;

const DICTIONARY_START: u8 = b'd';
const LIST_START: u8 = b'l';
const INTEGER_START: u8 = b'i';
const END_OF_TYPE: u8 = b'e';
const STRING_DELIM: u8 = b':';

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How decoded byte strings are materialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StringEncoding {
    /// Keep the bytes verbatim.
    #[default]
    Raw,
    /// Re-encode every byte string (keys included) as valid UTF-8, replacing
    /// invalid sequences with U+FFFD.
    Utf8Lossy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub string_encoding: StringEncoding,
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            string_encoding: StringEncoding::Raw,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    pub fn with_string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.string_encoding = encoding;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

pub struct Decoder<'a> {
    cursor: ByteCursor<'a>,
    options: DecodeOptions,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, DecodeOptions::default())
    }

    pub fn with_options(input: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            cursor: ByteCursor::new(input),
            options,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Decodes the first value of the input. Empty input yields `None`.
    pub fn parse(&mut self) -> Result<Option<BValue>, BencodeError> {
        if self.cursor.is_at_end() {
            return Ok(None);
        }
        let value = self.parse_value()?;
        if !self.cursor.is_at_end() {
            debug!(
                consumed = self.cursor.position(),
                trailing = self.cursor.remaining(),
                "ignoring trailing bytes after bencode value"
            );
        }
        Ok(Some(value))
    }

    pub fn parse_value(&mut self) -> Result<BValue, BencodeError> {
        self.parse_nested(0)
    }

    fn parse_nested(&mut self, depth: usize) -> Result<BValue, BencodeError> {
        if depth > self.options.max_depth {
            return Err(BencodeError::NestingTooDeep {
                offset: self.cursor.position(),
                max_depth: self.options.max_depth,
            });
        }
        match self.cursor.peek() {
            Some(DICTIONARY_START) => self.parse_dict(depth),
            Some(LIST_START) => self.parse_list(depth),
            Some(INTEGER_START) => self.parse_integer().map(BValue::Integer),
            _ => self.parse_string().map(BValue::String),
        }
    }

    fn parse_integer(&mut self) -> Result<i64, BencodeError> {
        let end = self.cursor.find(END_OF_TYPE)?;
        let number = parse_number(&self.cursor, self.cursor.position() + 1, end)?;
        self.cursor.seek_past(end);
        Ok(number)
    }

    fn parse_string(&mut self) -> Result<Bytes, BencodeError> {
        let start = self.cursor.position();
        let sep = self.cursor.find(STRING_DELIM)?;
        let length = parse_number(&self.cursor, start, sep)?;
        if length < 0 {
            return Err(BencodeError::NegativeLength { offset: start });
        }
        self.cursor.seek_past(sep);
        let raw = self.cursor.take(length as usize)?;
        Ok(match self.options.string_encoding {
            StringEncoding::Raw => Bytes::copy_from_slice(raw),
            StringEncoding::Utf8Lossy => {
                Bytes::from(String::from_utf8_lossy(raw).into_owned().into_bytes())
            }
        })
    }

    fn parse_list(&mut self, depth: usize) -> Result<BValue, BencodeError> {
        let start = self.cursor.position();
        self.cursor.advance(1); // consume 'l'
        let mut values = Vec::new();

        loop {
            match self.cursor.peek() {
                Some(END_OF_TYPE) => {
                    self.cursor.advance(1);
                    return Ok(BValue::List(values));
                }
                Some(_) => values.push(self.parse_nested(depth + 1)?),
                None => {
                    return Err(BencodeError::Unterminated {
                        offset: start,
                        kind: "list",
                    })
                }
            }
        }
    }

    fn parse_dict(&mut self, depth: usize) -> Result<BValue, BencodeError> {
        let start = self.cursor.position();
        self.cursor.advance(1); // consume 'd'
        let mut map = BTreeMap::new();

        loop {
            match self.cursor.peek() {
                Some(END_OF_TYPE) => {
                    self.cursor.advance(1);
                    return Ok(BValue::Dict(map));
                }
                Some(_) => {
                    // keys are always byte strings, whatever the lookahead says
                    let key = self.parse_string()?;
                    let value = self.parse_nested(depth + 1)?;
                    map.insert(key, value);
                }
                None => {
                    return Err(BencodeError::Unterminated {
                        offset: start,
                        kind: "dictionary",
                    })
                }
            }
        }
    }
}

/// Accumulates the decimal number in `start..end`, shared by integers and
/// string-length prefixes.
///
/// A single `+` or `-` is allowed as the first byte. A `.` stops the scan and
/// drops the fractional part.
fn parse_number(cursor: &ByteCursor<'_>, start: usize, end: usize) -> Result<i64, BencodeError> {
    let mut magnitude: u64 = 0;
    let mut negative = false;

    for (i, &byte) in cursor.slice(start, end).iter().enumerate() {
        match byte {
            b'0'..=b'9' => {
                magnitude = magnitude
                    .checked_mul(10)
                    .and_then(|m| m.checked_add(u64::from(byte - b'0')))
                    .ok_or(BencodeError::Overflow { offset: start })?;
            }
            b'+' if i == 0 => {}
            b'-' if i == 0 => negative = true,
            b'.' => break,
            _ => {
                return Err(BencodeError::NotANumber {
                    offset: start + i,
                    byte,
                })
            }
        }
    }

    if negative {
        if magnitude > i64::MAX as u64 + 1 {
            return Err(BencodeError::Overflow { offset: start });
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).map_err(|_| BencodeError::Overflow { offset: start })
    }
}
