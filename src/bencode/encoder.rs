//! Canonical Bencode encoder.
//!
//! This module encodes [`BValue`] trees and native [`Term`] values into the Bencode format as
//! described in [BEP 3](http://www.bittorrent.org/beps/bep_0003.html#bencoding).
//!
//! The encoding rules are:
//! - Strings are length-prefixed base10 followed by a colon and the string bytes
//! - Integers are 'i' followed by the number in base10 followed by 'e'
//! - Lists are 'l' followed by their elements followed by 'e'
//! - Dictionaries are 'd' followed by alternating keys and values followed by 'e',
//!   with keys sorted by raw byte value
//!
//! Output is canonical: two maps holding the same entries encode to the same bytes
//! whatever order the entries were inserted in.

use tracing::{debug, warn};

use super::bvalue::BValue;
use super::compat::{self, LossyNumber, NumberMode, NumericInput};
use super::error::BencodeError;
use super::length;
use super::term::{sorted_entries, Term};

/// Destination for encoded bytes.
trait Sink {
    fn put(&mut self, bytes: &[u8]);
}

impl Sink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Writes into a caller-supplied slice whose capacity was checked up front.
struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Sink for SliceSink<'_> {
    fn put(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }
}

/// Writes the decimal form of `n` without allocating.
fn put_decimal<S: Sink>(sink: &mut S, n: i64) {
    let mut digits = [0u8; 20];
    let mut i = digits.len();
    let mut m = n.unsigned_abs();
    loop {
        i -= 1;
        digits[i] = b'0' + (m % 10) as u8;
        m /= 10;
        if m == 0 {
            break;
        }
    }
    if n < 0 {
        sink.put(b"-");
    }
    sink.put(&digits[i..]);
}

fn put_byte_string<S: Sink>(sink: &mut S, bytes: &[u8]) {
    put_decimal(sink, bytes.len() as i64);
    sink.put(b":");
    sink.put(bytes);
}

/// An encoder for converting values into Bencode format.
///
/// The encoder keeps a log of numbers that could not be encoded faithfully under its
/// [`NumberMode`]. Such numbers are still written; the log lets callers notice.
#[derive(Debug, Default)]
pub struct Encoder {
    mode: NumberMode,
    conversions: Vec<LossyNumber>,
}

impl Encoder {
    /// Creates a new encoder using the legacy number mode.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number_mode(mode: NumberMode) -> Self {
        Self {
            mode,
            conversions: Vec::new(),
        }
    }

    pub fn number_mode(&self) -> NumberMode {
        self.mode
    }

    /// Numbers whose encoded form differed from the input, oldest first.
    pub fn conversions(&self) -> &[LossyNumber] {
        &self.conversions
    }

    pub fn take_conversions(&mut self) -> Vec<LossyNumber> {
        std::mem::take(&mut self.conversions)
    }

    /// Encodes a native value.
    ///
    /// # Arguments
    ///
    /// * `term` - The value to encode
    ///
    /// # Returns
    ///
    /// The Bencode bytes. A top-level [`Term::Null`] yields an empty vector.
    pub fn encode(&mut self, term: &Term) -> Vec<u8> {
        let mut out = Vec::with_capacity(length::term_length(term, self.mode));
        self.encode_term(&mut out, term);
        debug!(bytes = out.len(), "encoded term");
        out
    }

    /// Encodes a decoded value tree.
    pub fn encode_bvalue(&mut self, value: &BValue) -> Vec<u8> {
        let mut out = Vec::with_capacity(length::bvalue_length_with(value, self.mode));
        self.encode_value(&mut out, value);
        out
    }

    /// Encodes `term` into `buf` starting at `offset`, without allocating.
    ///
    /// # Returns
    ///
    /// The number of bytes written, or [`BencodeError::BufferTooSmall`] when
    /// `buf[offset..]` cannot hold the encoding. Nothing is written in that case.
    pub fn encode_into(
        &mut self,
        term: &Term,
        buf: &mut [u8],
        offset: usize,
    ) -> Result<usize, BencodeError> {
        let needed = length::term_length(term, self.mode);
        let available = buf.len().saturating_sub(offset);
        if needed > available {
            return Err(BencodeError::BufferTooSmall { needed, available });
        }
        let mut sink = SliceSink { buf, pos: offset };
        self.encode_term(&mut sink, term);
        Ok(sink.pos - offset)
    }

    /// Same as [`Encoder::encode_into`] for a decoded value tree.
    pub fn encode_bvalue_into(
        &mut self,
        value: &BValue,
        buf: &mut [u8],
        offset: usize,
    ) -> Result<usize, BencodeError> {
        let needed = length::bvalue_length_with(value, self.mode);
        let available = buf.len().saturating_sub(offset);
        if needed > available {
            return Err(BencodeError::BufferTooSmall { needed, available });
        }
        let mut sink = SliceSink { buf, pos: offset };
        self.encode_value(&mut sink, value);
        Ok(sink.pos - offset)
    }

    fn encode_term<S: Sink>(&mut self, sink: &mut S, term: &Term) {
        match term {
            Term::Null => {}
            Term::Bytes(b) => put_byte_string(sink, b),
            Term::Text(s) => put_byte_string(sink, s.as_bytes()),
            Term::Integer(n) => self.encode_number(sink, NumericInput::Integer(*n)),
            Term::Float(x) => self.encode_number(sink, NumericInput::Float(*x)),
            Term::Bool(b) => self.encode_number(sink, NumericInput::Integer(i64::from(*b))),
            Term::List(items) | Term::Set(items) => {
                sink.put(b"l");
                for item in items {
                    self.encode_term(sink, item);
                }
                sink.put(b"e");
            }
            Term::Map(entries) => {
                sink.put(b"d");
                for (key, value) in sorted_entries(entries) {
                    put_byte_string(sink, key);
                    self.encode_term(sink, value);
                }
                sink.put(b"e");
            }
        }
    }

    fn encode_value<S: Sink>(&mut self, sink: &mut S, value: &BValue) {
        match value {
            BValue::Integer(n) => self.encode_number(sink, NumericInput::Integer(*n)),
            BValue::String(s) => put_byte_string(sink, s),
            BValue::List(items) => {
                sink.put(b"l");
                for item in items {
                    self.encode_value(sink, item);
                }
                sink.put(b"e");
            }
            BValue::Dict(dict) => {
                // BTreeMap<Bytes, _> already iterates in raw byte order
                sink.put(b"d");
                for (key, value) in dict {
                    put_byte_string(sink, key);
                    self.encode_value(sink, value);
                }
                sink.put(b"e");
            }
        }
    }

    /// Encodes a number in the format: i<number>e
    fn encode_number<S: Sink>(&mut self, sink: &mut S, input: NumericInput) {
        let (emitted, faithful) = compat::resolve(input, self.mode);
        sink.put(b"i");
        put_decimal(sink, emitted);
        sink.put(b"e");

        if !faithful {
            let lossy = LossyNumber { input, emitted };
            if self.conversions.is_empty() {
                warn!("possible data corruption: {}", lossy);
            } else {
                debug!("{}", lossy);
            }
            self.conversions.push(lossy);
        }
    }
}
