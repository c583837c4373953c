//! Bencode codec: decoding, canonical encoding and encoded-size calculation.
//!
//! | Term | Encoding |
//! |------|----------|
//! | Integer | `i` [`-`/`+`]? digits `e` |
//! | Byte string | decimal length `:` raw bytes |
//! | List | `l` value* `e` |
//! | Dictionary | `d` (byte-string key, value)* `e`, keys sorted by raw bytes on output |
//!
//! ```
//! use torrent_fingerprint::bencode::{Bencode, BValue, Term};
//!
//! let value = Bencode::decode(b"l4:spam4:eggse").unwrap().unwrap();
//! assert_eq!(value, BValue::List(vec!["spam".into(), "eggs".into()]));
//!
//! let encoded = Bencode::encode_term(&Term::map([("b", 1i64.into()), ("a", 2i64.into())]));
//! assert_eq!(encoded.bytes, b"d1:ai2e1:bi1ee");
//! assert!(encoded.conversions.is_empty());
//! ```

use tracing::debug;

pub mod bvalue;
pub mod compat;
pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod length;
pub mod term;

pub use bvalue::BValue;
pub use compat::{LossyNumber, NumberMode, NumericInput};
pub use cursor::ByteCursor;
pub use decoder::{DecodeOptions, Decoder, StringEncoding};
pub use encoder::Encoder;
pub use error::BencodeError;
pub use term::Term;

/// Output of [`Bencode::encode_term`].
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// Numbers that were not encoded faithfully. Empty in the common case.
    pub conversions: Vec<LossyNumber>,
}

/// Entry points for the codec.
#[derive(Debug, Clone, Copy)]
pub struct Bencode;

impl Bencode {
    /// Decodes the first bencode value in `bytes`. Empty input yields `Ok(None)`.
    pub fn decode(bytes: &[u8]) -> Result<Option<BValue>, BencodeError> {
        Self::decode_with(bytes, DecodeOptions::default())
    }

    pub fn decode_with(
        bytes: &[u8],
        options: DecodeOptions,
    ) -> Result<Option<BValue>, BencodeError> {
        let value = Decoder::with_options(bytes, options).parse()?;
        debug!(input = bytes.len(), "decoded bencode");
        Ok(value)
    }

    /// Canonical encoding of a decoded value tree, legacy number mode.
    ///
    /// Integers with `|v| >= 2^62` do not survive the legacy split and come back
    /// changed on decode. Use [`Encoder::with_number_mode`] with
    /// [`NumberMode::Wide64`] when such values must round-trip.
    pub fn encode(value: &BValue) -> Vec<u8> {
        Encoder::new().encode_bvalue(value)
    }

    pub fn encode_term(term: &Term) -> Encoded {
        Self::encode_term_with(term, NumberMode::default())
    }

    pub fn encode_term_with(term: &Term, mode: NumberMode) -> Encoded {
        let mut encoder = Encoder::with_number_mode(mode);
        let bytes = encoder.encode(term);
        Encoded {
            bytes,
            conversions: encoder.take_conversions(),
        }
    }

    pub fn encoding_length(value: &BValue) -> usize {
        length::bvalue_length(value)
    }

    pub fn term_encoding_length(term: &Term, mode: NumberMode) -> usize {
        length::term_length(term, mode)
    }
}

pub fn decode(bytes: &[u8]) -> Result<Option<BValue>, BencodeError> {
    Bencode::decode(bytes)
}

pub fn encode(value: &BValue) -> Vec<u8> {
    Bencode::encode(value)
}

pub fn encoding_length(value: &BValue) -> usize {
    Bencode::encoding_length(value)
}
