use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt::Display;

use super::error::BencodeError;

/// Represents a decoded Bencode term.
///
/// Bencode (pronounced like B-encode) supports four different types of values:
/// - Byte strings (arbitrary bytes, not necessarily UTF-8)
/// - Integers
/// - Lists
/// - Dictionaries keyed by byte strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
    /// An integer value, can be positive or negative
    /// Example: `i42e` represents 42
    Integer(i64),

    /// A byte string, prefixed with its length
    /// Example: `4:spam` represents "spam"
    String(Bytes),

    /// A list of BValue elements
    /// Example: `l4:spami42ee` represents ["spam", 42]
    List(Vec<BValue>),

    /// A dictionary mapping raw byte keys to BValues.
    /// The map keeps keys in raw byte order, which is the order they are encoded in.
    /// Example: `d3:bar4:spam3:fooi42ee` represents {"bar": "spam", "foo": 42}
    Dict(BTreeMap<Bytes, BValue>),
}

impl BValue {
    /// Creates a byte string value from UTF-8 text.
    pub fn string(s: &str) -> Self {
        BValue::String(Bytes::copy_from_slice(s.as_bytes()))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            BValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            BValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the byte string as UTF-8, or `None` if it is not a string or not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BValue::String(s) => std::str::from_utf8(s).ok(),
            _ => None,
        }
    }

    /// Returns the byte string as text, replacing invalid UTF-8 sequences.
    pub fn to_string_lossy(&self) -> Option<String> {
        match self {
            BValue::String(s) => Some(String::from_utf8_lossy(s).into_owned()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[BValue]> {
        match self {
            BValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, BValue>> {
        match self {
            BValue::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_dict(self) -> Option<BTreeMap<Bytes, BValue>> {
        match self {
            BValue::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up `key` if this value is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&BValue> {
        self.as_dict()?.get(key)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        crate::bencode::encoder::Encoder::new().encode_bvalue(self)
    }

    /// Decodes a value; empty input is an error here rather than `None`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BencodeError> {
        let mut decoder = crate::bencode::decoder::Decoder::new(bytes);
        decoder.parse_value()
    }

    pub fn encoding_length(&self) -> usize {
        crate::bencode::length::bvalue_length(self)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }
}

impl From<i64> for BValue {
    fn from(n: i64) -> Self {
        BValue::Integer(n)
    }
}

impl From<&str> for BValue {
    fn from(s: &str) -> Self {
        BValue::string(s)
    }
}

impl From<Bytes> for BValue {
    fn from(b: Bytes) -> Self {
        BValue::String(b)
    }
}

impl From<Vec<BValue>> for BValue {
    fn from(l: Vec<BValue>) -> Self {
        BValue::List(l)
    }
}

impl From<BTreeMap<Bytes, BValue>> for BValue {
    fn from(d: BTreeMap<Bytes, BValue>) -> Self {
        BValue::Dict(d)
    }
}

impl TryFrom<&[u8]> for BValue {
    type Error = BencodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

fn is_printable(s: &[u8]) -> bool {
    !s.iter().any(|&b| !(32..=126).contains(&b))
}

impl Display for BValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BValue::Integer(n) => write!(f, "{}", n),
            BValue::String(s) => {
                if is_printable(s) {
                    write!(f, "\"{}\"", String::from_utf8_lossy(s))
                } else {
                    write!(f, "\"{}\"", hex::encode(s))
                }
            }
            BValue::List(list) => {
                write!(f, "[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            BValue::Dict(dict) => {
                write!(f, "{{")?;
                for (i, (key, value)) in dict.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "\"{}\":{}", String::from_utf8_lossy(key), value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// JSON view for inspection. Byte strings with non-printable bytes (piece hashes,
/// binary keys) are shown as hex.
impl From<&BValue> for serde_json::Value {
    fn from(value: &BValue) -> Self {
        match value {
            BValue::Integer(n) => serde_json::Value::Number((*n).into()),
            BValue::String(s) => {
                if is_printable(s) {
                    serde_json::Value::String(String::from_utf8_lossy(s).into_owned())
                } else {
                    serde_json::Value::String(hex::encode(s))
                }
            }
            BValue::List(arr) => serde_json::Value::Array(arr.iter().map(|v| v.into()).collect()),
            BValue::Dict(map) => {
                let obj = map
                    .iter()
                    .map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), v.into()))
                    .collect();
                serde_json::Value::Object(obj)
            }
        }
    }
}
