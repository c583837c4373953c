use bytes::Bytes;

use super::bvalue::BValue;

/// Native input for the encoder.
///
/// Unlike [`BValue`], which only holds what a decoder can produce, a `Term`
/// covers every shape callers hand to the encoder: text, floating-point
/// numbers, booleans, insertion-ordered maps and absent values.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Absent value. Skipped inside lists and maps; encodes to nothing at the top level.
    Null,
    Bytes(Bytes),
    /// Encoded as its UTF-8 bytes, length counted in bytes.
    Text(String),
    Integer(i64),
    /// Goes through the encoder's number mode.
    Float(f64),
    /// `i1e` / `i0e`.
    Bool(bool),
    List(Vec<Term>),
    /// A set-like collection. Encoded exactly like a list, in the given order,
    /// so callers wanting a canonical order must sort it first.
    Set(Vec<Term>),
    /// A map in insertion order. Keys are sorted by raw bytes on output; when a
    /// key repeats, the last entry wins.
    Map(Vec<(Bytes, Term)>),
}

impl Term {
    pub fn text(s: impl Into<String>) -> Self {
        Term::Text(s.into())
    }

    /// Builds a map from text keys.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Term)>,
    {
        Term::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Bytes::copy_from_slice(k.as_ref().as_bytes()), v))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Term::Null)
    }
}

/// Map entries in output order: sorted by raw key bytes, last duplicate kept,
/// null values dropped.
pub(crate) fn sorted_entries(entries: &[(Bytes, Term)]) -> Vec<&(Bytes, Term)> {
    let mut sorted: Vec<&(Bytes, Term)> = entries.iter().collect();
    // stable, so duplicates keep insertion order and the last one sits last
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out: Vec<&(Bytes, Term)> = Vec::with_capacity(sorted.len());
    for entry in sorted {
        match out.last_mut() {
            Some(last) if last.0 == entry.0 => *last = entry,
            _ => out.push(entry),
        }
    }
    out.retain(|(_, v)| !v.is_null());
    out
}

impl From<&BValue> for Term {
    fn from(value: &BValue) -> Self {
        match value {
            BValue::Integer(n) => Term::Integer(*n),
            BValue::String(s) => Term::Bytes(s.clone()),
            BValue::List(l) => Term::List(l.iter().map(Term::from).collect()),
            BValue::Dict(d) => Term::Map(d.iter().map(|(k, v)| (k.clone(), v.into())).collect()),
        }
    }
}

impl From<serde_json::Value> for Term {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Term::Null,
            serde_json::Value::Bool(b) => Term::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Term::Integer(i),
                None => Term::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Term::Text(s),
            serde_json::Value::Array(arr) => Term::List(arr.into_iter().map(Term::from).collect()),
            serde_json::Value::Object(map) => Term::map(map.into_iter().map(|(k, v)| (k, v.into()))),
        }
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Term::Integer(n)
    }
}

impl From<f64> for Term {
    fn from(x: f64) -> Self {
        Term::Float(x)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Text(s.to_owned())
    }
}

impl From<Bytes> for Term {
    fn from(b: Bytes) -> Self {
        Term::Bytes(b)
    }
}

impl<T: Into<Term>> From<Option<T>> for Term {
    fn from(value: Option<T>) -> Self {
        value.map_or(Term::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_entries_last_duplicate_wins() {
        let entries = vec![
            (Bytes::from_static(b"b"), Term::Integer(1)),
            (Bytes::from_static(b"a"), Term::Integer(2)),
            (Bytes::from_static(b"b"), Term::Integer(3)),
            (Bytes::from_static(b"c"), Term::Null),
        ];
        let sorted: Vec<_> = sorted_entries(&entries)
            .into_iter()
            .map(|(k, v)| (&k[..], v.clone()))
            .collect();
        assert_eq!(
            sorted,
            vec![
                (b"a".as_slice(), Term::Integer(2)),
                (b"b".as_slice(), Term::Integer(3)),
            ]
        );
    }

    #[test]
    fn test_sorted_entries_use_raw_bytes() {
        // uppercase sorts before lowercase, multi-byte UTF-8 after ASCII
        let term = Term::map([
            ("é", 4i64.into()),
            ("b", 1i64.into()),
            ("B", 2i64.into()),
            ("z", 3i64.into()),
        ]);
        let Term::Map(entries) = &term else {
            panic!("expected map");
        };
        let keys: Vec<&[u8]> = sorted_entries(entries)
            .into_iter()
            .map(|(k, _)| &k[..])
            .collect();
        assert_eq!(
            keys,
            vec![
                b"B".as_slice(),
                b"b".as_slice(),
                b"z".as_slice(),
                "é".as_bytes()
            ]
        );
    }

    #[test]
    fn test_from_json() {
        let term = Term::from(serde_json::json!({"a": [1, 2.5, true, null, "x"]}));
        assert_eq!(
            term,
            Term::map([(
                "a",
                Term::List(vec![
                    Term::Integer(1),
                    Term::Float(2.5),
                    Term::Bool(true),
                    Term::Null,
                    Term::text("x"),
                ])
            )])
        );
    }
}
