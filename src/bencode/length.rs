//! Encoded size of a value, computed without encoding it.
//!
//! Mirrors the dispatch in [`super::encoder`] one to one, including the number
//! mode, so `encoding_length(v) == encode(v).len()` for every input.

use super::bvalue::BValue;
use super::compat::{self, NumberMode, NumericInput};
use super::term::{sorted_entries, Term};

/// Decimal digits of `n`, counting the leading `-` of negative values.
pub fn digit_count(n: i64) -> usize {
    let sign = usize::from(n < 0);
    sign + unsigned_digits(n.unsigned_abs())
}

fn unsigned_digits(mut n: u64) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

fn byte_string_length(len: usize) -> usize {
    unsigned_digits(len as u64) + 1 + len
}

fn integer_length(input: NumericInput, mode: NumberMode) -> usize {
    let (emitted, _) = compat::resolve(input, mode);
    1 + digit_count(emitted) + 1
}

pub fn term_length(term: &Term, mode: NumberMode) -> usize {
    match term {
        Term::Null => 0,
        Term::Bytes(b) => byte_string_length(b.len()),
        Term::Text(s) => byte_string_length(s.len()),
        Term::Integer(n) => integer_length(NumericInput::Integer(*n), mode),
        Term::Float(x) => integer_length(NumericInput::Float(*x), mode),
        Term::Bool(b) => integer_length(NumericInput::Integer(i64::from(*b)), mode),
        // type marker + end-of-type marker; nulls contribute nothing
        Term::List(items) | Term::Set(items) => {
            2 + items.iter().map(|item| term_length(item, mode)).sum::<usize>()
        }
        Term::Map(entries) => {
            2 + sorted_entries(entries)
                .into_iter()
                .map(|(key, value)| byte_string_length(key.len()) + term_length(value, mode))
                .sum::<usize>()
        }
    }
}

pub fn bvalue_length_with(value: &BValue, mode: NumberMode) -> usize {
    match value {
        BValue::Integer(n) => integer_length(NumericInput::Integer(*n), mode),
        BValue::String(s) => byte_string_length(s.len()),
        BValue::List(items) => {
            2 + items
                .iter()
                .map(|item| bvalue_length_with(item, mode))
                .sum::<usize>()
        }
        BValue::Dict(dict) => {
            2 + dict
                .iter()
                .map(|(key, value)| byte_string_length(key.len()) + bvalue_length_with(value, mode))
                .sum::<usize>()
        }
    }
}

pub fn bvalue_length(value: &BValue) -> usize {
    bvalue_length_with(value, NumberMode::default())
}
