//! Number handling for the encoder.
//!
//! Bencode only has integers. Older encoders ran every number through a
//! float-based split around 2^31 before printing it: `hi = int32(v / 2^31)`,
//! `lo = int32(v % 2^31)`, emitted value `hi * 2^31 + lo`. Values that survive
//! the split print unchanged; anything else (fractions, NaN, infinities,
//! magnitudes of 2^62 and beyond) silently becomes a different integer.
//! Identity hashes computed by those encoders depend on that exact output, so
//! [`NumberMode::Legacy32Split`] reproduces it and reports every value that
//! did not survive. [`NumberMode::Wide64`] prints `i64` values as they are.

use std::fmt;

const SPLIT: i64 = 1 << 31;
const SPLIT_F64: f64 = 2_147_483_648.0;
const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberMode {
    #[default]
    Legacy32Split,
    Wide64,
}

/// A number as handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericInput {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Integer(n) => write!(f, "{}", n),
            NumericInput::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A number whose encoded form differs from the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossyNumber {
    pub input: NumericInput,
    pub emitted: i64,
}

impl fmt::Display for LossyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bencode only supports integers, {} was encoded as {}",
            self.input, self.emitted
        )
    }
}

/// Integer that gets printed for `input` under `mode`, and whether it equals the input.
pub fn resolve(input: NumericInput, mode: NumberMode) -> (i64, bool) {
    match (input, mode) {
        (NumericInput::Integer(n), NumberMode::Wide64) => (n, true),
        (NumericInput::Integer(n), NumberMode::Legacy32Split) => {
            let emitted = legacy_split_int(n);
            (emitted, emitted == n)
        }
        (NumericInput::Float(x), NumberMode::Wide64) => {
            // `as` saturates and maps NaN to 0
            let emitted = x as i64;
            (emitted, emitted as f64 == x)
        }
        (NumericInput::Float(x), NumberMode::Legacy32Split) => {
            let emitted = legacy_split_float(x);
            (emitted, emitted as f64 == x)
        }
    }
}

fn legacy_split_int(n: i64) -> i64 {
    // `/` and `%` truncate toward zero; `as i32` wraps modulo 2^32
    let hi = (n / SPLIT) as i32;
    let lo = (n % SPLIT) as i32;
    i64::from(hi) * SPLIT + i64::from(lo)
}

fn legacy_split_float(x: f64) -> i64 {
    let hi = to_int32(x / SPLIT_F64);
    let lo = to_int32(x % SPLIT_F64);
    i64::from(hi) * SPLIT + i64::from(lo)
}

/// Truncates to an integer and wraps into the signed 32-bit range. Non-finite input is 0.
fn to_int32(x: f64) -> i32 {
    if !x.is_finite() {
        return 0;
    }
    let wrapped = x.trunc().rem_euclid(TWO_POW_32);
    if wrapped >= SPLIT_F64 {
        (wrapped - TWO_POW_32) as i32
    } else {
        wrapped as i32
    }
}
