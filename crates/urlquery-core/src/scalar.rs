//! Scalar formatting and parsing.
//!
//! Canonical forms: decimal for integers, Rust's shortest round-trip
//! `Display` for floats, `true`/`false` for booleans, the raw text for
//! strings, and the decimal code point for `char` (`'a'` → `97`).

use std::borrow::Cow;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use crate::error::QueryError;

/// A primitive value on its way to the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Bool(bool),
    Int(i128),
    Uint(u128),
    F32(f32),
    F64(f64),
    Char(char),
    Str(&'a str),
}

impl Scalar<'_> {
    /// The canonical text of this value.
    pub fn format(&self) -> Cow<'_, str> {
        match *self {
            Scalar::Bool(true) => Cow::Borrowed("true"),
            Scalar::Bool(false) => Cow::Borrowed("false"),
            Scalar::Int(v) => Cow::Owned(v.to_string()),
            Scalar::Uint(v) => Cow::Owned(v.to_string()),
            Scalar::F32(v) => Cow::Owned(v.to_string()),
            Scalar::F64(v) => Cow::Owned(v.to_string()),
            Scalar::Char(c) => Cow::Owned(u32::from(c).to_string()),
            Scalar::Str(s) => Cow::Borrowed(s),
        }
    }

    /// Whether this is the zero value of its kind (`-0.0` counts as zero).
    pub fn is_zero(&self) -> bool {
        match *self {
            Scalar::Bool(b) => !b,
            Scalar::Int(v) => v == 0,
            Scalar::Uint(v) => v == 0,
            Scalar::F32(v) => v == 0.0,
            Scalar::F64(v) => v == 0.0,
            Scalar::Char(c) => c == '\0',
            Scalar::Str(s) => s.is_empty(),
        }
    }
}

/// Why a token failed to parse. Converted into a [`QueryError`] once the
/// caller knows the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarError {
    TypeMismatch,
    RangeOverflow,
}

impl ScalarError {
    pub(crate) fn at(self, key: String, kind: &'static str, text: &str) -> QueryError {
        match self {
            ScalarError::TypeMismatch => QueryError::TypeMismatch {
                key,
                expected: kind,
                found: text.to_string(),
            },
            ScalarError::RangeOverflow => QueryError::RangeOverflow {
                key,
                kind,
                value: text.to_string(),
            },
        }
    }
}

impl From<ParseIntError> for ScalarError {
    fn from(e: ParseIntError) -> Self {
        match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ScalarError::RangeOverflow,
            _ => ScalarError::TypeMismatch,
        }
    }
}

pub fn parse_bool(text: &str) -> Result<bool, ScalarError> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ScalarError::TypeMismatch),
    }
}

/// Parse any integer width; overflow of the width is a [`ScalarError::RangeOverflow`].
pub fn parse_int<T>(text: &str) -> Result<T, ScalarError>
where
    T: FromStr<Err = ParseIntError>,
{
    Ok(text.parse::<T>()?)
}

pub fn parse_float<T: FromStr>(text: &str) -> Result<T, ScalarError> {
    text.parse::<T>().map_err(|_| ScalarError::TypeMismatch)
}

/// Parse a decimal code point. Values that are not Unicode scalar values
/// (surrogates, anything above `U+10FFFF`) overflow.
pub fn parse_char(text: &str) -> Result<char, ScalarError> {
    let code = parse_int::<u32>(text)?;
    char::from_u32(code).ok_or(ScalarError::RangeOverflow)
}

/// Best-effort typing of an untyped token, for self-describing destinations.
pub(crate) fn infer(text: &str) -> Scalar<'_> {
    if let Ok(b) = parse_bool(text) {
        return Scalar::Bool(b);
    }
    if !looks_numeric(text) {
        return Scalar::Str(text);
    }
    if let Ok(u) = text.parse::<u64>() {
        return canonical(Scalar::Uint(u128::from(u)), text);
    }
    if let Ok(i) = text.parse::<i64>() {
        return canonical(Scalar::Int(i128::from(i)), text);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => canonical(Scalar::F64(f), text),
        _ => Scalar::Str(text),
    }
}

/// Keep `scalar` only if it formats back to exactly `text`.
fn canonical<'a>(scalar: Scalar<'a>, text: &'a str) -> Scalar<'a> {
    if scalar.format() == text {
        scalar
    } else {
        Scalar::Str(text)
    }
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit())
        && digits
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}
