//! Error types for query-string encoding and decoding operations.

use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur while encoding a value to, or decoding a value from,
/// a query string.
///
/// Every error is fatal to the call that produced it. Keys are rendered with
/// the session's [`KeyStyle`](crate::KeyStyle); the top level is `<root>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The value or destination has a shape the codec cannot traverse
    /// (a scalar without a key, a non-scalar map key, a tuple/struct enum variant).
    #[error("unsupported type at `{key}`: {what}")]
    UnsupportedType { key: String, what: String },

    /// A wire token could not be parsed as the scalar kind its path requires.
    #[error("type mismatch at `{key}`: expected {expected}, found {found:?}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    /// A numeric literal does not fit the destination width.
    #[error("value {value:?} at `{key}` is out of range for {kind}")]
    RangeOverflow {
        key: String,
        kind: &'static str,
        value: String,
    },

    /// A sequence index on the wire exceeds `Config::max_sequence_len`.
    #[error("index {index} at `{key}` exceeds the sequence length limit of {limit}")]
    SequenceTooLong {
        key: String,
        index: usize,
        limit: usize,
    },

    /// A key or value token could not be unescaped by the query codec.
    #[error("invalid escape sequence in token {token:?}")]
    InvalidEncoding { token: String },

    /// A custom error raised by a `Serialize` or `Deserialize` implementation.
    #[error("{0}")]
    Message(String),
}

impl serde::ser::Error for QueryError {
    fn custom<T: Display>(msg: T) -> Self {
        QueryError::Message(msg.to_string())
    }
}

impl serde::de::Error for QueryError {
    fn custom<T: Display>(msg: T) -> Self {
        QueryError::Message(msg.to_string())
    }
}

/// Convenience alias used throughout urlquery-core.
pub type Result<T> = std::result::Result<T, QueryError>;
