//! Error types for document operations.

use std::fmt;

use thiserror::Error;

use crate::primitive::Kind;

/// Error type for document operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    // Conversion errors
    /// A primitive's dynamic kind does not match the requested native type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: Kind, found: Kind },
    /// Two primitives of different kinds were compared.
    #[error("cannot compare {lhs} with {rhs}")]
    ComparisonMismatch { lhs: Kind, rhs: Kind },
    /// Heuristic decode found no candidate type for a value.
    #[error("unsupported value shape for key {key:?}")]
    UnsupportedShape { key: String },

    // Malformed binary input
    /// Buffer is shorter than the minimal empty document.
    #[error("document too small: {len} bytes")]
    DocumentTooSmall { len: usize },
    /// Length header disagrees with the buffer size.
    #[error("length header says {declared} bytes, buffer has {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    /// Last byte of the document is not the 0x00 terminator.
    #[error("document is not terminated by a zero byte")]
    MissingTerminator,
    /// Element carries a type tag outside the supported table.
    #[error("unknown type tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    /// Not enough bytes for the key or value starting at `offset`.
    #[error("truncated element at offset {offset}")]
    TruncatedValue { offset: usize },
    /// Key or string payload is not valid UTF-8.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },
    /// Nested documents go deeper than `MAX_DEPTH`.
    #[error("nesting depth exceeds {max}")]
    MaxDepthExceeded { max: usize },

    // Invalid input values
    /// A key, or a regex pattern or option string, contains a NUL byte.
    #[error("{value:?} contains a NUL byte")]
    InvalidCString { value: String },

    // serde / JSON errors
    /// Free-form error raised through serde.
    #[error("{0}")]
    Message(String),
    /// Failed to parse JSON input.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    /// Failed to serialize to JSON.
    #[error("JSON serialize error: {0}")]
    JsonSerialize(String),
    /// f64 is NaN or Infinity (not representable in JSON).
    #[error("cannot encode non-finite float {0} as JSON")]
    NonFiniteFloat(f64),
}

impl Error {
    pub(crate) fn mismatch(expected: Kind, found: Option<Kind>) -> Self {
        Error::TypeMismatch {
            expected,
            found: found.unwrap_or(Kind::Null),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, Error>;
