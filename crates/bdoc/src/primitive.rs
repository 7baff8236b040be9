//! Primitive values stored in document elements.
//!
//! [`Primitive`] is a closed enum: every element of a document decodes to
//! exactly one variant, and each variant reports its dynamic [`Kind`].
//!
//! ```
//! use bdoc::{Document, Kind, Primitive};
//!
//! let mut doc = Document::new();
//! doc.insert("n", 42i32);
//!
//! let value = doc.get("n").unwrap();
//! assert_eq!(value.kind(), Kind::Int32);
//! assert!(matches!(value, Primitive::Int32(42)));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::tag::Tag;

/// Dynamic kind of a [`Primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Double,
    String,
    Document,
    Array,
    Binary,
    ObjectId,
    Bool,
    DateTime,
    Null,
    Regex,
    JavaScript,
    Int32,
    Timestamp,
    Int64,
    Decimal128,
    MinKey,
    MaxKey,
}

impl Kind {
    /// Get the kind name as a string (for error messages).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Document => "document",
            Kind::Array => "array",
            Kind::Binary => "binary",
            Kind::ObjectId => "object_id",
            Kind::Bool => "bool",
            Kind::DateTime => "datetime",
            Kind::Null => "null",
            Kind::Regex => "regex",
            Kind::JavaScript => "javascript",
            Kind::Int32 => "int32",
            Kind::Timestamp => "timestamp",
            Kind::Int64 => "int64",
            Kind::Decimal128 => "decimal128",
            Kind::MinKey => "min_key",
            Kind::MaxKey => "max_key",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded element value.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// 64-bit IEEE 754 floating point.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Embedded document.
    Document(Document),
    /// Embedded document whose keys are ordinal strings.
    Array(Document),
    /// Binary blob with a subtype byte.
    Binary(Binary),
    ObjectId(ObjectId),
    Bool(bool),
    /// UTC datetime in milliseconds since the Unix epoch.
    DateTime(DateTime),
    Null,
    Regex(Regex),
    /// JavaScript source code.
    JavaScript(String),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    Decimal128(Decimal128),
    /// Sentinel that sorts before every other value.
    MinKey,
    /// Sentinel that sorts after every other value.
    MaxKey,
}

impl Primitive {
    /// Dynamic kind of this value.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Primitive::Double(_) => Kind::Double,
            Primitive::String(_) => Kind::String,
            Primitive::Document(_) => Kind::Document,
            Primitive::Array(_) => Kind::Array,
            Primitive::Binary(_) => Kind::Binary,
            Primitive::ObjectId(_) => Kind::ObjectId,
            Primitive::Bool(_) => Kind::Bool,
            Primitive::DateTime(_) => Kind::DateTime,
            Primitive::Null => Kind::Null,
            Primitive::Regex(_) => Kind::Regex,
            Primitive::JavaScript(_) => Kind::JavaScript,
            Primitive::Int32(_) => Kind::Int32,
            Primitive::Timestamp(_) => Kind::Timestamp,
            Primitive::Int64(_) => Kind::Int64,
            Primitive::Decimal128(_) => Kind::Decimal128,
            Primitive::MinKey => Kind::MinKey,
            Primitive::MaxKey => Kind::MaxKey,
        }
    }

    /// Wire tag this value is stored under.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Tag {
        Tag::from(self.kind())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Primitive::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Primitive::Int32(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Primitive::Int64(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Primitive::Double(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Nested document, for both the document and array kinds.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Primitive::Document(doc) | Primitive::Array(doc) => Some(doc),
            _ => None,
        }
    }

    /// Equality that refuses to compare values of different kinds.
    ///
    /// # Errors
    ///
    /// Returns `Error::ComparisonMismatch` when the kinds differ.
    pub fn try_eq(&self, other: &Primitive) -> Result<bool> {
        self.check_same_kind(other)?;
        Ok(self == other)
    }

    /// Ordering that refuses to compare values of different kinds.
    ///
    /// Doubles use IEEE 754 total order. Documents, arrays and decimals
    /// compare by their encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::ComparisonMismatch` when the kinds differ.
    pub fn try_cmp(&self, other: &Primitive) -> Result<Ordering> {
        self.check_same_kind(other)?;
        let ordering = match (self, other) {
            (Primitive::Double(a), Primitive::Double(b)) => a.total_cmp(b),
            (Primitive::String(a), Primitive::String(b))
            | (Primitive::JavaScript(a), Primitive::JavaScript(b)) => a.cmp(b),
            (Primitive::Document(a), Primitive::Document(b))
            | (Primitive::Array(a), Primitive::Array(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Primitive::Binary(a), Primitive::Binary(b)) => a.cmp(b),
            (Primitive::ObjectId(a), Primitive::ObjectId(b)) => a.cmp(b),
            (Primitive::Bool(a), Primitive::Bool(b)) => a.cmp(b),
            (Primitive::DateTime(a), Primitive::DateTime(b)) => a.cmp(b),
            (Primitive::Regex(a), Primitive::Regex(b)) => a.cmp(b),
            (Primitive::Int32(a), Primitive::Int32(b)) => a.cmp(b),
            (Primitive::Timestamp(a), Primitive::Timestamp(b)) => a.cmp(b),
            (Primitive::Int64(a), Primitive::Int64(b)) => a.cmp(b),
            (Primitive::Decimal128(a), Primitive::Decimal128(b)) => a.cmp(b),
            // Null, MinKey, MaxKey: single-valued kinds
            _ => Ordering::Equal,
        };
        Ok(ordering)
    }

    fn check_same_kind(&self, other: &Primitive) -> Result<()> {
        let (lhs, rhs) = (self.kind(), other.kind());
        if lhs == rhs {
            Ok(())
        } else {
            Err(Error::ComparisonMismatch { lhs, rhs })
        }
    }
}

/// Binary subtype for generic bytes.
pub const BINARY_SUBTYPE_GENERIC: u8 = 0x00;

/// Binary blob with its subtype byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binary {
    pub subtype: u8,
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Generic-subtype binary copied from `bytes`.
    #[must_use]
    pub fn generic(bytes: &[u8]) -> Self {
        Self {
            subtype: BINARY_SUBTYPE_GENERIC,
            bytes: bytes.to_vec(),
        }
    }
}

/// 12-byte object identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Lowercase 24-character hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 24-character hex form. Returns `None` on bad input.
    #[must_use]
    pub fn parse_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_hex(s).ok_or_else(|| Error::Message(format!("invalid object id {s:?}")))
    }
}

/// UTC datetime with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(i64);

impl DateTime {
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// Convert to a chrono datetime, if within chrono's range.
    #[cfg(feature = "chrono")]
    #[must_use]
    pub fn to_chrono(self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.0)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::DateTime<chrono::Utc>> for DateTime {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

/// Replication timestamp: seconds plus an ordinal within the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub time: u32,
    pub increment: u32,
}

impl Timestamp {
    /// Wire form: increment in the low 32 bits, time in the high 32 bits.
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        ((self.time as u64) << 32) | self.increment as u64
    }

    #[must_use]
    pub const fn from_u64(raw: u64) -> Self {
        Self {
            time: (raw >> 32) as u32,
            increment: raw as u32,
        }
    }
}

/// Regular expression pattern with its option letters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Regex {
    pub pattern: String,
    pub options: String,
}

/// 128-bit decimal, carried as opaque little-endian bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal128([u8; 16]);

impl Decimal128 {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn bytes(&self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal128({})", hex::encode(self.0))
    }
}

/// Null value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Null;

/// Minimum-key sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinKey;

/// Maximum-key sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxKey;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_tag() {
        assert_eq!(Primitive::Int32(1).kind(), Kind::Int32);
        assert_eq!(Primitive::Int32(1).tag(), Tag::Int32);
        assert_eq!(Primitive::Array(Document::new()).tag(), Tag::Array);
        assert_eq!(Primitive::MinKey.tag().raw(), 0xFF);
        assert_eq!(Kind::ObjectId.to_string(), "object_id");
    }

    #[test]
    fn test_try_cmp_same_kind() {
        let a = Primitive::Int64(1);
        let b = Primitive::Int64(2);
        assert_eq!(a.try_cmp(&b), Ok(Ordering::Less));
        assert_eq!(a.try_eq(&a.clone()), Ok(true));
        assert_eq!(
            Primitive::String("b".into()).try_cmp(&Primitive::String("a".into())),
            Ok(Ordering::Greater)
        );
        assert_eq!(Primitive::Null.try_cmp(&Primitive::Null), Ok(Ordering::Equal));
    }

    #[test]
    fn test_try_cmp_different_kinds() {
        let err = Primitive::Int32(1).try_cmp(&Primitive::Int64(1)).unwrap_err();
        assert_eq!(
            err,
            Error::ComparisonMismatch {
                lhs: Kind::Int32,
                rhs: Kind::Int64
            }
        );
        assert!(Primitive::String("1".into()).try_eq(&Primitive::Int32(1)).is_err());
    }

    #[test]
    fn test_object_id_hex() {
        let oid = ObjectId::parse_hex("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(oid.to_hex(), "507f1f77bcf86cd799439011");
        assert_eq!(oid.bytes()[0], 0x50);
        assert!(ObjectId::parse_hex("507f").is_none());
        assert!("zz7f1f77bcf86cd799439011".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_timestamp_wire_form() {
        let ts = Timestamp {
            time: 7,
            increment: 3,
        };
        assert_eq!(ts.to_u64(), (7 << 32) | 3);
        assert_eq!(Timestamp::from_u64(ts.to_u64()), ts);
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_datetime_chrono() {
        let dt = DateTime::from_millis(1_700_000_000_123);
        let chrono = dt.to_chrono().unwrap();
        assert_eq!(DateTime::from(chrono), dt);
    }
}
