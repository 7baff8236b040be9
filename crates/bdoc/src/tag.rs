//! Type tag table.
//!
//! Each element starts with a 1-byte tag that selects both the value kind and
//! the rule used to find the value's byte length. The table is closed:
//! deprecated wire types (undefined, DBPointer, symbol, code-with-scope) are
//! not recognized.

use crate::primitive::Kind;

/// One-byte wire discriminator of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    ObjectId = 0x07,
    Bool = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    Regex = 0x0B,
    JavaScript = 0x0D,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

/// Byte that ends a document's element list.
pub const TERMINATOR: u8 = 0x00;

/// Size rule for a tag's value bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRule {
    /// Value always occupies this many bytes.
    Fixed(usize),
    /// int32 prefix counts the bytes that follow it (strings).
    PrefixedPayload,
    /// int32 prefix counts the whole value, itself included (documents).
    PrefixedTotal,
    /// int32 prefix counts the payload that follows the prefix and a subtype byte.
    PrefixedBinary,
    /// Two consecutive NUL-terminated strings.
    TwoCStrings,
}

impl Tag {
    /// Parse a tag byte. Returns `None` for the terminator and for unknown tags.
    #[inline]
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0x01 => Tag::Double,
            0x02 => Tag::String,
            0x03 => Tag::Document,
            0x04 => Tag::Array,
            0x05 => Tag::Binary,
            0x07 => Tag::ObjectId,
            0x08 => Tag::Bool,
            0x09 => Tag::DateTime,
            0x0A => Tag::Null,
            0x0B => Tag::Regex,
            0x0D => Tag::JavaScript,
            0x10 => Tag::Int32,
            0x11 => Tag::Timestamp,
            0x12 => Tag::Int64,
            0x13 => Tag::Decimal128,
            0x7F => Tag::MaxKey,
            0xFF => Tag::MinKey,
            _ => return None,
        })
    }

    /// Get the raw tag byte.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Value kind stored under this tag.
    #[must_use]
    pub const fn kind(self) -> Kind {
        match self {
            Tag::Double => Kind::Double,
            Tag::String => Kind::String,
            Tag::Document => Kind::Document,
            Tag::Array => Kind::Array,
            Tag::Binary => Kind::Binary,
            Tag::ObjectId => Kind::ObjectId,
            Tag::Bool => Kind::Bool,
            Tag::DateTime => Kind::DateTime,
            Tag::Null => Kind::Null,
            Tag::Regex => Kind::Regex,
            Tag::JavaScript => Kind::JavaScript,
            Tag::Int32 => Kind::Int32,
            Tag::Timestamp => Kind::Timestamp,
            Tag::Int64 => Kind::Int64,
            Tag::Decimal128 => Kind::Decimal128,
            Tag::MaxKey => Kind::MaxKey,
            Tag::MinKey => Kind::MinKey,
        }
    }

    /// How to find the byte length of a value carrying this tag.
    #[must_use]
    pub const fn size_rule(self) -> SizeRule {
        match self {
            Tag::Null | Tag::MinKey | Tag::MaxKey => SizeRule::Fixed(0),
            Tag::Bool => SizeRule::Fixed(1),
            Tag::Int32 => SizeRule::Fixed(4),
            Tag::Double | Tag::DateTime | Tag::Timestamp | Tag::Int64 => SizeRule::Fixed(8),
            Tag::ObjectId => SizeRule::Fixed(12),
            Tag::Decimal128 => SizeRule::Fixed(16),
            Tag::String | Tag::JavaScript => SizeRule::PrefixedPayload,
            Tag::Document | Tag::Array => SizeRule::PrefixedTotal,
            Tag::Binary => SizeRule::PrefixedBinary,
            Tag::Regex => SizeRule::TwoCStrings,
        }
    }
}

impl From<Kind> for Tag {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Double => Tag::Double,
            Kind::String => Tag::String,
            Kind::Document => Tag::Document,
            Kind::Array => Tag::Array,
            Kind::Binary => Tag::Binary,
            Kind::ObjectId => Tag::ObjectId,
            Kind::Bool => Tag::Bool,
            Kind::DateTime => Tag::DateTime,
            Kind::Null => Tag::Null,
            Kind::Regex => Tag::Regex,
            Kind::JavaScript => Tag::JavaScript,
            Kind::Int32 => Tag::Int32,
            Kind::Timestamp => Tag::Timestamp,
            Kind::Int64 => Tag::Int64,
            Kind::Decimal128 => Tag::Decimal128,
            Kind::MaxKey => Tag::MaxKey,
            Kind::MinKey => Tag::MinKey,
        }
    }
}

/// Read a little-endian i32 at `offset`.
#[inline]
#[must_use]
pub fn read_i32_le(bytes: &[u8], offset: usize) -> Option<i32> {
    let raw: [u8; 4] = bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(i32::from_le_bytes(raw))
}

/// Read a little-endian length prefix, rejecting negative values.
#[inline]
#[must_use]
pub fn read_len_le(bytes: &[u8], offset: usize) -> Option<usize> {
    usize::try_from(read_i32_le(bytes, offset)?).ok()
}

/// Read a fixed-size array at `offset`.
#[inline]
#[must_use]
pub fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    bytes.get(offset..offset.checked_add(N)?)?.try_into().ok()
}
