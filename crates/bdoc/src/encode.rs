//! Encoding utilities for writing element bytes.
//!
//! | Kind         | Value bytes                                  |
//! |--------------|----------------------------------------------|
//! | `double`     | 8-byte IEEE 754, little-endian               |
//! | `string`     | int32 length (incl. NUL), UTF-8, NUL         |
//! | `document`   | nested document bytes                        |
//! | `array`      | nested document bytes, ordinal keys          |
//! | `binary`     | int32 length, subtype byte, payload          |
//! | `object_id`  | 12 bytes                                     |
//! | `bool`       | 1 byte                                       |
//! | `datetime`   | int64 milliseconds                           |
//! | `regex`      | pattern cstring, options cstring             |
//! | `int32`      | 4 bytes                                      |
//! | `timestamp`  | uint64 (increment low, time high)            |
//! | `int64`      | 8 bytes                                      |
//! | `decimal128` | 16 bytes                                     |
//! | null, keys   | no bytes                                     |

use crate::error::{Error, Result};
use crate::primitive::Primitive;

/// Append the value bytes of `value` (no tag, no key).
///
/// # Panics
///
/// Panics if a regex pattern or option string contains a NUL byte.
pub fn encode_value(out: &mut Vec<u8>, value: &Primitive) {
    match value {
        Primitive::Double(n) => out.extend_from_slice(&n.to_le_bytes()),
        Primitive::String(s) | Primitive::JavaScript(s) => encode_string(out, s),
        Primitive::Document(doc) | Primitive::Array(doc) => out.extend_from_slice(doc.as_bytes()),
        Primitive::Binary(bin) => {
            out.extend_from_slice(&(bin.bytes.len() as i32).to_le_bytes());
            out.push(bin.subtype);
            out.extend_from_slice(&bin.bytes);
        }
        Primitive::ObjectId(oid) => out.extend_from_slice(&oid.bytes()),
        Primitive::Bool(b) => out.push(u8::from(*b)),
        Primitive::DateTime(dt) => out.extend_from_slice(&dt.timestamp_millis().to_le_bytes()),
        Primitive::Null | Primitive::MinKey | Primitive::MaxKey => {}
        Primitive::Regex(re) => {
            encode_cstring(out, &re.pattern);
            encode_cstring(out, &re.options);
        }
        Primitive::Int32(n) => out.extend_from_slice(&n.to_le_bytes()),
        Primitive::Timestamp(ts) => out.extend_from_slice(&ts.to_u64().to_le_bytes()),
        Primitive::Int64(n) => out.extend_from_slice(&n.to_le_bytes()),
        Primitive::Decimal128(d) => out.extend_from_slice(&d.bytes()),
    }
}

/// Encode only the value bytes of `value`.
#[must_use]
pub fn value_bytes(value: &Primitive) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value(&mut out, value);
    out
}

/// Encode a complete element: tag, key cstring, value.
///
/// # Panics
///
/// Panics if `key` contains a NUL byte.
#[must_use]
pub fn encode_element(key: &str, value: &Primitive) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + key.len() + 1 + 8);
    out.push(value.tag().raw());
    encode_cstring(&mut out, key);
    encode_value(&mut out, value);
    out
}

/// Encode a length-prefixed string.
pub fn encode_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as i32 + 1).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

/// Encode a NUL-terminated string.
///
/// # Panics
///
/// Panics if `s` contains a NUL byte; it would end the string early and
/// corrupt every following element.
pub fn encode_cstring(out: &mut Vec<u8>, s: &str) {
    assert!(!s.as_bytes().contains(&0), "cstring {s:?} contains a NUL byte");
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

/// Check that `s` can be written as a cstring.
///
/// # Errors
///
/// Returns `Error::InvalidCString` if `s` contains a NUL byte.
pub fn check_cstring(s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::InvalidCString {
            value: s.to_string(),
        });
    }
    Ok(())
}

/// Check every cstring [`encode_element`] would write for `key` and `value`.
/// Nested documents are already encoded and need no check.
///
/// # Errors
///
/// Returns `Error::InvalidCString` for the first string holding a NUL byte.
pub fn check_element(key: &str, value: &Primitive) -> Result<()> {
    check_cstring(key)?;
    if let Primitive::Regex(re) = value {
        check_cstring(&re.pattern)?;
        check_cstring(&re.options)?;
    }
    Ok(())
}
