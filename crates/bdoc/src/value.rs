//! Value decode dispatch.
//!
//! These functions read a value directly from document bytes given its tag
//! and the offset of its first byte. Both return `None` when the bytes run
//! out or do not form a valid value; callers treat that as malformed input.

use crate::document::Document;
use crate::primitive::{Binary, DateTime, Decimal128, ObjectId, Primitive, Regex, Timestamp};
use crate::tag::{SizeRule, Tag, read_array, read_i32_le, read_len_le};

/// Byte span of the value at `offset`, without materializing it.
#[must_use]
pub fn value_length(data: &[u8], tag: Tag, offset: usize) -> Option<usize> {
    let len = match tag.size_rule() {
        SizeRule::Fixed(n) => n,
        SizeRule::PrefixedPayload => {
            let payload = read_len_le(data, offset)?;
            // payload counts the trailing NUL, so it is never zero
            if payload == 0 || data.get(offset + 4 + payload - 1)? != &0 {
                return None;
            }
            4 + payload
        }
        SizeRule::PrefixedTotal => {
            let total = read_len_le(data, offset)?;
            if total < 5 || data.get(offset + total - 1)? != &0 {
                return None;
            }
            total
        }
        SizeRule::PrefixedBinary => 4 + 1 + read_len_le(data, offset)?,
        SizeRule::TwoCStrings => {
            let first = find_nul(data, offset)?;
            let second = find_nul(data, first + 1)?;
            second + 1 - offset
        }
    };
    // the whole span must be present
    data.get(offset..offset.checked_add(len)?)?;
    Some(len)
}

/// Decode the value at `offset` according to `tag`.
///
/// Nested documents are copied out of `data` into their own buffer. They are
/// not re-validated: `data` must come from a validated document.
#[must_use]
pub fn decode_value(data: &[u8], tag: Tag, offset: usize) -> Option<Primitive> {
    let len = value_length(data, tag, offset)?;
    let bytes = data.get(offset..offset + len)?;

    let value = match tag {
        Tag::Double => Primitive::Double(f64::from_le_bytes(read_array(bytes, 0)?)),
        Tag::String => Primitive::String(read_string(bytes)?),
        Tag::JavaScript => Primitive::JavaScript(read_string(bytes)?),
        Tag::Document => Primitive::Document(Document::from_validated(bytes.to_vec())),
        Tag::Array => Primitive::Array(Document::from_validated(bytes.to_vec())),
        Tag::Binary => Primitive::Binary(Binary {
            subtype: *bytes.get(4)?,
            bytes: bytes.get(5..)?.to_vec(),
        }),
        Tag::ObjectId => Primitive::ObjectId(ObjectId::from_bytes(read_array(bytes, 0)?)),
        Tag::Bool => match bytes.first()? {
            0x00 => Primitive::Bool(false),
            0x01 => Primitive::Bool(true),
            _ => return None,
        },
        Tag::DateTime => {
            Primitive::DateTime(DateTime::from_millis(i64::from_le_bytes(read_array(bytes, 0)?)))
        }
        Tag::Null => Primitive::Null,
        Tag::Regex => {
            let split = find_nul(bytes, 0)?;
            let pattern = std::str::from_utf8(&bytes[..split]).ok()?;
            let options = std::str::from_utf8(bytes.get(split + 1..len - 1)?).ok()?;
            Primitive::Regex(Regex {
                pattern: pattern.to_string(),
                options: options.to_string(),
            })
        }
        Tag::Int32 => Primitive::Int32(read_i32_le(bytes, 0)?),
        Tag::Timestamp => {
            Primitive::Timestamp(Timestamp::from_u64(u64::from_le_bytes(read_array(bytes, 0)?)))
        }
        Tag::Int64 => Primitive::Int64(i64::from_le_bytes(read_array(bytes, 0)?)),
        Tag::Decimal128 => Primitive::Decimal128(Decimal128::from_bytes(read_array(bytes, 0)?)),
        Tag::MinKey => Primitive::MinKey,
        Tag::MaxKey => Primitive::MaxKey,
    };
    Some(value)
}

/// String payload of a length-prefixed string value (prefix included in `bytes`).
fn read_string(bytes: &[u8]) -> Option<String> {
    let body = bytes.get(4..bytes.len().checked_sub(1)?)?;
    std::str::from_utf8(body).ok().map(str::to_string)
}

/// Offset of the first NUL byte at or after `from`.
#[inline]
pub(crate) fn find_nul(data: &[u8], from: usize) -> Option<usize> {
    data.get(from..)?.iter().position(|&b| b == 0).map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_values() {
        let data = 42i32.to_le_bytes();
        assert_eq!(value_length(&data, Tag::Int32, 0), Some(4));
        assert_eq!(decode_value(&data, Tag::Int32, 0), Some(Primitive::Int32(42)));

        let data = 1.5f64.to_le_bytes();
        assert_eq!(decode_value(&data, Tag::Double, 0), Some(Primitive::Double(1.5)));

        assert_eq!(decode_value(&[0x01], Tag::Bool, 0), Some(Primitive::Bool(true)));
        assert_eq!(decode_value(&[0x02], Tag::Bool, 0), None);
        assert_eq!(decode_value(&[], Tag::Null, 0), Some(Primitive::Null));
        assert_eq!(decode_value(&[], Tag::MaxKey, 0), Some(Primitive::MaxKey));
    }

    #[test]
    fn test_truncated_fixed_value() {
        assert_eq!(value_length(&[0x2A, 0x00], Tag::Int32, 0), None);
        assert_eq!(decode_value(&[0x2A, 0x00], Tag::Int32, 0), None);
        assert_eq!(value_length(&[0u8; 11], Tag::ObjectId, 0), None);
    }

    #[test]
    fn test_string() {
        // "hi": len=3 (includes NUL)
        let data = [0x03, 0x00, 0x00, 0x00, b'h', b'i', 0x00];
        assert_eq!(value_length(&data, Tag::String, 0), Some(7));
        assert_eq!(
            decode_value(&data, Tag::String, 0),
            Some(Primitive::String("hi".into()))
        );

        // missing NUL
        let data = [0x02, 0x00, 0x00, 0x00, b'h', b'i'];
        assert_eq!(value_length(&data, Tag::String, 0), None);
        // zero length is invalid
        let data = [0x00, 0x00, 0x00, 0x00];
        assert_eq!(value_length(&data, Tag::String, 0), None);
    }

    #[test]
    fn test_binary() {
        let data = [0x03, 0x00, 0x00, 0x00, 0x80, 0xAA, 0xBB, 0xCC];
        assert_eq!(value_length(&data, Tag::Binary, 0), Some(8));
        match decode_value(&data, Tag::Binary, 0) {
            Some(Primitive::Binary(bin)) => {
                assert_eq!(bin.subtype, 0x80);
                assert_eq!(bin.bytes, vec![0xAA, 0xBB, 0xCC]);
            }
            other => panic!("expected Binary, got {other:?}"),
        }
    }

    #[test]
    fn test_regex() {
        let data = b"a.b\0i\0";
        assert_eq!(value_length(data, Tag::Regex, 0), Some(6));
        assert_eq!(
            decode_value(data, Tag::Regex, 0),
            Some(Primitive::Regex(Regex {
                pattern: "a.b".into(),
                options: "i".into(),
            }))
        );
        assert_eq!(value_length(b"a.b\0i", Tag::Regex, 0), None);
    }

    #[test]
    fn test_nested_document_length() {
        let data = [0x05, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(value_length(&data, Tag::Document, 0), Some(5));
        assert!(matches!(
            decode_value(&data, Tag::Array, 0),
            Some(Primitive::Array(doc)) if doc.is_empty()
        ));
        // declared length runs past the buffer
        let data = [0x09, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(value_length(&data, Tag::Document, 0), None);
    }
}
