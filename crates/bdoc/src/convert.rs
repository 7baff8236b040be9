//! Conversions between native Rust types and [`Primitive`].
//!
//! - [`PrimitiveRepresentable`]: the type can project itself to a primitive.
//!   Every primitive value type is representable, and so is `Primitive`
//!   itself, which projects to an unchanged copy.
//! - [`PrimitiveConvertible`]: the type can additionally be built back from
//!   an optional primitive, failing with [`Error::TypeMismatch`] when the
//!   dynamic kind does not match.
//!
//! ```
//! use bdoc::{Document, Error, Kind};
//!
//! let mut doc = Document::new();
//! doc.insert("name", "alice");
//!
//! let name: String = doc.get_as("name").unwrap();
//! assert_eq!(name, "alice");
//!
//! let err = doc.get_as::<i32>("name").unwrap_err();
//! assert_eq!(err, Error::TypeMismatch { expected: Kind::Int32, found: Kind::String });
//! ```

use crate::document::Document;
use crate::error::{Error, Result};
use crate::primitive::{
    Binary, DateTime, Decimal128, Kind, MaxKey, MinKey, Null, ObjectId, Primitive, Regex,
    Timestamp,
};

/// A type with a primitive projection.
pub trait PrimitiveRepresentable {
    fn to_primitive(&self) -> Primitive;
}

/// A type that can be built from a primitive.
pub trait PrimitiveConvertible: PrimitiveRepresentable + Sized {
    /// Build from `value`; `None` stands for a missing value.
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeMismatch` when the value's kind is not the one
    /// this type is stored as. A missing value reports kind `null`.
    fn from_primitive(value: Option<&Primitive>) -> Result<Self>;
}

impl PrimitiveRepresentable for Primitive {
    fn to_primitive(&self) -> Primitive {
        self.clone()
    }
}

impl PrimitiveConvertible for Primitive {
    fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
        Ok(value.cloned().unwrap_or(Primitive::Null))
    }
}

impl<T: PrimitiveRepresentable + ?Sized> PrimitiveRepresentable for &T {
    fn to_primitive(&self) -> Primitive {
        (**self).to_primitive()
    }
}

/// Representable and convertible through a single variant.
macro_rules! scalar_primitive {
    ($ty:ty, $variant:ident) => {
        impl PrimitiveRepresentable for $ty {
            fn to_primitive(&self) -> Primitive {
                Primitive::$variant(self.clone())
            }
        }

        impl PrimitiveConvertible for $ty {
            fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
                match value {
                    Some(Primitive::$variant(v)) => Ok(v.clone()),
                    other => Err(Error::mismatch(Kind::$variant, other.map(Primitive::kind))),
                }
            }
        }
    };
}

scalar_primitive!(f64, Double);
scalar_primitive!(String, String);
scalar_primitive!(Binary, Binary);
scalar_primitive!(ObjectId, ObjectId);
scalar_primitive!(bool, Bool);
scalar_primitive!(DateTime, DateTime);
scalar_primitive!(Regex, Regex);
scalar_primitive!(i32, Int32);
scalar_primitive!(Timestamp, Timestamp);
scalar_primitive!(i64, Int64);
scalar_primitive!(Decimal128, Decimal128);

/// Unit sentinels.
macro_rules! unit_primitive {
    ($ty:ident) => {
        impl PrimitiveRepresentable for $ty {
            fn to_primitive(&self) -> Primitive {
                Primitive::$ty
            }
        }

        impl PrimitiveConvertible for $ty {
            fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
                match value {
                    Some(Primitive::$ty) => Ok($ty),
                    other => Err(Error::mismatch(Kind::$ty, other.map(Primitive::kind))),
                }
            }
        }
    };
}

unit_primitive!(MinKey);
unit_primitive!(MaxKey);

impl PrimitiveRepresentable for Null {
    fn to_primitive(&self) -> Primitive {
        Primitive::Null
    }
}

impl PrimitiveConvertible for Null {
    fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
        match value {
            None | Some(Primitive::Null) => Ok(Null),
            Some(other) => Err(Error::mismatch(Kind::Null, Some(other.kind()))),
        }
    }
}

impl PrimitiveRepresentable for str {
    fn to_primitive(&self) -> Primitive {
        Primitive::String(self.to_string())
    }
}

/// Platform-width integers are stored as int64.
impl PrimitiveRepresentable for isize {
    fn to_primitive(&self) -> Primitive {
        Primitive::Int64(*self as i64)
    }
}

impl PrimitiveConvertible for isize {
    fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
        let n = i64::from_primitive(value)?;
        isize::try_from(n).map_err(|_| Error::Message(format!("{n} does not fit in isize")))
    }
}

impl PrimitiveRepresentable for Document {
    /// Always the document kind. Wrap in [`Primitive::Array`] for an array.
    fn to_primitive(&self) -> Primitive {
        Primitive::Document(self.clone())
    }
}

impl PrimitiveConvertible for Document {
    /// Accepts both the document and the array kind.
    fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
        match value {
            Some(Primitive::Document(doc) | Primitive::Array(doc)) => Ok(doc.clone()),
            other => Err(Error::mismatch(Kind::Document, other.map(Primitive::kind))),
        }
    }
}

// Byte blobs project to generic binary by copying their bytes.

impl PrimitiveRepresentable for [u8] {
    fn to_primitive(&self) -> Primitive {
        Primitive::Binary(Binary::generic(self))
    }
}

impl PrimitiveRepresentable for Vec<u8> {
    fn to_primitive(&self) -> Primitive {
        Primitive::Binary(Binary::generic(self))
    }
}

impl PrimitiveConvertible for Vec<u8> {
    fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
        Binary::from_primitive(value).map(|bin| bin.bytes)
    }
}

impl PrimitiveRepresentable for bytes::Bytes {
    fn to_primitive(&self) -> Primitive {
        Primitive::Binary(Binary::generic(self))
    }
}

impl PrimitiveConvertible for bytes::Bytes {
    fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
        Binary::from_primitive(value).map(|bin| bytes::Bytes::from(bin.bytes))
    }
}

impl<T: PrimitiveRepresentable> PrimitiveRepresentable for Option<T> {
    /// `None` projects to null.
    fn to_primitive(&self) -> Primitive {
        self.as_ref()
            .map_or(Primitive::Null, PrimitiveRepresentable::to_primitive)
    }
}

impl<T: PrimitiveConvertible> PrimitiveConvertible for Option<T> {
    /// Missing and null values convert to `None`.
    fn from_primitive(value: Option<&Primitive>) -> Result<Self> {
        match value {
            None | Some(Primitive::Null) => Ok(None),
            some => T::from_primitive(some).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_is_identity() {
        let value = Primitive::Int64(5);
        assert_eq!(value.to_primitive(), value);
        assert_eq!(Primitive::from_primitive(Some(&value)), Ok(value));
        assert_eq!(Primitive::from_primitive(None), Ok(Primitive::Null));
    }

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(i32::from_primitive(Some(&7i32.to_primitive())), Ok(7));
        assert_eq!(f64::from_primitive(Some(&2.5f64.to_primitive())), Ok(2.5));
        assert_eq!(
            String::from_primitive(Some(&"s".to_primitive())),
            Ok("s".to_string())
        );
        assert_eq!(isize::from_primitive(Some(&Primitive::Int64(-3))), Ok(-3));
        assert_eq!(isize::to_primitive(&9), Primitive::Int64(9));
    }

    #[test]
    fn test_mismatch_carries_kinds() {
        assert_eq!(
            i64::from_primitive(Some(&Primitive::Int32(1))),
            Err(Error::TypeMismatch {
                expected: Kind::Int64,
                found: Kind::Int32
            })
        );
        assert_eq!(
            bool::from_primitive(None),
            Err(Error::TypeMismatch {
                expected: Kind::Bool,
                found: Kind::Null
            })
        );
        assert!(String::from_primitive(Some(&Primitive::JavaScript("x".into()))).is_err());
    }

    #[test]
    fn test_bytes_project_to_binary() {
        let blob = vec![1u8, 2, 3];
        let primitive = blob.to_primitive();
        assert_eq!(
            primitive,
            Primitive::Binary(Binary {
                subtype: 0,
                bytes: vec![1, 2, 3]
            })
        );
        assert_eq!(Vec::<u8>::from_primitive(Some(&primitive)), Ok(blob));
        assert_eq!(
            bytes::Bytes::from_primitive(Some(&primitive)).unwrap().as_ref(),
            &[1, 2, 3]
        );
        assert_eq!([9u8][..].to_primitive().kind(), Kind::Binary);
    }

    #[test]
    fn test_option() {
        assert_eq!(None::<i32>.to_primitive(), Primitive::Null);
        assert_eq!(Some(1i32).to_primitive(), Primitive::Int32(1));
        assert_eq!(Option::<i32>::from_primitive(Some(&Primitive::Null)), Ok(None));
        assert_eq!(Option::<i32>::from_primitive(None), Ok(None));
        assert_eq!(Option::<i32>::from_primitive(Some(&Primitive::Int32(2))), Ok(Some(2)));
        assert!(Option::<i32>::from_primitive(Some(&Primitive::Bool(true))).is_err());
    }

    #[test]
    fn test_document_projection() {
        let array = Document::array([1i32, 2]);
        assert_eq!(array.to_primitive().kind(), Kind::Document);
        let doc: Document = [("k", 1i32)].into_iter().collect();
        assert_eq!(doc.to_primitive().kind(), Kind::Document);
        assert_eq!(Document::new().to_primitive().kind(), Kind::Document);

        // ordinal keys alone never retag a document
        let mut keyed = Document::new();
        keyed.insert("0", "a");
        assert_eq!(keyed.to_primitive(), Primitive::Document(keyed.clone()));

        let tagged = Primitive::Array(array.clone());
        assert_eq!(Document::from_primitive(Some(&tagged)), Ok(array));
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(MinKey.to_primitive(), Primitive::MinKey);
        assert_eq!(MaxKey::from_primitive(Some(&Primitive::MaxKey)), Ok(MaxKey));
        assert_eq!(Null::from_primitive(None), Ok(Null));
        assert!(MinKey::from_primitive(Some(&Primitive::MaxKey)).is_err());
    }
}
