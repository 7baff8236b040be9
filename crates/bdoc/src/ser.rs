//! serde encode hook.
//!
//! [`Document`] and [`Primitive`] serialize in one of two ways:
//!
//! - Compact serializers (`is_human_readable() == false`), including this
//!   crate's own [`PrimitiveSerializer`], receive a newtype struct under a
//!   private marker name wrapping the raw document bytes. The crate's own
//!   serializer recognizes the marker and adopts the bytes without
//!   re-encoding any element.
//! - Human-readable serializers receive a map of the document's values, or a
//!   sequence when the document is an array.

use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::convert::PrimitiveRepresentable;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::primitive::{Binary, Kind, Primitive};

/// Marker for raw document bytes.
pub(crate) const DOCUMENT_MARKER: &str = "$__bdoc_private_document";
/// Marker for a primitive wrapped as the single value of a document.
pub(crate) const PRIMITIVE_MARKER: &str = "$__bdoc_private_primitive";

/// Serialize `value` into a [`Primitive`].
///
/// # Errors
///
/// Returns an error if `value` fails to serialize, uses non-string map keys,
/// or holds an unsigned integer above `i64::MAX`.
pub fn to_primitive<T: Serialize + ?Sized>(value: &T) -> Result<Primitive> {
    value.serialize(PrimitiveSerializer)
}

/// Serialize `value` into a [`Document`]. Sequences become array documents.
///
/// # Errors
///
/// Returns `Error::TypeMismatch` if `value` does not serialize to a document.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Document> {
    match to_primitive(value)? {
        Primitive::Document(doc) | Primitive::Array(doc) => Ok(doc),
        other => Err(Error::TypeMismatch {
            expected: Kind::Document,
            found: other.kind(),
        }),
    }
}

/// Bytes wrapper serialized with `serialize_bytes`.
struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

/// Root document as a map, or as a sequence when its keys are ordinals.
struct Entries<'a>(&'a Document);

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0.is_array() && !self.0.is_empty() {
            let mut seq = serializer.serialize_seq(Some(self.0.count()))?;
            for value in self.0.values() {
                seq.serialize_element(&value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.0.count()))?;
            for pair in self.0 {
                map.serialize_entry(&pair.key, &pair.value)?;
            }
            map.end()
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            Entries(self).serialize(serializer)
        } else {
            serializer.serialize_newtype_struct(DOCUMENT_MARKER, &RawBytes(self.as_bytes()))
        }
    }
}

impl Serialize for Primitive {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !serializer.is_human_readable() {
            let mut wrapper = Document::new();
            wrapper
                .try_insert("", self)
                .map_err(<S::Error as ser::Error>::custom)?;
            return serializer
                .serialize_newtype_struct(PRIMITIVE_MARKER, &RawBytes(wrapper.as_bytes()));
        }
        match self {
            Primitive::Double(n) => serializer.serialize_f64(*n),
            Primitive::String(s) | Primitive::JavaScript(s) => serializer.serialize_str(s),
            Primitive::Document(doc) => {
                serializer.collect_map(doc.iter().map(|pair| (pair.key, pair.value)))
            }
            Primitive::Array(doc) => serializer.collect_seq(doc.values()),
            Primitive::Binary(bin) => serializer.serialize_bytes(&bin.bytes),
            Primitive::ObjectId(oid) => serializer.serialize_str(&oid.to_hex()),
            Primitive::Bool(b) => serializer.serialize_bool(*b),
            Primitive::DateTime(dt) => serializer.serialize_i64(dt.timestamp_millis()),
            Primitive::Null => serializer.serialize_unit(),
            Primitive::Regex(re) => {
                serializer.collect_str(&format_args!("/{}/{}", re.pattern, re.options))
            }
            Primitive::Int32(n) => serializer.serialize_i32(*n),
            Primitive::Timestamp(ts) => serializer.serialize_u64(ts.to_u64()),
            Primitive::Int64(n) => serializer.serialize_i64(*n),
            Primitive::Decimal128(d) => serializer.serialize_str(&hex::encode(d.bytes())),
            Primitive::MinKey => serializer.serialize_unit_struct("MinKey"),
            Primitive::MaxKey => serializer.serialize_unit_struct("MaxKey"),
        }
    }
}

/// Serializer producing a [`Primitive`]. This is the format-aware
/// implementation that recognizes the private markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveSerializer;

impl PrimitiveSerializer {
    fn adopt_raw<T: Serialize + ?Sized>(name: &'static str, value: &T) -> Result<Primitive> {
        let Primitive::Binary(Binary { bytes, .. }) = value.serialize(PrimitiveSerializer)? else {
            return Err(Error::Message(format!("{name} must wrap raw bytes")));
        };
        let doc = Document::from_bytes(bytes)?;
        if name == DOCUMENT_MARKER {
            return Ok(doc.to_primitive());
        }
        doc.values()
            .next()
            .ok_or_else(|| Error::Message("empty primitive wrapper".to_string()))
    }
}

impl Serializer for PrimitiveSerializer {
    type Ok = Primitive;
    type Error = Error;
    type SerializeSeq = ArraySerializer;
    type SerializeTuple = ArraySerializer;
    type SerializeTupleStruct = ArraySerializer;
    type SerializeTupleVariant = VariantSerializer<ArraySerializer>;
    type SerializeMap = DocumentSerializer;
    type SerializeStruct = DocumentSerializer;
    type SerializeStructVariant = VariantSerializer<DocumentSerializer>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<Primitive> {
        Ok(Primitive::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Primitive> {
        Ok(Primitive::Int32(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Primitive> {
        Ok(Primitive::Int32(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Primitive> {
        Ok(Primitive::Int32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Primitive> {
        Ok(Primitive::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Primitive> {
        Ok(Primitive::Int32(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Primitive> {
        Ok(Primitive::Int32(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Primitive> {
        Ok(Primitive::Int64(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Primitive> {
        i64::try_from(v)
            .map(Primitive::Int64)
            .map_err(|_| Error::Message(format!("{v} does not fit in int64")))
    }

    fn serialize_f32(self, v: f32) -> Result<Primitive> {
        Ok(Primitive::Double(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Primitive> {
        Ok(Primitive::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Primitive> {
        Ok(Primitive::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Primitive> {
        Ok(Primitive::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Primitive> {
        Ok(Primitive::Binary(Binary::generic(v)))
    }

    fn serialize_none(self) -> Result<Primitive> {
        Ok(Primitive::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Primitive> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Primitive> {
        Ok(Primitive::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Primitive> {
        Ok(Primitive::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Primitive> {
        Ok(Primitive::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Primitive> {
        if name == DOCUMENT_MARKER || name == PRIMITIVE_MARKER {
            return Self::adopt_raw(name, value);
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Primitive> {
        let mut doc = Document::new();
        doc.try_insert(variant, value.serialize(self)?)?;
        Ok(Primitive::Document(doc))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<ArraySerializer> {
        Ok(ArraySerializer::default())
    }

    fn serialize_tuple(self, len: usize) -> Result<ArraySerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<ArraySerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantSerializer<ArraySerializer>> {
        Ok(VariantSerializer {
            variant,
            inner: ArraySerializer::default(),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<DocumentSerializer> {
        Ok(DocumentSerializer::default())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<DocumentSerializer> {
        Ok(DocumentSerializer::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantSerializer<DocumentSerializer>> {
        Ok(VariantSerializer {
            variant,
            inner: DocumentSerializer::default(),
        })
    }
}

/// Collects sequence elements into an array document.
#[derive(Debug, Default)]
pub struct ArraySerializer {
    array: Document,
}

impl ArraySerializer {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.array.push(value.serialize(PrimitiveSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for ArraySerializer {
    type Ok = Primitive;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Primitive> {
        Ok(Primitive::Array(self.array))
    }
}

impl ser::SerializeTuple for ArraySerializer {
    type Ok = Primitive;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Primitive> {
        Ok(Primitive::Array(self.array))
    }
}

impl ser::SerializeTupleStruct for ArraySerializer {
    type Ok = Primitive;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Primitive> {
        Ok(Primitive::Array(self.array))
    }
}

/// Collects map entries and struct fields into a document.
#[derive(Debug, Default)]
pub struct DocumentSerializer {
    doc: Document,
    pending_key: Option<String>,
}

impl ser::SerializeMap for DocumentSerializer {
    type Ok = Primitive;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.pending_key = Some(key_to_string(key.serialize(PrimitiveSerializer)?)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::Message("map value without a key".to_string()))?;
        self.doc.try_insert(&key, value.serialize(PrimitiveSerializer)?)
    }

    fn end(self) -> Result<Primitive> {
        Ok(Primitive::Document(self.doc))
    }
}

impl ser::SerializeStruct for DocumentSerializer {
    type Ok = Primitive;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.doc.try_insert(key, value.serialize(PrimitiveSerializer)?)
    }

    fn end(self) -> Result<Primitive> {
        Ok(Primitive::Document(self.doc))
    }
}

/// Map keys must be strings; integers and chars are rendered as text.
fn key_to_string(key: Primitive) -> Result<String> {
    match key {
        Primitive::String(s) => Ok(s),
        Primitive::Int32(n) => Ok(n.to_string()),
        Primitive::Int64(n) => Ok(n.to_string()),
        Primitive::Bool(b) => Ok(b.to_string()),
        other => Err(Error::Message(format!(
            "map keys must be strings, found {}",
            other.kind()
        ))),
    }
}

/// Wraps a tuple or struct variant as `{variant: body}`.
#[derive(Debug)]
pub struct VariantSerializer<S> {
    variant: &'static str,
    inner: S,
}

impl<S> VariantSerializer<S> {
    fn wrap(variant: &str, body: Primitive) -> Result<Primitive> {
        let mut doc = Document::new();
        doc.try_insert(variant, body)?;
        Ok(Primitive::Document(doc))
    }
}

impl VariantSerializer<ArraySerializer> {
    fn finish(self) -> Result<Primitive> {
        Self::wrap(self.variant, Primitive::Array(self.inner.array))
    }
}

impl VariantSerializer<DocumentSerializer> {
    fn finish(self) -> Result<Primitive> {
        Self::wrap(self.variant, Primitive::Document(self.inner.doc))
    }
}

impl ser::SerializeTupleVariant for VariantSerializer<ArraySerializer> {
    type Ok = Primitive;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.inner.push(value)
    }

    fn end(self) -> Result<Primitive> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for VariantSerializer<DocumentSerializer> {
    type Ok = Primitive;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Primitive> {
        self.finish()
    }
}
